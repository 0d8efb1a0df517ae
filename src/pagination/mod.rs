use std::{sync::OnceLock, time::Duration};

use regex::Regex;
use tracing::info;
use url::Url;

use crate::{
    config::{FieldSpec, SiteConfig},
    error::ScrapeError,
    listing::Record,
    page_scrapers::{harvest, Session},
    prompt::{parse_page_count, parse_pause, prompt_until, Prompt},
};

const MIN_PAUSE: Duration = Duration::from_secs(1);


/// Page count and pause supplied up front instead of asked for.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct PagePlan {
    pub(crate) pages: Option<usize>,
    pub(crate) pause: Option<Duration>,
}


/// The total number of results in a label such as `"1 - 20 of 1,234"`.
///
/// The last number in the label wins.
pub(crate) fn parse_results_count(label: &str) -> Option<usize> {
    static NUMBER: OnceLock<Regex> = OnceLock::new();
    let number = NUMBER.get_or_init(|| Regex::new(r"\d[\d,]*").unwrap());
    number
        .find_iter(label)
        .last()
        .and_then(|m| m.as_str().replace(',', "").parse().ok())
}


/// Pages worth fetching for `results` hits, assuming full pages and at least one page.
pub(crate) fn page_count(results: usize, page_size: usize) -> usize {
    (results / page_size).max(1)
}


/// URL of the 1-based `page` of a result listing: `/python-jobs?k=python`
/// becomes `/python-jobs-2?k=python` for page 2.
pub(crate) fn page_url(first_page: &Url, page: usize) -> Url {
    if page <= 1 {
        return first_page.clone();
    }
    let mut url = first_page.clone();
    let path = format!("{}-{page}", first_page.path());
    url.set_path(&path);
    url
}


/// Walks the pages of one search and collects every listing on them.
pub(crate) struct Paginator<'a> {
    pub(crate) site: &'a SiteConfig,
    pub(crate) fields: &'a [FieldSpec],
    pub(crate) plan: PagePlan,
}


impl Paginator<'_> {
    /// Starts from the first results page, which `session` must already show.
    pub(crate) fn run<S, P>(&self, session: &S, prompt: &mut P) -> anyhow::Result<Vec<Record>>
    where
        S: Session,
        P: Prompt + ?Sized,
    {
        let first_page = session.current_url()?;
        let label = session
            .wait_for_text(&self.site.results_count)?
            .ok_or_else(|| ScrapeError::MissingResultsCount {
                locator: self.site.results_count.clone(),
                url: first_page.to_string(),
            })?;
        let results = parse_results_count(&label).ok_or_else(|| ScrapeError::UnreadableResultsCount(label.clone()))?;
        let candidate = page_count(results, self.site.page_size);
        info!("{results} results over about {candidate} pages");

        let (pages, pause) = self.resolve_plan(candidate, prompt)?;

        let mut records = Vec::new();
        for i in 0..pages {
            if i != 0 {
                session.open(&page_url(&first_page, i + 1))?;
                session.settle(pause);
            }
            println!("{}", session.current_url()?);
            let page_records = harvest(session, &self.site.card, self.fields)?;
            info!("Page {}: {} listings", i + 1, page_records.len());
            records.extend(page_records);
        }
        Ok(records)
    }

    fn resolve_plan<P: Prompt + ?Sized>(&self, candidate: usize, prompt: &mut P) -> anyhow::Result<(usize, Duration)> {
        if candidate <= 1 {
            return Ok((self.plan.pages.unwrap_or(candidate), self.plan.pause.unwrap_or(MIN_PAUSE)));
        }

        println!(
            "Total number of pages for this keyword is {candidate}\n\
             **Note: some keywords may have fewer result pages, or none at all\n\
             ------------------------------------------------------------------"
        );
        let pages = match self.plan.pages {
            Some(pages) => pages,
            None => prompt_until(prompt, "Number of pages to scrape (less than 5 recommended): ", parse_page_count)?
                .ok_or(ScrapeError::InputClosed("page count"))?,
        };
        let pause = match self.plan.pause {
            Some(pause) => pause.max(MIN_PAUSE),
            None => prompt_until(prompt, "Pause between pages (in seconds): ", parse_pause)?
                .ok_or(ScrapeError::InputClosed("pause"))?,
        };
        Ok((pages, pause))
    }
}
