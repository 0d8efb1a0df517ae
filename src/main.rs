use std::{
    io::{self, Write},
    path::PathBuf,
    time::Duration,
};

use clap::Parser;
use tracing::info;
use tracing_subscriber::prelude::*;

use crate::{
    config::Config,
    error::ScrapeError,
    listing::Record,
    page_scrapers::{chrome::ChromeSession, harvest, snapshot},
    pagination::{PagePlan, Paginator},
    prompt::{parse_keyword, parse_page_count, parse_pause, prompt_until, Prompt, StdinPrompt},
};

mod config;
mod error;
mod listing;
mod page_scrapers;
mod pagination;
mod prompt;
mod query;
mod sink;
mod skill_filter;


/// Collect job listings from a job portal into a CSV file, then filter them by skill.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Portal layout and run settings
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,
    /// CSV file to write and filter; overrides `[output] path`
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Job title or skills to search for, instead of asking
    #[arg(short, long, value_parser = parse_keyword)]
    keyword: Option<String>,
    /// Number of result pages to scrape, instead of asking
    #[arg(long, value_parser = parse_page_count)]
    pages: Option<usize>,
    /// Seconds to wait after each page load, instead of asking
    #[arg(long, value_parser = parse_pause)]
    pause: Option<Duration>,
    /// Harvest saved results pages instead of driving a browser
    #[arg(long = "page-html", value_name = "FILE", num_args = 1.., conflicts_with_all = ["keyword", "pages", "pause"])]
    page_html: Vec<PathBuf>,
    /// Skip scraping and filter the existing CSV file
    #[arg(long, conflicts_with = "page_html")]
    filter_only: bool,
}


fn scrape_live<P, W>(cli: &Cli, config: &Config, prompt: &mut P, out: &mut W) -> anyhow::Result<Vec<Record>>
where
    P: Prompt + ?Sized,
    W: Write,
{
    writeln!(
        out,
        "------------------------------------------------------------------\n\
         **Help: If nothing happens within 30 seconds, stop with 'ctrl + c'.\n\
         **Note: Make sure the internet connection is working\n\
         ------------------------------------------------------------------"
    )?;
    let keyword = match &cli.keyword {
        Some(keyword) => keyword.clone(),
        None => prompt_until(prompt, "Job title/skills: ", parse_keyword)?.ok_or(ScrapeError::InputClosed("keyword"))?,
    };
    writeln!(out, "Scraping in progress, this may take a while depending on the number of posts...")?;

    let session = ChromeSession::launch(&config.browser)?;
    query::resolve(&session, &config.site, &keyword)?;
    let paginator = Paginator {
        site: &config.site,
        fields: &config.fields,
        plan: PagePlan { pages: cli.pages, pause: cli.pause },
    };
    paginator.run(&session, prompt)
}


fn scrape_saved_pages(paths: &[PathBuf], config: &Config) -> anyhow::Result<Vec<Record>> {
    let mut records = Vec::new();
    for path in paths {
        let page = snapshot::read_page(path)?;
        let page_records = harvest(&page, &config.site.card, &config.fields)?;
        info!("{}: {} listings", path.display(), page_records.len());
        records.extend(page_records);
    }
    Ok(records)
}


/// Scrapes (unless only filtering), saves, reloads and then filters the listings.
fn run<P, W>(cli: &Cli, config: &Config, prompt: &mut P, out: &mut W) -> anyhow::Result<()>
where
    P: Prompt + ?Sized,
    W: Write,
{
    let output = cli.output.clone().unwrap_or_else(|| PathBuf::from(&config.output.path));

    if !cli.filter_only {
        let records = if cli.page_html.is_empty() {
            scrape_live(cli, config, prompt, out)?
        } else {
            scrape_saved_pages(&cli.page_html, config)?
        };
        let records = if config.output.dedupe { listing::drop_duplicates(records) } else { records };

        sink::save(&records, &output)?;
        writeln!(out, "Total job posts = {}\n '{}' saved successfully.", records.len(), output.display())?;
    }

    let table = sink::load(&output)?;
    writeln!(out, "{} job posts loaded from '{}'\n{table}", table.rows.len(), output.display())?;
    skill_filter::run(&table, prompt, out)
}


#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_env("LOG_LEVEL")
                .unwrap_or_else(|_| "info,html5ever=error,selectors=error".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    // Everything interactive blocks, so it runs off the async threads while
    // this task waits for either the session to finish or ctrl+c. Stdout is
    // locked per write so the interrupt message is never stuck behind a prompt.
    let session = tokio_rayon::spawn(move || run(&cli, &config, &mut StdinPrompt, &mut io::stdout()));
    tokio::select! {
        result = session => result,
        _ = tokio::signal::ctrl_c() => {
            println!("\nInterrupted, exiting...");
            Ok(())
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::{listing::Field, prompt::ScriptedPrompt};
    use pretty_assertions::assert_eq;
    use std::path::Path;

    const PAGE_1: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/htmls/results_page_1.html");
    const PAGE_2: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/htmls/results_page_2.html");

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("job-scraper").chain(args.iter().copied()))
    }

    fn config_writing_to(path: &Path) -> Config {
        let mut config = Config::default();
        config.output.path = path.display().to_string();
        config
    }

    fn titles(path: &Path) -> Vec<String> {
        let table = sink::load(path).unwrap();
        let column = table.column(Field::Title.header()).unwrap();
        table.rows.into_iter().map(|row| row[column].clone()).collect()
    }

    fn run_to_string(cli: &Cli, config: &Config, prompt: &mut ScriptedPrompt) -> String {
        let mut out = Vec::new();
        run(cli, config, prompt, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn saved_pages_are_harvested_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("python.csv");
        let configured = dir.path().join("job_listings.csv");
        let cli = cli(&["--page-html", PAGE_1, PAGE_2, "--output", output.to_str().unwrap()]);
        let mut prompt = ScriptedPrompt::new(["sql"]);

        let printed = run_to_string(&cli, &config_writing_to(&configured), &mut prompt);

        assert_eq!(
            titles(&output),
            vec!["Backend Developer (Python/Django)", "Python Developer", "Data Analyst"]
        );
        assert!(!configured.exists());
        assert!(printed.contains("Total job posts = 3\n"));
        assert!(printed.contains("3 job posts loaded from"));
        assert!(printed.contains("[3 rows x 9 columns]"));
        assert!(printed.contains("Job 1:\nTitle: Backend Developer (Python/Django)\n"));
        assert!(printed.contains("Job 3:\nTitle: Data Analyst\n"));
        assert!(printed.contains("2 matching jobs\n"));
    }

    #[test]
    fn dedupe_switch_drops_repeated_listings() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("job_listings.csv");
        let cli = cli(&["--page-html", PAGE_1, PAGE_1]);

        let mut config = config_writing_to(&output);
        run_to_string(&cli, &config, &mut ScriptedPrompt::new([""; 0]));
        assert_eq!(titles(&output).len(), 4);

        config.output.dedupe = true;
        run_to_string(&cli, &config, &mut ScriptedPrompt::new([""; 0]));
        assert_eq!(titles(&output), vec!["Backend Developer (Python/Django)", "Python Developer"]);
    }

    #[test]
    fn filter_only_reads_the_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("job_listings.csv");
        let config = config_writing_to(&output);
        run_to_string(&cli(&["--page-html", PAGE_2]), &config, &mut ScriptedPrompt::new([""; 0]));
        let saved = std::fs::read_to_string(&output).unwrap();

        let mut prompt = ScriptedPrompt::new(["excel", "django"]);
        let printed = run_to_string(&cli(&["--filter-only"]), &config, &mut prompt);

        assert_eq!(std::fs::read_to_string(&output).unwrap(), saved);
        assert!(!printed.contains("Total job posts"));
        assert!(printed.contains("1 job posts loaded from"));
        assert!(printed.contains("Job 1:\nTitle: Data Analyst\n"));
        assert!(printed.contains("1 matching jobs\n"));
        assert!(printed.contains("0 matching jobs\n"));
        assert_eq!(prompt.asked.len(), 3);
    }

    #[test]
    fn filter_only_without_a_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_writing_to(&dir.path().join("missing.csv"));
        let mut out = Vec::new();
        assert!(run(&cli(&["--filter-only"]), &config, &mut ScriptedPrompt::new([""; 0]), &mut out).is_err());
    }
}
