use tracing::info;
use url::Url;

use crate::{config::SiteConfig, page_scrapers::Session};


/// Searches the portal for `keyword` and leaves `session` on the first page of
/// results, narrowed by the configured query filters. Returns that page's URL.
pub(crate) fn resolve<S: Session + ?Sized>(session: &S, site: &SiteConfig, keyword: &str) -> anyhow::Result<Url> {
    session.open(&site.home_url)?;
    session.submit_search(&site.search_input, keyword)?;

    let mut url = session.current_url()?;
    url.query_pairs_mut().extend_pairs(&site.query_filters);
    session.open(&url)?;

    let url = session.current_url()?;
    info!("Results for {keyword:?} are at {url}");
    Ok(url)
}
