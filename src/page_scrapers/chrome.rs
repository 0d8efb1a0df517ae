use std::{
    ffi::OsString,
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::Context;
use headless_chrome::{browser::tab::NoElementFound, util::Timeout, Browser, Element, LaunchOptions, Tab};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::BrowserConfig;

use super::{Card, ResultsPage, Session};

const URL_POLL_INTERVAL: Duration = Duration::from_millis(100);


/// A headless Chrome instance with the one tab used for scraping.
///
/// Chrome is shut down when this is dropped.
pub(crate) struct ChromeSession {
    tab: Arc<Tab>,
    timeout: Duration,
    _browser: Browser,
}


impl ChromeSession {
    pub(crate) fn launch(config: &BrowserConfig) -> anyhow::Result<Self> {
        let user_agent = config.user_agent.as_ref().map(|agent| OsString::from(format!("--user-agent={agent}")));
        let browser = Browser::new(LaunchOptions {
            headless: config.headless,
            sandbox: config.sandbox,
            idle_browser_timeout: config.idle_timeout(),
            args: user_agent.iter().map(OsString::as_os_str).collect(),
            ..Default::default()
        })
        .context("Failed to launch Chrome. Is it installed?")?;

        let tab = browser.new_tab()?;
        tab.set_default_timeout(config.wait_timeout());
        info!("Chrome launched (headless: {})", config.headless);

        Ok(Self { tab, timeout: config.wait_timeout(), _browser: browser })
    }
}


fn is_missing(error: &anyhow::Error) -> bool {
    error.is::<NoElementFound>()
}


fn never_appeared(error: &anyhow::Error) -> bool {
    is_missing(error) || error.is::<Timeout>()
}


/// Attributes the browser reports as absolute URLs when read as properties.
const LINK_ATTRIBUTES: [&str; 2] = ["href", "src"];


/// Resolves a link attribute against the page it was found on, the way the
/// DOM property would. Values that don't form a URL are kept as written.
fn resolve_link(page_url: &str, attribute: &str, value: String) -> String {
    if !LINK_ATTRIBUTES.contains(&attribute) {
        return value;
    }
    match Url::parse(page_url).and_then(|base| base.join(&value)) {
        Ok(url) => url.into(),
        Err(e) => {
            warn!("Keeping {attribute} {value:?} unresolved: {e}");
            value
        }
    }
}


impl Card for Element<'_> {
    fn text(&self, locator: &str) -> anyhow::Result<Option<String>> {
        match self.find_element(locator) {
            Ok(element) => element.get_inner_text().map(Some),
            Err(e) if is_missing(&e) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn attribute(&self, locator: &str, attribute: &str) -> anyhow::Result<Option<String>> {
        match self.find_element(locator) {
            Ok(element) => Ok(element
                .get_attribute_value(attribute)?
                .map(|value| resolve_link(&element.parent.get_url(), attribute, value))),
            Err(e) if is_missing(&e) => Ok(None),
            Err(e) => Err(e),
        }
    }
}


impl ResultsPage for ChromeSession {
    type Card<'a> = Element<'a>;

    fn cards(&self, locator: &str) -> anyhow::Result<Vec<Element<'_>>> {
        match self.tab.find_elements(locator) {
            Ok(cards) => Ok(cards),
            Err(e) if is_missing(&e) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }
}


impl Session for ChromeSession {
    fn open(&self, url: &Url) -> anyhow::Result<()> {
        debug!("Navigating to {url}");
        self.tab
            .navigate_to(url.as_str())?
            .wait_until_navigated()
            .with_context(|| format!("Failed to load {url}"))?;
        Ok(())
    }

    fn current_url(&self) -> anyhow::Result<Url> {
        let url = self.tab.get_url();
        Url::parse(&url).with_context(|| format!("Browser is on an unparseable URL: {url}"))
    }

    fn wait_for_text(&self, locator: &str) -> anyhow::Result<Option<String>> {
        match self.tab.wait_for_element_with_custom_timeout(locator, self.timeout) {
            Ok(element) => element.get_inner_text().map(Some),
            Err(e) if never_appeared(&e) => {
                debug!("`{locator}` did not appear: {e}");
                Ok(None)
            }
            Err(e) => Err(e.context(format!("Failed waiting for `{locator}`"))),
        }
    }

    fn submit_search(&self, input_locator: &str, keyword: &str) -> anyhow::Result<()> {
        let before = self.tab.get_url();
        let input = self
            .tab
            .wait_for_element_with_custom_timeout(input_locator, self.timeout)
            .with_context(|| format!("Search input `{input_locator}` not found"))?;
        input.type_into(keyword)?;
        self.tab.press_key("Enter")?;

        // The portal routes client side, so navigation events are unreliable.
        let deadline = Instant::now() + self.timeout;
        while self.tab.get_url() == before {
            if Instant::now() >= deadline {
                anyhow::bail!("Searching for {keyword:?} did not leave {before}");
            }
            std::thread::sleep(URL_POLL_INTERVAL);
        }
        self.tab.wait_until_navigated()?;
        Ok(())
    }
}
