use std::time::Duration;

use tracing::{debug, warn};
use url::Url;

use crate::{config::FieldSpec, listing::Record};

pub(crate) mod chrome;
pub(crate) mod snapshot;


/// One result card on a listings page.
pub(crate) trait Card {
    /// Text of the first element matching `locator` inside this card.
    ///
    /// Returns Ok(None) if nothing matches.
    /// Returns Err(_) if the lookup itself failed, for example because the browser went away.
    fn text(&self, locator: &str) -> anyhow::Result<Option<String>>;

    /// Value of `attribute` on the first element matching `locator` inside this card.
    ///
    /// Returns Ok(None) if nothing matches or the element lacks the attribute.
    fn attribute(&self, locator: &str, attribute: &str) -> anyhow::Result<Option<String>>;
}


/// Something holding a page of result cards.
pub(crate) trait ResultsPage {
    type Card<'a>: Card
    where
        Self: 'a;

    /// Every card matching `locator`, in page order. No match is an empty list, not an error.
    fn cards(&self, locator: &str) -> anyhow::Result<Vec<Self::Card<'_>>>;
}


/// A browsing session that can be steered between results pages.
pub(crate) trait Session: ResultsPage {
    fn open(&self, url: &Url) -> anyhow::Result<()>;

    fn current_url(&self) -> anyhow::Result<Url>;

    /// Text of the first element matching `locator` on the current page, once it appears.
    ///
    /// Returns Ok(None) if the element never shows up within the session's wait timeout.
    fn wait_for_text(&self, locator: &str) -> anyhow::Result<Option<String>>;

    /// Types `keyword` into the element at `input_locator`, submits it and waits
    /// for the page to move on.
    fn submit_search(&self, input_locator: &str, keyword: &str) -> anyhow::Result<()>;

    /// Gives a freshly opened page time to finish rendering.
    fn settle(&self, pause: Duration) {
        std::thread::sleep(pause);
    }
}


/// Reads one listing out of `card`, substituting each field's default for
/// elements the card does not have.
pub(crate) fn extract<C: Card + ?Sized>(card: &C, specs: &[FieldSpec]) -> anyhow::Result<Record> {
    let mut record = Record::default();
    for spec in specs {
        let value = match &spec.attribute {
            Some(attribute) => card.attribute(&spec.locator, attribute)?,
            None => card.text(&spec.locator)?,
        };
        let value = value.unwrap_or_else(|| {
            debug!("`{}` not found for {}, using {:?}", spec.locator, spec.field.header(), spec.default_value());
            spec.default_value().to_string()
        });
        record.set(spec.field, value);
    }
    Ok(record)
}


/// Extracts every card on `page`. Cards that fail with anything other than a
/// missing element are skipped.
pub(crate) fn harvest<P: ResultsPage + ?Sized>(
    page: &P,
    card_locator: &str,
    specs: &[FieldSpec],
) -> anyhow::Result<Vec<Record>> {
    let cards = page.cards(card_locator)?;
    debug!("Found {} cards matching `{card_locator}`", cards.len());

    let mut records = Vec::with_capacity(cards.len());
    for (i, card) in cards.iter().enumerate() {
        match extract(card, specs) {
            Ok(record) => records.push(record),
            Err(e) => warn!("Skipping card {}: {e:#}", i + 1),
        }
    }
    Ok(records)
}


#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::config::default_fields;
    use pretty_assertions::assert_eq;
    use scraper::Html;

    const CARD: &str = "div[class*='srp-jobtuple-wrapper']";

    #[test]
    fn extracts_every_configured_field() {
        let html = Html::parse_document(include_str!("../../tests/htmls/results_page_1.html"));
        let records = harvest(&html, CARD, &default_fields()).unwrap();
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.title, "Backend Developer (Python/Django)");
        assert_eq!(first.reference, "https://www.example.com/job-listings-backend-developer-101");
        assert_eq!(first.company, "Pixel Creationz");
        assert_eq!(first.experience, "0-1 Yrs");
        assert_eq!(first.salary, "Not disclosed");
        assert_eq!(first.location, "Bangalore/Bengaluru");
        assert_eq!(first.skills, vec!["Python", "Django", "SQL"]);
        assert_eq!(first.posted, "1 Day Ago");
    }

    #[test]
    fn missing_salary_falls_back_to_default() {
        let html = Html::parse_document(include_str!("../../tests/htmls/results_page_1.html"));
        let records = harvest(&html, CARD, &default_fields()).unwrap();

        let second = &records[1];
        assert_eq!(second.title, "Python Developer");
        assert_eq!(second.salary, "N/A");
        assert_eq!(second.description, "N/A");
    }

    #[test]
    fn page_without_cards_yields_nothing() {
        let html = Html::parse_document("<html><body><p>No jobs found</p></body></html>");
        assert!(harvest(&html, CARD, &default_fields()).unwrap().is_empty());
    }

    /// A card whose lookups either all succeed or all fail.
    struct FlakyCard<'a> {
        fail: bool,
        calls: &'a Cell<usize>,
    }

    impl Card for FlakyCard<'_> {
        fn text(&self, locator: &str) -> anyhow::Result<Option<String>> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                anyhow::bail!("connection closed");
            }
            Ok(Some(format!("text of {locator}")))
        }

        fn attribute(&self, locator: &str, _attribute: &str) -> anyhow::Result<Option<String>> {
            self.text(locator)
        }
    }

    struct FlakyPage {
        failing: Vec<bool>,
        calls: Cell<usize>,
    }

    impl ResultsPage for FlakyPage {
        type Card<'a> = FlakyCard<'a>;

        fn cards(&self, _locator: &str) -> anyhow::Result<Vec<FlakyCard<'_>>> {
            Ok(self.failing.iter().map(|&fail| FlakyCard { fail, calls: &self.calls }).collect())
        }
    }

    #[test]
    fn failing_card_is_skipped() {
        let page = FlakyPage { failing: vec![false, true, false], calls: Cell::new(0) };
        let records = harvest(&page, CARD, &default_fields()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "text of a.title");
        // the failing card gives up on its first lookup
        assert_eq!(page.calls.get(), 2 * default_fields().len() + 1);
    }
}
