use std::path::Path;

use anyhow::Context;
use scraper::{ElementRef, Html, Selector};

use crate::error::ScrapeError;

use super::{Card, ResultsPage};


pub(crate) fn parse_selector(locator: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(locator).map_err(|e| ScrapeError::InvalidSelector {
        locator: locator.to_string(),
        reason: format!("{e:?}"),
    })
}


/// Rendered-ish text of an element: each non-blank text node on its own line.
fn inner_text(element: ElementRef) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}


impl Card for ElementRef<'_> {
    fn text(&self, locator: &str) -> anyhow::Result<Option<String>> {
        let selector = parse_selector(locator)?;
        Ok(self.select(&selector).next().map(inner_text))
    }

    fn attribute(&self, locator: &str, attribute: &str) -> anyhow::Result<Option<String>> {
        let selector = parse_selector(locator)?;
        Ok(self
            .select(&selector)
            .next()
            .and_then(|element| element.value().attr(attribute))
            .map(String::from))
    }
}


impl ResultsPage for Html {
    type Card<'a> = ElementRef<'a>;

    fn cards(&self, locator: &str) -> anyhow::Result<Vec<ElementRef<'_>>> {
        let selector = parse_selector(locator)?;
        Ok(self.select(&selector).collect())
    }
}


/// Parses a results page saved to disk.
pub(crate) fn read_page(path: &Path) -> anyhow::Result<Html> {
    let html = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(Html::parse_document(&html))
}




#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn text_nodes_are_joined_by_lines() {
        let html = Html::parse_fragment("<ul class=\"tags\"><li>Python</li>\n  <li> Git </li></ul>");
        let root = html.root_element();
        assert_eq!(Card::text(&root, "ul.tags").unwrap(), Some("Python\nGit".to_string()));
        assert_eq!(Card::text(&root, "ol").unwrap(), None);
    }

    #[test]
    fn attributes_are_read_from_first_match() {
        let html = Html::parse_fragment("<a class=\"title\" href=\"/one\">One</a><a class=\"title\">Two</a>");
        let root = html.root_element();
        assert_eq!(Card::attribute(&root, "a.title", "href").unwrap(), Some("/one".to_string()));
        assert_eq!(Card::attribute(&root, "a.title", "target").unwrap(), None);
        assert_eq!(Card::attribute(&root, "a.missing", "href").unwrap(), None);
    }

    #[test]
    fn invalid_selector_is_an_error() {
        let html = Html::parse_document("<p>hi</p>");
        assert!(html.cards("p[").is_err());
        assert!(matches!(parse_selector("p["), Err(ScrapeError::InvalidSelector { .. })));
    }

    #[test]
    fn results_count_is_found_from_the_document_root() {
        let html = Html::parse_document(include_str!("../../tests/htmls/results_page_1.html"));
        let count = Card::text(&html.root_element(), ".styles_h1-wrapper__mHVA1 .styles_count-string__DlPaZ").unwrap();
        assert_eq!(count.as_deref(), Some("1 - 20 of 47"));
    }
}
