use crate::errors::{BrowserError, Result};
use scraper::{Html, Selector};

/// Parsed outer HTML of a node, for checking what the page rendered.
pub struct Markup {
    fragment: Html,
}

impl Markup {
    pub fn parse_fragment(html: &str) -> Self {
        Self {
            fragment: Html::parse_fragment(html),
        }
    }

    /// Text of the first element matching `selector`, trimmed.
    pub fn text(&self, selector: &str) -> Result<Option<String>> {
        let selector = parse_selector(selector)?;
        Ok(self
            .fragment
            .select(&selector)
            .next()
            .map(|element| element.text().collect::<String>().trim().to_string()))
    }

    /// Number of elements matching `selector`.
    pub fn count(&self, selector: &str) -> Result<usize> {
        let selector = parse_selector(selector)?;
        Ok(self.fragment.select(&selector).count())
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector)
        .map_err(|e| BrowserError::InvalidSelector(format!("{}: {:?}", selector, e)))
}
