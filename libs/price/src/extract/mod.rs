//! Locating the price in a rendered page.
//!
//! The upstream page uses generated class names that change without notice,
//! so extraction is an ordered list of independent [`Strategy`]s. The most
//! specific selectors go first and a value-shape scan over leaf text goes last.

mod document;
mod strategy;

use tracing::{debug, warn};

use crate::error::{FetchError, Result};
use crate::normalize::PriceRange;

pub use document::HtmlDocument;
pub use strategy::{LeafScanStrategy, SelectorStrategy};

/// Selectors known to have carried the last price, most stable first.
pub const PRICE_SELECTORS: &[&str] = &[
    r#"[class*="lastContainer"] [class*="last-"]"#,
    r#"[data-name="legend-source-item"] [class*="value"]"#,
    ".tv-symbol-price-quote__value",
    r#"[class*="priceValue"]"#,
];

/// A rendered page the strategies can query.
pub trait Document {
    /// Trimmed text content of the first element matching `selector`.
    fn select_first_text(&self, selector: &str) -> Option<String>;

    /// Trimmed text of every element without element children, in document order.
    fn leaf_texts(&self) -> Vec<String>;
}

/// One self-contained way of finding a price in a [`Document`].
pub trait Strategy: Send + Sync {
    fn name(&self) -> &str;

    /// The cleaned numeric string (no thousands separators), if found.
    fn locate(&self, doc: &dyn Document) -> Option<String>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub raw: String,
    pub strategy: String,
}

pub struct Extractor {
    strategies: Vec<Box<dyn Strategy>>,
}

impl Extractor {
    pub fn new(strategies: Vec<Box<dyn Strategy>>) -> Self {
        Self { strategies }
    }

    /// The known selectors followed by the leaf scan bounded by `range`.
    pub fn standard(range: PriceRange) -> Self {
        let mut strategies: Vec<Box<dyn Strategy>> = PRICE_SELECTORS
            .iter()
            .map(|s| Box::new(SelectorStrategy::new(*s)) as Box<dyn Strategy>)
            .collect();
        strategies.push(Box::new(LeafScanStrategy::new(range)));

        Self::new(strategies)
    }

    pub fn strategies(&self) -> impl Iterator<Item = &str> {
        self.strategies.iter().map(|s| s.name())
    }

    pub fn extract(&self, doc: &dyn Document) -> Result<Extraction> {
        for strategy in &self.strategies {
            match strategy.locate(doc) {
                Some(raw) => {
                    debug!(strategy = strategy.name(), raw = %raw, "strategy matched");
                    return Ok(Extraction {
                        raw,
                        strategy: strategy.name().to_string(),
                    });
                }
                None => debug!(strategy = strategy.name(), "strategy found nothing"),
            }
        }

        warn!(tried = self.strategies.len(), "all extraction strategies exhausted");
        Err(FetchError::ExtractionNotFound)
    }

    /// Parse a rendered HTML snapshot and run [`Extractor::extract`] on it.
    pub fn extract_html(&self, html: &str) -> Result<Extraction> {
        let doc = HtmlDocument::parse(html);
        self.extract(&doc)
    }
}
