use scraper::{ElementRef, Html, Selector};
use tracing::warn;

use super::Document;

/// Parsed snapshot of a rendered page.
pub struct HtmlDocument {
    html: Html,
}

impl HtmlDocument {
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
        }
    }
}

fn trimmed_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

impl Document for HtmlDocument {
    fn select_first_text(&self, selector: &str) -> Option<String> {
        let sel = match Selector::parse(selector) {
            Ok(sel) => sel,
            Err(e) => {
                warn!(selector, error = %e, "invalid selector");
                return None;
            }
        };

        self.html.select(&sel).next().map(trimmed_text)
    }

    fn leaf_texts(&self) -> Vec<String> {
        self.html
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|el| !el.children().any(|c| c.value().is_element()))
            .map(trimmed_text)
            .collect()
    }
}
