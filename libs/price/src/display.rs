//! How the static site renders the stored price.
//!
//! The page shows the current price with two decimals and the date in US
//! short form, falling back to placeholders when there is nothing valid.

use chrono::NaiveDate;

use crate::history::PriceHistory;

pub const PRICE_PLACEHOLDER: &str = "—";
pub const DATE_PLACEHOLDER: &str = "Unavailable";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quote {
    price: Option<f64>,
    date: Option<NaiveDate>,
}

impl Quote {
    pub fn from_history(history: &PriceHistory) -> Self {
        match &history.current {
            Some(r) if r.price.is_finite() && r.price > 0.0 => Self {
                price: Some(r.price),
                date: Some(r.date),
            },
            _ => Self::unavailable(),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            price: None,
            date: None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.price.is_some()
    }

    pub fn price_text(&self) -> String {
        self.price
            .map(|p| format!("{p:.2}"))
            .unwrap_or_else(|| PRICE_PLACEHOLDER.to_string())
    }

    pub fn date_text(&self) -> String {
        self.date
            .map(|d| d.format("%b %-d, %Y").to_string())
            .unwrap_or_else(|| DATE_PLACEHOLDER.to_string())
    }
}
