use crate::error::{FetchError, Result};

/// Exclusive bounds a scraped price has to fall within to be believed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceRange {
    min: f64,
    max: f64,
}

impl PriceRange {
    pub fn new(min: f64, max: f64) -> Result<Self> {
        if !min.is_finite() || !max.is_finite() {
            return Err(FetchError::Config(format!(
                "price bounds must be finite (min={min}, max={max})"
            )));
        }
        if min < 0.0 || min >= max {
            return Err(FetchError::Config(format!(
                "price bounds must satisfy 0 <= min < max (min={min}, max={max})"
            )));
        }

        Ok(Self { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn contains(&self, value: f64) -> bool {
        value > self.min && value < self.max
    }
}

impl Default for PriceRange {
    // Gas oil futures, USD per metric ton
    fn default() -> Self {
        Self {
            min: 100.0,
            max: 2000.0,
        }
    }
}

pub(crate) fn strip_separators(text: &str) -> String {
    text.chars().filter(|c| *c != ',').collect()
}

/// Parse a scraped price string and check it against `range`.
///
/// Applied to every extraction result, so a number picked up by a selector
/// (a promo banner, a volume figure) is rejected the same way a leaf-scan hit would be.
pub fn normalize(raw: &str, range: &PriceRange) -> Result<f64> {
    let cleaned = strip_separators(raw.trim());
    let value: f64 = cleaned
        .parse()
        .map_err(|_| FetchError::ValidationUnparseable(raw.to_string()))?;

    if !value.is_finite() {
        return Err(FetchError::ValidationUnparseable(raw.to_string()));
    }

    if !range.contains(value) {
        return Err(FetchError::ValidationOutOfRange {
            value,
            min: range.min,
            max: range.max,
        });
    }

    Ok(value)
}
