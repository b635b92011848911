use std::sync::LazyLock;

use regex::Regex;

use super::{Document, Strategy};
use crate::normalize::{PriceRange, strip_separators};

// ASCII digits only; `\d` would also take Arabic-Indic or full-width digits
// digits with optional thousands separators and an optional fraction
static NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9][0-9,]*(?:\.[0-9]+)?").expect("valid regex"));

// the whole string, exactly two fraction digits
static STRICT_PRICE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9][0-9,]*\.[0-9]{2}$").expect("valid regex"));

/// First element matching a CSS selector, first number in its text.
#[derive(Debug, Clone)]
pub struct SelectorStrategy {
    selector: String,
}

impl SelectorStrategy {
    pub fn new(selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
        }
    }
}

impl Strategy for SelectorStrategy {
    fn name(&self) -> &str {
        &self.selector
    }

    fn locate(&self, doc: &dyn Document) -> Option<String> {
        let text = doc.select_first_text(&self.selector)?;
        NUMBER.find(&text).map(|m| strip_separators(m.as_str()))
    }
}

/// Any leaf whose whole text looks like a price and lands inside `range`.
#[derive(Debug, Clone)]
pub struct LeafScanStrategy {
    range: PriceRange,
}

impl LeafScanStrategy {
    pub fn new(range: PriceRange) -> Self {
        Self { range }
    }
}

impl Strategy for LeafScanStrategy {
    fn name(&self) -> &str {
        "leaf-scan"
    }

    fn locate(&self, doc: &dyn Document) -> Option<String> {
        doc.leaf_texts().into_iter().find_map(|text| {
            if !STRICT_PRICE.is_match(&text) {
                return None;
            }
            let cleaned = strip_separators(&text);
            let value: f64 = cleaned.parse().ok()?;
            self.range.contains(value).then_some(cleaned)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;

    struct Leaves(Vec<&'static str>);

    impl Document for Leaves {
        fn select_first_text(&self, _: &str) -> Option<String> {
            None
        }

        fn leaf_texts(&self) -> Vec<String> {
            self.0.iter().map(|s| s.to_string()).collect()
        }
    }

    struct One(&'static str);

    impl Document for One {
        fn select_first_text(&self, _: &str) -> Option<String> {
            Some(self.0.to_string())
        }

        fn leaf_texts(&self) -> Vec<String> {
            Vec::new()
        }
    }

    fn scan(leaves: Vec<&'static str>) -> Option<String> {
        LeafScanStrategy::new(PriceRange::default()).locate(&Leaves(leaves))
    }

    #[test]
    fn leaf_scan_accepts_two_decimal_values_inside_range() {
        for raw in ["100.01", "692.50", "1,234.56", "1999.99"] {
            let got = scan(vec![raw]).unwrap_or_else(|| panic!("{raw} should match"));
            assert!(normalize(&got, &PriceRange::default()).is_ok());
        }
        assert_eq!(scan(vec!["1,234.56"]).as_deref(), Some("1234.56"));
    }

    #[test]
    fn leaf_scan_rejects_values_at_or_beyond_bounds() {
        for raw in ["100.00", "42.00", "2000.00", "2,000.00", "15,000.25"] {
            assert_eq!(scan(vec![raw]), None, "{raw} should be rejected");
        }
    }

    #[test]
    fn leaf_scan_requires_exactly_two_fraction_digits() {
        for raw in ["692", "692.5", "692.500", "$692.50", "692.50 USD", ".50"] {
            assert_eq!(scan(vec![raw]), None, "{raw} should not match");
        }
    }

    #[test]
    fn leaf_scan_takes_first_plausible_leaf() {
        let got = scan(vec!["Volume", "52.10", "3,400.00", "701.25", "699.00"]);
        assert_eq!(got.as_deref(), Some("701.25"));
    }

    #[test]
    fn selector_takes_first_number_in_text() {
        let s = SelectorStrategy::new(".x");
        assert_eq!(s.locate(&One("1,234.56 USD")).as_deref(), Some("1234.56"));
        assert_eq!(s.locate(&One("Last: 692.5 (+1.2%)")).as_deref(), Some("692.5"));
        assert_eq!(s.locate(&One("692")).as_deref(), Some("692"));
        assert_eq!(s.locate(&One("n/a")), None);
    }

    #[test]
    fn selector_ignores_non_ascii_digits() {
        let s = SelectorStrategy::new(".x");
        let got = s.locate(&One("٣ 692.50")).unwrap();
        assert_eq!(got, "692.50");
        assert_eq!(normalize(&got, &PriceRange::default()).unwrap(), 692.50);

        assert_eq!(s.locate(&One("６９２.５０")), None);
    }

    #[test]
    fn leaf_scan_ignores_non_ascii_digits() {
        assert_eq!(scan(vec!["６９２.５０", "٦٩٢.٥٠"]), None);
        assert_eq!(scan(vec!["６９２.５０", "692.50"]).as_deref(), Some("692.50"));
    }
}
