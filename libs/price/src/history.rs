use chrono::{DateTime, NaiveDate, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// One validated observation for a calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceReading {
    #[serde(deserialize_with = "positive_price")]
    pub price: f64,

    pub date: NaiveDate,

    #[serde(with = "rfc3339_millis")]
    pub timestamp: DateTime<Utc>,
}

impl PriceReading {
    /// The reading's date is the UTC day of `captured_at`.
    pub fn new(price: f64, captured_at: DateTime<Utc>) -> Self {
        let timestamp = captured_at.trunc_subsecs(3);
        Self {
            price,
            date: timestamp.date_naive(),
            timestamp,
        }
    }

    pub fn captured_now(price: f64) -> Self {
        Self::new(price, Utc::now())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Merge {
    Inserted,
    Replaced,
}

/// Latest reading plus one entry per day, newest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceHistory {
    pub current: Option<PriceReading>,

    #[serde(default)]
    pub history: Vec<PriceReading>,
}

impl PriceHistory {
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn get(&self, date: NaiveDate) -> Option<&PriceReading> {
        self.history.iter().find(|r| r.date == date)
    }

    /// Fold `reading` in. A reading for a day that is already present replaces it.
    pub fn merge(&mut self, reading: PriceReading) -> Merge {
        let outcome = match self.history.iter().position(|r| r.date == reading.date) {
            Some(idx) => {
                self.history[idx] = reading;
                Merge::Replaced
            }
            None => {
                self.history.push(reading);
                Merge::Inserted
            }
        };

        // stable, so the entry just written stays first among any same-day leftovers
        self.history.sort_by(|a, b| b.date.cmp(&a.date));
        self.history.dedup_by_key(|r| r.date);
        self.current = self.history.first().cloned();

        outcome
    }
}

fn positive_price<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let price = f64::deserialize(deserializer)?;
    if price.is_finite() && price > 0.0 {
        Ok(price)
    } else {
        Err(serde::de::Error::custom(format!(
            "price must be a positive number, got {price}"
        )))
    }
}

// JS-style `2024-03-01T14:05:09.123Z`
mod rfc3339_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}
