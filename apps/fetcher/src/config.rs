use std::{fmt, path::PathBuf, str::FromStr, time::Duration};

use anyhow::{Context, Result, anyhow};
use chrono_tz::Tz;
use price::{
    DEFAULT_TARGET_URL, LaunchOptions, PriceRange, RunConfig, browser::DEFAULT_USER_AGENT,
    extract::PRICE_SELECTORS,
};

#[derive(Clone, Debug)]
pub struct Config {
    pub run: RunConfig,
    pub data_file: PathBuf,
    pub launch: LaunchOptions,
    pub schedule: Option<Schedule>,
    pub telegram: Option<Telegram>,
}

#[derive(Clone, Debug)]
pub struct Schedule {
    pub cron: String,
    pub timezone: Tz,
}

/// Only present when both the bot token and the chat id are set.
#[derive(Clone)]
pub struct Telegram {
    pub token: String,
    pub chat_id: String,
}

impl fmt::Debug for Telegram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Telegram")
            .field("token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let min = parse_or(&var, "PRICE_MIN", 100.0)?;
        let max = parse_or(&var, "PRICE_MAX", 2000.0)?;
        let range = PriceRange::new(min, max)?;

        let run = RunConfig {
            target_url: var("PRICE_TARGET_URL").unwrap_or_else(|| DEFAULT_TARGET_URL.to_string()),
            wait_selector: var("PRICE_WAIT_SELECTOR")
                .unwrap_or_else(|| PRICE_SELECTORS[0].to_string()),
            range,
            navigation_timeout: Duration::from_millis(parse_or(
                &var,
                "PRICE_NAV_TIMEOUT_MS",
                60_000,
            )?),
            element_timeout: Duration::from_millis(parse_or(
                &var,
                "PRICE_WAIT_TIMEOUT_MS",
                30_000,
            )?),
        };

        let launch = LaunchOptions {
            chrome_path: var("PRICE_CHROME_PATH").map(PathBuf::from),
            user_agent: var("PRICE_USER_AGENT").unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            ..LaunchOptions::default()
        };

        let schedule = match var("PRICE_CRON") {
            Some(cron) => {
                let tz = var("PRICE_CRON_TZ").unwrap_or_else(|| "UTC".to_string());
                let timezone = tz
                    .parse::<Tz>()
                    .map_err(|e| anyhow!("invalid PRICE_CRON_TZ {tz:?}: {e}"))?;
                Some(Schedule { cron, timezone })
            }
            None => None,
        };

        let telegram = match (var("TELEGRAM_BOT_TOKEN"), var("TELEGRAM_CHAT_ID")) {
            (Some(token), Some(chat_id)) => Some(Telegram { token, chat_id }),
            _ => None,
        };

        Ok(Self {
            run,
            data_file: var("PRICE_DATA_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data/prices.json")),
            launch,
            schedule,
            telegram,
        })
    }
}

fn parse_or<T>(var: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} is not valid: {raw:?}")),
        None => Ok(default),
    }
}
