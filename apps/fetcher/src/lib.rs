use std::time::Duration;

use price::{
    ChromiumLauncher, HistoryStore, Launcher, Quote, RunFailure, RunSuccess, Runner,
    TelegramNotifier,
};
use tracing::{debug, warn};

use crate::config::Config;

pub mod config;

const NOTIFY_TIMEOUT: Duration = Duration::from_secs(10);

pub struct App {
    pub runner: Runner,
    pub launcher: Box<dyn Launcher>,
    pub notifier: Option<TelegramNotifier>,
}

impl App {
    pub fn from_config(config: &Config) -> Self {
        Self {
            runner: Runner::new(config.run.clone(), HistoryStore::new(&config.data_file)),
            launcher: Box::new(ChromiumLauncher::new(config.launch.clone())),
            notifier: config
                .telegram
                .as_ref()
                .map(|t| TelegramNotifier::new(t.token.clone(), t.chat_id.clone())),
        }
    }

    /// One pipeline attempt, then a best-effort notification.
    pub async fn run_once(&self) -> Result<RunSuccess, RunFailure> {
        let outcome = self.runner.run(&*self.launcher).await;
        self.notify(&outcome).await;
        outcome
    }

    async fn notify(&self, outcome: &Result<RunSuccess, RunFailure>) {
        let Some(notifier) = &self.notifier else {
            return;
        };

        match tokio::time::timeout(NOTIFY_TIMEOUT, notifier.send(&summary(outcome))).await {
            Ok(Ok(())) => debug!("notification sent"),
            Ok(Err(e)) => warn!(error = ?e, "notification failed"),
            Err(_) => warn!("notification timed out"),
        }
    }
}

pub fn summary(outcome: &Result<RunSuccess, RunFailure>) -> String {
    match outcome {
        Ok(success) => {
            let quote = Quote::from_history(&success.history);
            format!(
                "Market price updated: {} ({})",
                quote.price_text(),
                quote.date_text()
            )
        }
        Err(failure) => format!("Market price fetch failed: {failure}"),
    }
}
