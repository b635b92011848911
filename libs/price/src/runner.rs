use std::fmt;
use std::time::Duration;

use tracing::{debug, error, info, instrument, warn};

use crate::browser::{Launcher, PageSession};
use crate::error::{FetchError, Result};
use crate::extract::{Extractor, PRICE_SELECTORS};
use crate::history::{Merge, PriceHistory, PriceReading};
use crate::normalize::{PriceRange, normalize};
use crate::store::HistoryStore;

pub const DEFAULT_TARGET_URL: &str = "https://www.tradingview.com/symbols/NYMEX-AGT1!/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    SessionStarted,
    Navigated,
    ElementAwaited,
    Extracted,
    Normalized,
    Merged,
    Persisted,
    Closed,
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub target_url: String,
    pub wait_selector: String,
    pub range: PriceRange,
    pub navigation_timeout: Duration,
    pub element_timeout: Duration,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            target_url: DEFAULT_TARGET_URL.to_string(),
            wait_selector: PRICE_SELECTORS[0].to_string(),
            range: PriceRange::default(),
            navigation_timeout: Duration::from_secs(60),
            element_timeout: Duration::from_secs(30),
        }
    }
}

/// A run that ended in `Failed`. `stage` is the last state reached before the error;
/// `state` is the terminal state, always `Failed`.
#[derive(Debug, thiserror::Error)]
#[error("price fetch failed after {stage}: {error}")]
pub struct RunFailure {
    pub stage: RunState,
    pub state: RunState,
    #[source]
    pub error: FetchError,
}

impl RunFailure {
    pub fn exit_code(&self) -> u8 {
        self.error.exit_code()
    }
}

#[derive(Debug, Clone)]
pub struct RunSuccess {
    pub state: RunState,
    pub reading: PriceReading,
    pub history: PriceHistory,
    pub merge: Merge,
    pub strategy: String,
}

/// One scrape-extract-merge-persist attempt. No retries.
pub struct Runner {
    config: RunConfig,
    extractor: Extractor,
    store: HistoryStore,
}

impl Runner {
    pub fn new(config: RunConfig, store: HistoryStore) -> Self {
        let extractor = Extractor::standard(config.range);
        Self {
            config,
            extractor,
            store,
        }
    }

    pub fn with_extractor(mut self, extractor: Extractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn store(&self) -> &HistoryStore {
        &self.store
    }

    /// History is loaded before the browser starts, so a corrupt file costs
    /// nothing and is never overwritten. Once a session exists it is closed
    /// on every path out of here.
    #[instrument(
        name = "fetch_price",
        skip(self, launcher),
        fields(url = %self.config.target_url)
    )]
    pub async fn run(&self, launcher: &dyn Launcher) -> Result<RunSuccess, RunFailure> {
        let mut state = RunState::Idle;

        let history = self.store.load().map_err(|e| fail(&mut state, e))?;

        let mut session = launcher.launch().await.map_err(|e| fail(&mut state, e))?;
        advance(&mut state, RunState::SessionStarted);

        let outcome = self.drive(session.as_mut(), &mut state, history).await;

        if let Err(e) = session.close().await {
            warn!(error = %e, "browser teardown failed");
        }

        match outcome {
            Ok(mut success) => {
                advance(&mut state, RunState::Closed);
                success.state = state;
                info!(
                    price = success.reading.price,
                    date = %success.reading.date,
                    "price fetch completed"
                );
                Ok(success)
            }
            Err(e) => Err(fail(&mut state, e)),
        }
    }

    async fn drive(
        &self,
        session: &mut dyn PageSession,
        state: &mut RunState,
        mut history: PriceHistory,
    ) -> Result<RunSuccess> {
        let cfg = &self.config;

        info!("navigating");
        session.navigate(&cfg.target_url, cfg.navigation_timeout).await?;
        advance(state, RunState::Navigated);

        info!(selector = %cfg.wait_selector, "waiting for price element");
        session
            .wait_for(&cfg.wait_selector, cfg.element_timeout)
            .await?;
        advance(state, RunState::ElementAwaited);

        let html = session.content().await?;
        let extraction = self.extractor.extract_html(&html)?;
        advance(state, RunState::Extracted);

        let price = normalize(&extraction.raw, &cfg.range)?;
        info!(price, strategy = %extraction.strategy, "extracted price");
        advance(state, RunState::Normalized);

        let reading = PriceReading::captured_now(price);
        let merge = history.merge(reading.clone());
        match merge {
            Merge::Replaced => info!(date = %reading.date, "updated existing entry for the day"),
            Merge::Inserted => info!(date = %reading.date, "added new entry for the day"),
        }
        advance(state, RunState::Merged);

        self.store.persist(&history)?;
        advance(state, RunState::Persisted);

        Ok(RunSuccess {
            state: *state,
            reading,
            history,
            merge,
            strategy: extraction.strategy,
        })
    }
}

fn advance(state: &mut RunState, next: RunState) {
    debug!(from = %state, to = %next, "state transition");
    *state = next;
}

fn fail(state: &mut RunState, error: FetchError) -> RunFailure {
    let stage = *state;
    error!(%stage, error = %error, "price fetch failed");
    advance(state, RunState::Failed);
    RunFailure {
        stage,
        state: *state,
        error,
    }
}
