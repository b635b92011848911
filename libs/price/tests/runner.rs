//! Runner state machine against a scripted browser session.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use price::{
    FetchError, HistoryStore, Launcher, Merge, PageSession, PriceHistory, PriceRange, RunConfig,
    RunState, Runner,
};
use tempfile::TempDir;

#[derive(Clone, Copy, PartialEq)]
enum Fault {
    None,
    Launch,
    Navigation,
    ElementWait,
}

#[derive(Default)]
struct Counters {
    launched: AtomicUsize,
    closed: AtomicUsize,
}

struct FakeLauncher {
    html: String,
    fault: Fault,
    counters: Arc<Counters>,
    // turned into a directory while the page is rendering
    clobber: Option<PathBuf>,
}

impl FakeLauncher {
    fn serving(html: &str) -> Self {
        Self {
            html: html.to_string(),
            fault: Fault::None,
            counters: Arc::default(),
            clobber: None,
        }
    }

    fn clobbering(html: &str, path: PathBuf) -> Self {
        Self {
            clobber: Some(path),
            ..Self::serving(html)
        }
    }

    fn failing(fault: Fault) -> Self {
        Self {
            fault,
            ..Self::serving("<html></html>")
        }
    }

    fn launched(&self) -> usize {
        self.counters.launched.load(Ordering::SeqCst)
    }

    fn closed(&self) -> usize {
        self.counters.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Launcher for FakeLauncher {
    async fn launch(&self) -> price::Result<Box<dyn PageSession>> {
        if self.fault == Fault::Launch {
            return Err(FetchError::Browser("no chrome here".into()));
        }
        self.counters.launched.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeSession {
            html: self.html.clone(),
            fault: self.fault,
            counters: Arc::clone(&self.counters),
            clobber: self.clobber.clone(),
        }))
    }
}

struct FakeSession {
    html: String,
    fault: Fault,
    counters: Arc<Counters>,
    clobber: Option<PathBuf>,
}

#[async_trait]
impl PageSession for FakeSession {
    async fn navigate(&mut self, _url: &str, timeout: Duration) -> price::Result<()> {
        if self.fault == Fault::Navigation {
            return Err(FetchError::NavigationTimeout {
                timeout_ms: timeout.as_millis() as u64,
            });
        }
        Ok(())
    }

    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> price::Result<()> {
        if self.fault == Fault::ElementWait {
            return Err(FetchError::ElementWaitTimeout {
                selector: selector.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            });
        }
        Ok(())
    }

    async fn content(&mut self) -> price::Result<String> {
        if let Some(path) = &self.clobber {
            fs::create_dir_all(path).unwrap();
        }
        Ok(self.html.clone())
    }

    async fn close(self: Box<Self>) -> price::Result<()> {
        self.counters.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn runner(dir: &TempDir) -> Runner {
    let config = RunConfig {
        target_url: "https://example.test/symbols/AGT1".into(),
        navigation_timeout: Duration::from_millis(500),
        element_timeout: Duration::from_millis(200),
        ..RunConfig::default()
    };
    Runner::new(config, HistoryStore::new(dir.path().join("prices.json")))
}

const QUOTE_PAGE: &str = r#"<html><body>
  <div class="lastContainer-JWoJqCpY"><span class="last-JWoJqCpY">692.50</span><span>USD</span></div>
</body></html>"#;

#[tokio::test]
async fn successful_run_persists_and_closes() {
    let dir = tempfile::tempdir().unwrap();
    let runner = runner(&dir);
    let launcher = FakeLauncher::serving(QUOTE_PAGE);

    let success = runner.run(&launcher).await.unwrap();

    assert_eq!(success.reading.price, 692.50);
    assert_eq!(success.merge, Merge::Inserted);
    assert_eq!(success.state, RunState::Closed);
    assert_eq!(launcher.closed(), 1);

    let stored = runner.store().load().unwrap();
    assert_eq!(stored, success.history);
    assert_eq!(stored.current, Some(success.reading));
    assert_eq!(stored.len(), 1);
}

#[tokio::test]
async fn second_run_same_day_replaces_entry() {
    let dir = tempfile::tempdir().unwrap();
    let runner = runner(&dir);

    runner.run(&FakeLauncher::serving(QUOTE_PAGE)).await.unwrap();
    let updated = QUOTE_PAGE.replace("692.50", "1,695.25");
    let second = runner
        .run(&FakeLauncher::serving(&updated))
        .await
        .unwrap();

    assert_eq!(second.merge, Merge::Replaced);
    let stored = runner.store().load().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored.current.unwrap().price, 1695.25);
}

#[tokio::test]
async fn extraction_failure_tears_down_and_exits_non_zero() {
    let dir = tempfile::tempdir().unwrap();
    let runner = runner(&dir);
    let launcher = FakeLauncher::serving("<html><body><p>Market closed</p></body></html>");

    let failure = runner.run(&launcher).await.unwrap_err();

    assert!(matches!(failure.error, FetchError::ExtractionNotFound));
    assert_eq!(failure.stage, RunState::ElementAwaited);
    assert_eq!(failure.state, RunState::Failed);
    assert_ne!(failure.exit_code(), 0);
    assert_eq!(launcher.closed(), 1);
    assert!(!runner.store().path().exists(), "nothing should be written");
}

#[tokio::test]
async fn out_of_range_structural_value_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let runner = runner(&dir);
    let launcher = FakeLauncher::serving(
        r#"<html><body><div class="priceValue-banner">Win 25,000.00!</div></body></html>"#,
    );

    let failure = runner.run(&launcher).await.unwrap_err();

    assert!(matches!(
        failure.error,
        FetchError::ValidationOutOfRange { .. }
    ));
    assert_eq!(failure.stage, RunState::Extracted);
    assert_eq!(launcher.closed(), 1);
}

#[tokio::test]
async fn persist_failure_tears_down_and_exits_non_zero() {
    let dir = tempfile::tempdir().unwrap();
    let runner = runner(&dir);
    let path = runner.store().path().to_path_buf();
    let launcher = FakeLauncher::clobbering(QUOTE_PAGE, path.clone());

    let failure = runner.run(&launcher).await.unwrap_err();

    assert!(
        matches!(failure.error, FetchError::PersistenceIo { .. }),
        "{:?}",
        failure.error
    );
    assert_eq!(failure.stage, RunState::Merged);
    assert_eq!(failure.state, RunState::Failed);
    assert_ne!(failure.exit_code(), 0);
    assert_eq!(launcher.closed(), 1);
    assert!(path.is_dir());

    let names: Vec<_> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(names, vec![std::ffi::OsString::from("prices.json")]);
}

#[tokio::test]
async fn navigation_timeout_tears_down() {
    let dir = tempfile::tempdir().unwrap();
    let runner = runner(&dir);
    let launcher = FakeLauncher::failing(Fault::Navigation);

    let failure = runner.run(&launcher).await.unwrap_err();

    assert!(matches!(
        failure.error,
        FetchError::NavigationTimeout { timeout_ms: 500 }
    ));
    assert_eq!(failure.stage, RunState::SessionStarted);
    assert_eq!(launcher.closed(), 1);
}

#[tokio::test]
async fn element_wait_timeout_tears_down() {
    let dir = tempfile::tempdir().unwrap();
    let runner = runner(&dir);
    let launcher = FakeLauncher::failing(Fault::ElementWait);

    let failure = runner.run(&launcher).await.unwrap_err();

    assert!(matches!(failure.error, FetchError::ElementWaitTimeout { .. }));
    assert_eq!(failure.stage, RunState::Navigated);
    assert_eq!(launcher.closed(), 1);
}

#[tokio::test]
async fn launch_failure_has_nothing_to_close() {
    let dir = tempfile::tempdir().unwrap();
    let runner = runner(&dir);
    let launcher = FakeLauncher::failing(Fault::Launch);

    let failure = runner.run(&launcher).await.unwrap_err();

    assert!(matches!(failure.error, FetchError::Browser(_)));
    assert_eq!(failure.stage, RunState::Idle);
    assert_eq!(failure.state, RunState::Failed);
    assert_eq!(failure.exit_code(), 1);
    assert_eq!(launcher.launched(), 0);
    assert_eq!(launcher.closed(), 0);
}

#[tokio::test]
async fn corrupt_history_aborts_before_launch_and_is_preserved() {
    let dir = tempfile::tempdir().unwrap();
    let runner = runner(&dir);
    let path = runner.store().path().to_path_buf();
    fs::write(&path, "{ not json").unwrap();
    let launcher = FakeLauncher::serving(QUOTE_PAGE);

    let failure = runner.run(&launcher).await.unwrap_err();

    assert!(failure.error.is_fatal_for_history());
    assert_eq!(failure.exit_code(), 2);
    assert_eq!(launcher.launched(), 0);
    assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
}

#[tokio::test]
async fn merges_into_existing_history() {
    let dir = tempfile::tempdir().unwrap();
    let runner = runner(&dir);
    fs::write(
        runner.store().path(),
        r#"{"current":{"price":690.0,"date":"2020-01-02","timestamp":"2020-01-02T10:00:00.000Z"},
            "history":[
              {"price":690.0,"date":"2020-01-02","timestamp":"2020-01-02T10:00:00.000Z"},
              {"price":688.0,"date":"2020-01-01","timestamp":"2020-01-01T10:00:00.000Z"}]}"#,
    )
    .unwrap();

    let success = runner.run(&FakeLauncher::serving(QUOTE_PAGE)).await.unwrap();

    let stored: PriceHistory = runner.store().load().unwrap();
    assert_eq!(stored.len(), 3);
    assert_eq!(stored.history[0], success.reading);
    assert_eq!(stored.history[2].date.to_string(), "2020-01-01");
}

#[tokio::test]
async fn custom_range_flows_into_leaf_scan() {
    let dir = tempfile::tempdir().unwrap();
    let config = RunConfig {
        range: PriceRange::new(50.0, 90.0).unwrap(),
        ..RunConfig::default()
    };
    let runner = Runner::new(config, HistoryStore::new(dir.path().join("prices.json")));
    let launcher =
        FakeLauncher::serving("<html><body><span>692.50</span><span>72.15</span></body></html>");

    let success = runner.run(&launcher).await.unwrap();

    assert_eq!(success.reading.price, 72.15);
    assert_eq!(success.strategy, "leaf-scan");
}
