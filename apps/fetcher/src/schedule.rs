use std::sync::Arc;

use anyhow::Result;
use fetcher::{App, config::Schedule};
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{info, instrument, warn};
use tracing_futures::Instrument;

#[instrument(name = "run_scheduled", skip_all, fields(cron = %schedule.cron, tz = %schedule.timezone))]
pub async fn run_scheduled(app: Arc<App>, schedule: Schedule) -> Result<()> {
    let sched = JobScheduler::new().await?;

    // a tick that lands while the previous run is still going is dropped
    let in_flight = Arc::new(Mutex::new(()));

    sched
        .add(Job::new_async_tz(
            schedule.cron.as_str(),
            schedule.timezone,
            move |uuid, _l| {
                let app = Arc::clone(&app);
                let in_flight = Arc::clone(&in_flight);

                Box::pin(async move {
                    let Ok(_guard) = in_flight.try_lock() else {
                        warn!(job = %uuid, "previous run still in progress, skipping tick");
                        return;
                    };

                    let span = tracing::info_span!("scheduled_run", job = %uuid);
                    if let Err(failure) = app.run_once().instrument(span).await {
                        warn!(exit_code = failure.exit_code(), "scheduled run failed");
                    }
                })
            },
        )?)
        .await?;

    sched.shutdown_on_ctrl_c();
    sched.start().await?;
    info!("scheduler started");

    shutdown_signal().await;

    info!("Shutdown complete.");
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::{
            select,
            signal::unix::{SignalKind, signal},
        };
        let (Ok(mut sigterm), Ok(mut sigint)) = (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) else {
            warn!("failed to install signal handlers, falling back to ctrl-c");
            let _ = tokio::signal::ctrl_c().await;
            return;
        };
        select! {
            _ = sigterm.recv() => {},
            _ = sigint.recv()  => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
