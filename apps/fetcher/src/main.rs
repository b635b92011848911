use std::{process::ExitCode, sync::Arc};

use fetcher::{App, config::Config};
use price::Quote;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod schedule;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = ?e, "invalid configuration");
            return ExitCode::from(3);
        }
    };

    let app = App::from_config(&config);
    info!(
        url = %config.run.target_url,
        data_file = %config.data_file.display(),
        notify = app.notifier.is_some(),
        "price fetcher starting"
    );

    match config.schedule {
        Some(schedule) => match schedule::run_scheduled(Arc::new(app), schedule).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                error!(error = ?e, "scheduler error");
                ExitCode::FAILURE
            }
        },
        None => match app.run_once().await {
            Ok(success) => {
                let quote = Quote::from_history(&success.history);
                info!(
                    price = %quote.price_text(),
                    date = %quote.date_text(),
                    strategy = %success.strategy,
                    "price fetch completed successfully"
                );
                ExitCode::SUCCESS
            }
            Err(failure) => ExitCode::from(failure.exit_code()),
        },
    }
}
