mod error;
mod history;
mod normalize;
mod runner;
mod store;

pub mod browser;
pub mod display;
pub mod extract;
pub mod notify;

pub use browser::{ChromiumLauncher, LaunchOptions, Launcher, PageSession};
pub use display::Quote;
pub use error::{FetchError, Result};
pub use extract::{Extraction, Extractor};
pub use history::{Merge, PriceHistory, PriceReading};
pub use normalize::{PriceRange, normalize};
pub use notify::TelegramNotifier;
pub use runner::{DEFAULT_TARGET_URL, RunConfig, RunFailure, RunState, RunSuccess, Runner};
pub use store::HistoryStore;
