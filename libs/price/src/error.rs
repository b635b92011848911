use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("navigation timed out after {timeout_ms}ms")]
    NavigationTimeout { timeout_ms: u64 },

    #[error("element `{selector}` did not appear within {timeout_ms}ms")]
    ElementWaitTimeout { selector: String, timeout_ms: u64 },

    #[error("could not extract price from page")]
    ExtractionNotFound,

    #[error("price {value} outside plausible range ({min}, {max})")]
    ValidationOutOfRange { value: f64, min: f64, max: f64 },

    #[error("price text is not a number: {0:?}")]
    ValidationUnparseable(String),

    #[error("history file {} is corrupt: {source}", path.display())]
    PersistedStateCorrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error on {}: {source}", path.display())]
    PersistenceIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("browser error: {0}")]
    Browser(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl FetchError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::PersistenceIo {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn browser(err: impl std::fmt::Display) -> Self {
        Self::Browser(err.to_string())
    }

    /// True when the stored history must not be touched until someone looks at it.
    pub fn is_fatal_for_history(&self) -> bool {
        matches!(self, Self::PersistedStateCorrupt { .. })
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::PersistedStateCorrupt { .. } => 2,
            Self::Config(_) => 3,
            _ => 1,
        }
    }
}

pub type Result<T, E = FetchError> = std::result::Result<T, E>;
