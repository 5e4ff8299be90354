use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, SyncError>;

/// Error type covering the failures that can occur while catalogs are loaded,
/// deltas are persisted, or a run is configured.
///
/// The merge engine itself never fails; per-record apply failures are
/// collected into reports instead of being raised through this type.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when JSON parsing or serialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Raised when the run configuration is not valid TOML.
    #[error("configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// Errors bubbled up from the HTTP client.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Raised when a catalog document does not have the expected shape.
    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),

    /// Raised when a raw record carries no usable product code.
    #[error("record at position {position} has no product code")]
    MissingCode { position: usize },

    /// Raised when an environment variable holding a credential is unset.
    #[error("missing credential: environment variable {0} is not set")]
    MissingCredential(String),

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when a warehouse stock sync cannot be completed.
    #[error("warehouse stock sync failed: {0}")]
    StockSync(String),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}
