use std::time::Duration;
use thiserror::Error;

/// Unified error type for the entire crypto-portfolio-core library.
/// Every public function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Validation ──────────────────────────────────────────────────
    #[error("Validation failed: {0}")]
    ValidationError(String),

    #[error("Holding index {index} out of range (portfolio has {len} holdings)")]
    IndexOutOfRange { index: usize, len: usize },

    // ── API / Network ───────────────────────────────────────────────
    #[error("API error ({provider}): {message}")]
    Api {
        provider: String,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Price request timed out after {0:?}")]
    Timeout(Duration),

    // ── Storage / File ──────────────────────────────────────────────
    #[error("File I/O error: {0}")]
    FileIO(String),

    #[error("Invalid file format: {0}")]
    InvalidFileFormat(String),

    #[error("Unsupported file version: {0}")]
    UnsupportedVersion(u16),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    // ── Lifecycle ───────────────────────────────────────────────────
    #[error("Portfolio tracker has stopped")]
    TrackerStopped,
}

/// Coarse classification of a [`CoreError`], used by callers to decide
/// how to react (show a dialog, keep the last snapshot, warn about saving).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad user input. Nothing was mutated.
    Validation,
    /// The price source could not be reached or returned garbage.
    Fetch,
    /// Reading or writing the holdings file failed.
    Persistence,
    /// The orchestration task is gone.
    Shutdown,
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::ValidationError(_) | CoreError::IndexOutOfRange { .. } => {
                ErrorKind::Validation
            }
            CoreError::Api { .. } | CoreError::Network(_) | CoreError::Timeout(_) => {
                ErrorKind::Fetch
            }
            CoreError::FileIO(_)
            | CoreError::InvalidFileFormat(_)
            | CoreError::UnsupportedVersion(_)
            | CoreError::Serialization(_)
            | CoreError::Deserialization(_) => ErrorKind::Persistence,
            CoreError::TrackerStopped => ErrorKind::Shutdown,
        }
    }

    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }

    pub fn is_fetch(&self) -> bool {
        self.kind() == ErrorKind::Fetch
    }

    pub fn is_persistence(&self) -> bool {
        self.kind() == ErrorKind::Persistence
    }
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::FileIO(e.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        CoreError::Network(redact_query(&e.to_string()))
    }
}

/// reqwest errors carry the full URL; the id list in the query is noise in logs.
/// Drops everything from `?` up to the closing `)` of reqwest's `(url)` suffix.
fn redact_query(msg: &str) -> String {
    let Some(start) = msg.find('?') else {
        return msg.to_string();
    };
    let rest = &msg[start..];
    let tail = rest.find(')').map_or("", |end| &rest[end..]);
    format!("{}?<query redacted>{tail}", &msg[..start])
}
