//! Error types for the pressure bot

use thiserror::Error;

/// Result type alias using our custom Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the pressure bot
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Chain indexer errors
    #[error("Indexer request failed: {0}")]
    SourceFetch(String),

    #[error("Indexer request timed out")]
    SourceTimeout,

    #[error("Indexer response decode failed: {0}")]
    SourceDecode(String),

    // Trade execution errors
    #[error("Trade submission failed: {0}")]
    TradeExecution(String),

    // Upstream rejection message is already human-readable, pass it through
    #[error("{0}")]
    TradeRejected(String),

    // Lifecycle errors
    #[error("Pressure monitor not initialized. Please provide config.")]
    NotInitialized,

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Check if this error is retryable (transient)
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::SourceFetch(_) | Error::SourceTimeout | Error::TradeExecution(_)
        )
    }

    /// Check if this error belongs to the fetch family (recorded in the
    /// engine's error history, never propagated out of a cycle)
    pub fn is_fetch_error(&self) -> bool {
        matches!(
            self,
            Error::SourceFetch(_) | Error::SourceTimeout | Error::SourceDecode(_)
        )
    }
}

// Conversion from reqwest errors
impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Error::SourceTimeout
        } else if e.is_decode() {
            Error::SourceDecode(e.to_string())
        } else {
            Error::SourceFetch(e.to_string())
        }
    }
}

// Conversion from serde_json errors
impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
