//! Error types for Cycle Flux

use thiserror::Error;

/// Errors that can occur while loading settings or running a tracker operation
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("Readiness provider request failed: {0}")]
    ProviderFailure(String),

    #[error("Notification transport failed: {0}")]
    TransportFailure(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to resolve credential: {0}")]
    Credential(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Date parse error: {0}")]
    DateParseError(String),

    #[error("Invalid LH test result: {0} (expected 'positive' or 'negative')")]
    InvalidLhResult(String),
}
