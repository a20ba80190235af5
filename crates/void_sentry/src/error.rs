//! Error types for the sentry core

use thiserror::Error;

/// Sentry errors
///
/// Steady-state ticking never fails; these only surface while loading
/// configuration.
#[derive(Debug, Error)]
pub enum SentryError {
    /// Configuration text could not be parsed
    #[error("Failed to parse sentry configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// Configuration contains values that cannot be clamped into range
    #[error("Invalid sentry configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for sentry operations
pub type Result<T> = std::result::Result<T, SentryError>;
