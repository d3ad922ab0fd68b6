//! Botmeter error types.

use thiserror::Error;

/// Errors that can occur while recording or persisting usage metrics.
#[derive(Debug, Error)]
pub enum MeterError {
    /// Configuration is invalid.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The durable record could not be read or written.
    ///
    /// When returned from a mutating call, the in-memory state was left
    /// untouched and the caller may retry.
    #[error("Persistence unavailable: {0}")]
    PersistenceUnavailable(String),

    /// The durable record exists but does not match the expected schema.
    #[error("Persisted state is corrupt: {0}")]
    StateCorrupt(String),
}
