//! Durable record encoding.
//!
//! The record is a pretty-printed JSON object holding both windows and their
//! reset markers. Anything that does not match that schema is reported as
//! [`MeterError::StateCorrupt`] so the store can fall back to a fresh state.

use crate::state::models::MetricsState;
use crate::MeterError;

/// Serialize a state to the durable JSON layout.
pub fn to_json(state: &MetricsState) -> Result<String, MeterError> {
    serde_json::to_string_pretty(state).map_err(|e| {
        MeterError::PersistenceUnavailable(format!("Failed to serialize state: {}", e))
    })
}

/// Parse a durable record.
pub fn from_json(json: &str) -> Result<MetricsState, MeterError> {
    serde_json::from_str(json)
        .map_err(|e| MeterError::StateCorrupt(format!("Failed to parse state: {}", e)))
}
