//! Persistence seam for the counter store.

use crate::state::models::MetricsState;
use crate::MeterError;
use async_trait::async_trait;

/// Durable medium holding the single metrics record.
#[async_trait]
pub trait StateBackend: Send + Sync {
    /// Load the persisted state.
    ///
    /// Returns `Ok(None)` when nothing has been persisted yet.
    async fn load(&self) -> Result<Option<MetricsState>, MeterError>;

    /// Durably replace the persisted state.
    ///
    /// Must either leave the previous record intact or fully replace it.
    async fn persist(&self, state: &MetricsState) -> Result<(), MeterError>;
}
