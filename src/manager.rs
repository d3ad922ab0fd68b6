//! Metrics service - the main public API for Botmeter.
//!
//! The `MetricsService` wires the pieces together:
//! - File-backed counter store at the configured location
//! - Usage meter shared by every event handler
//! - Background rotation scheduler

use crate::clock::{Clock, SystemClock};
use crate::config::MeterConfig;
use crate::meter::scheduler::RotationScheduler;
use crate::meter::usage::UsageMeter;
use crate::store::counter::CounterStore;
use crate::store::file::FileBackend;
use crate::MeterError;
use std::sync::Arc;

/// Running metrics service.
///
/// Create one per process at startup, hand [`MetricsService::meter`] to the
/// bot's handlers, and call [`MetricsService::shutdown`] on exit.
#[derive(Debug)]
pub struct MetricsService {
    config: MeterConfig,
    meter: Arc<UsageMeter>,
    scheduler: RotationScheduler,
}

impl MetricsService {
    /// Start the service with the system clock.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    /// Returns an error if:
    /// - Configuration validation fails
    /// - The state location cannot be resolved
    ///
    /// An unreadable or corrupt state record is not an error; the service
    /// starts from empty counters instead.
    pub async fn start(config: MeterConfig) -> Result<Self, MeterError> {
        Self::with_clock(config, Arc::new(SystemClock)).await
    }

    /// Start the service with a custom clock (for testing).
    #[cfg(any(test, feature = "test-seams"))]
    pub async fn start_with_clock(
        config: MeterConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, MeterError> {
        Self::with_clock(config, clock).await
    }

    async fn with_clock(config: MeterConfig, clock: Arc<dyn Clock>) -> Result<Self, MeterError> {
        config.validate()?;
        let path = config.resolve_state_path()?;
        tracing::info!(path = %path.display(), "opening metrics store");

        let store = CounterStore::open(Box::new(FileBackend::new(path))).await;
        let meter = Arc::new(UsageMeter::with_offset(store, clock, config.utc_offset));
        let scheduler = RotationScheduler::spawn(meter.clone(), config.tick_interval);

        Ok(Self {
            config,
            meter,
            scheduler,
        })
    }

    /// Shared meter for event handlers.
    pub fn meter(&self) -> Arc<UsageMeter> {
        self.meter.clone()
    }

    /// Get the current configuration.
    pub fn config(&self) -> &MeterConfig {
        &self.config
    }

    /// Stop the rotation scheduler and wait for it to exit.
    ///
    /// Meters handed out earlier keep working; they just stop rotating in
    /// the background.
    pub async fn shutdown(self) {
        self.scheduler.shutdown().await;
        tracing::info!("metrics service stopped");
    }
}
