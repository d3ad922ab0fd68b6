//! Usage meter: the entry point used by bot event handlers.
//!
//! Every call runs the rotation policy inside the same store transaction as
//! its own update, with `now` read while the lock is held. An event arriving
//! exactly at a boundary is therefore recorded in the new window, and a
//! snapshot taken after a missed boundary already shows the reset counters.

use crate::clock::Clock;
use crate::policy::rotation::{rotate_in_place, Rotation};
use crate::state::models::{MetricsState, Snapshot, UserId};
use crate::store::counter::CounterStore;
use crate::MeterError;
use chrono::{DateTime, FixedOffset, Offset, Utc};
use std::sync::Arc;

/// Daily and monthly usage meter backed by a [`CounterStore`].
pub struct UsageMeter {
    store: CounterStore,
    clock: Arc<dyn Clock>,
    utc_offset: FixedOffset,
}

impl UsageMeter {
    /// Create a meter whose day boundaries fall at UTC midnight.
    pub fn new(store: CounterStore, clock: Arc<dyn Clock>) -> Self {
        Self::with_offset(store, clock, Utc.fix())
    }

    /// Create a meter whose day boundaries fall at midnight in `utc_offset`.
    pub fn with_offset(store: CounterStore, clock: Arc<dyn Clock>, utc_offset: FixedOffset) -> Self {
        Self {
            store,
            clock,
            utc_offset,
        }
    }

    /// Record that `user` interacted with the bot.
    pub async fn record_visit(&self, user: impl Into<UserId>) -> Result<(), MeterError> {
        let user = user.into();
        tracing::debug!(user = %user, "recording visit");
        self.transact(|state| state.record_visit(user)).await?;
        Ok(())
    }

    /// Record a download by `user`. A download also counts as a visit.
    pub async fn record_download(&self, user: impl Into<UserId>) -> Result<(), MeterError> {
        let user = user.into();
        tracing::debug!(user = %user, "recording download");
        self.transact(|state| state.record_download(user)).await?;
        Ok(())
    }

    /// Current counts, after bringing the windows up to date.
    pub async fn snapshot(&self) -> Result<Snapshot, MeterError> {
        let (state, _) = self.transact(|_| ()).await?;
        Ok(Snapshot::from(&state))
    }

    /// Rotate any window whose boundary has passed.
    pub async fn rotate(&self) -> Result<Rotation, MeterError> {
        let (_, rotation) = self.transact(|_| ()).await?;
        Ok(rotation)
    }

    /// Raw state, without rotating.
    pub async fn state(&self) -> MetricsState {
        self.store.read().await
    }

    /// Rotate, then apply `update`, in one store transaction.
    async fn transact<F>(&self, update: F) -> Result<(MetricsState, Rotation), MeterError>
    where
        F: FnOnce(&mut MetricsState),
    {
        let mut rotation = Rotation::default();
        let state = self
            .store
            .apply(|mut state| {
                rotation = rotate_in_place(&mut state, &self.local_now());
                update(&mut state);
                state
            })
            .await?;
        log_rotation(rotation, &state);
        Ok((state, rotation))
    }

    fn local_now(&self) -> DateTime<FixedOffset> {
        self.clock.now_utc().with_timezone(&self.utc_offset)
    }
}

impl std::fmt::Debug for UsageMeter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UsageMeter")
            .field("store", &self.store)
            .field("utc_offset", &self.utc_offset)
            .finish_non_exhaustive()
    }
}

fn log_rotation(rotation: Rotation, state: &MetricsState) {
    if rotation.daily {
        tracing::info!(
            window = "daily",
            since = ?state.last_daily_reset,
            "rotated usage window"
        );
    }
    if rotation.monthly {
        tracing::info!(
            window = "monthly",
            since = ?state.last_monthly_reset,
            "rotated usage window"
        );
    }
}
