//! Mutex-guarded counter store with write-through persistence.

use crate::state::models::MetricsState;
use crate::store::backend::StateBackend;
use crate::MeterError;
use std::sync::Arc;
use tokio::sync::Mutex;

struct Inner {
    state: MetricsState,
    /// Whether `state` is known to match the durable record.
    durable: bool,
}

/// Holds the metrics state and serializes every read-transform-write cycle.
///
/// All mutations go through [`CounterStore::apply`], which holds a single
/// lock across the transform and the durable write. Concurrent callers are
/// therefore totally ordered and no update is lost.
pub struct CounterStore {
    inner: Arc<Mutex<Inner>>,
    backend: Arc<dyn StateBackend>,
}

impl CounterStore {
    /// Open the store, loading any persisted state.
    ///
    /// An unreadable or corrupt record is replaced by a fresh state and a
    /// warning is logged. Losing historical counters is preferred over
    /// refusing to start.
    pub async fn open(backend: Box<dyn StateBackend>) -> Self {
        let (state, durable) = match backend.load().await {
            Ok(Some(state)) => {
                tracing::debug!(
                    daily_users = state.daily.user_count(),
                    monthly_users = state.monthly.user_count(),
                    "loaded persisted metrics state"
                );
                (state, true)
            }
            Ok(None) => {
                tracing::info!("no persisted metrics state, starting empty");
                (MetricsState::new(), false)
            }
            Err(e) => {
                tracing::warn!(error = %e, "discarding unusable metrics state, starting empty");
                (MetricsState::new(), false)
            }
        };

        Self {
            inner: Arc::new(Mutex::new(Inner { state, durable })),
            backend: Arc::from(backend),
        }
    }

    /// Apply a transformation and persist the result.
    ///
    /// The new state becomes visible only after it has been written. If the
    /// write fails the in-memory state is left as it was and
    /// [`MeterError::PersistenceUnavailable`] is returned.
    ///
    /// Once the lock is acquired the write and commit run on their own task
    /// holding the lock, so dropping the caller's future cannot leave the
    /// durable record ahead of memory.
    pub async fn apply<F>(&self, mutator: F) -> Result<MetricsState, MeterError>
    where
        F: FnOnce(MetricsState) -> MetricsState,
    {
        let mut inner = self.inner.clone().lock_owned().await;
        let next = mutator(inner.state.clone());

        if inner.durable && next == inner.state {
            return Ok(next);
        }

        let backend = self.backend.clone();
        let commit = tokio::spawn(async move {
            backend.persist(&next).await?;
            inner.state = next.clone();
            inner.durable = true;
            Ok::<_, MeterError>(next)
        });

        commit.await.map_err(|e| {
            MeterError::PersistenceUnavailable(format!("State write task failed: {}", e))
        })?
    }

    /// Consistent snapshot of the current state.
    pub async fn read(&self) -> MetricsState {
        self.inner.lock().await.state.clone()
    }
}

impl std::fmt::Debug for CounterStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CounterStore").finish_non_exhaustive()
    }
}
