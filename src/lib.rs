//! # Botmeter
//!
//! **Crash-safe daily and monthly usage counters for chat bots.**
//!
//! Botmeter tracks, for a rolling day and a rolling month, the set of
//! distinct users who talked to a bot and how many downloads they triggered.
//! It is built to be called from every message handler at once.
//!
//! ## Features
//!
//! - **Serialized updates**: every read-modify-write runs under one lock, so
//!   concurrent handlers never lose an update
//! - **Atomic persistence**: state is written to a temp file, synced, and
//!   renamed into place before a call returns
//! - **Self-healing rotation**: windows reset when the date has moved past
//!   the last recorded boundary, so a process that slept through midnight
//!   still rotates, exactly once
//! - **Background scheduler**: rotation happens even with no traffic
//! - **Fail-soft startup**: a corrupt state file is replaced by empty
//!   counters with a warning instead of blocking startup
//!
//! ## Quickstart
//!
//! ```no_run
//! use botmeter::{MeterConfig, MetricsService};
//!
//! # async fn run() -> Result<(), botmeter::MeterError> {
//! let service = MetricsService::start(MeterConfig::from_env()?).await?;
//! let meter = service.meter();
//!
//! // From a text-message handler:
//! meter.record_visit(123_456_789i64).await?;
//!
//! // From a download button handler:
//! meter.record_download(123_456_789i64).await?;
//!
//! // From an admin-only stats command:
//! println!("{}", meter.snapshot().await?);
//!
//! service.shutdown().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Limitations
//!
//! One process should own a state file. Atomic replace keeps the file
//! parseable if two processes share it, but their updates can overwrite
//! each other.

#![deny(missing_docs)]

// Core modules
pub mod clock;
pub mod config;
pub mod errors;

// Data model
pub mod state;

// Rotation policy
pub mod policy;

// Storage layer
pub mod store;

// Metering layer
pub mod meter;

// Service (main public API)
pub mod manager;

// Re-exports for public API
pub use clock::{Clock, SystemClock};
pub use config::MeterConfig;
pub use errors::MeterError;
pub use manager::MetricsService;
pub use meter::scheduler::RotationScheduler;
pub use meter::usage::UsageMeter;
pub use policy::rotation::{maybe_rotate, Rotation};
pub use state::models::{MetricsState, MonthStamp, Snapshot, UserId, Window};
pub use store::backend::StateBackend;
pub use store::counter::CounterStore;
pub use store::file::FileBackend;

#[cfg(any(test, feature = "test-seams"))]
pub use clock::MockClock;
