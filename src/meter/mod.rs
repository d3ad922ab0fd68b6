//! Usage metering: the handler-facing meter and its rotation scheduler.

pub mod scheduler;
pub mod usage;
