//! Metrics data model.

pub mod models;
