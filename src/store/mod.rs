//! Counter store: in-memory state with durable write-through.

pub mod backend;
pub mod counter;
pub mod file;
pub mod format;
