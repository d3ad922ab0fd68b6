//! Window rotation policy.

pub mod rotation;
