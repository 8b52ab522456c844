//! Shared data structures

pub mod analysis;
pub mod riot;
