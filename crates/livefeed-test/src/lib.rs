//! LiveFeed Test Harness - Chaos testing and end-to-end validation
//!
//! This crate provides:
//! - Seeded chaos channel (jitter, loss, reordering, duplication)
//! - Reference ordering oracle
//! - Synchronous feed harness over an in-memory graph
//! - End-to-end scenarios

pub mod chaos;
pub mod harness;
pub mod oracle;
pub mod scenarios;

pub use chaos::*;
pub use harness::*;
pub use oracle::*;
pub use scenarios::*;
