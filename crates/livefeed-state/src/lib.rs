//! LiveFeed State Engine - Message ordering and conditional apply
//!
//! This crate implements the decision core of a feed:
//! - Ordering filter (message-level staleness gate)
//! - Target and resolver seams
//! - Conditional merge policy (toggle-reference gating)
//! - Per-key application pipeline
//! - In-memory target graph

pub mod diagnostic;
pub mod memory;
pub mod merge;
pub mod order;
pub mod pipeline;
pub mod target;

pub use diagnostic::*;
pub use memory::*;
pub use merge::*;
pub use order::*;
pub use pipeline::*;
pub use target::*;
