//! LiveFeed Mapping - Producer-side payload construction
//!
//! Turns flat source records into keyed update entries:
//! - Value transformations (clock splitting, ordinals, type assertions)
//! - Field mappings with enable flags
//! - Per-target mappings with optional apply toggles
//! - Timestamped payload assembly

pub mod mapping;
pub mod target;
pub mod transform;

pub use mapping::*;
pub use target::*;
pub use transform::*;
