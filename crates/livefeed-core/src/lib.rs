//! LiveFeed Core - Fundamental types and primitives
//!
//! This crate defines the core types used throughout LiveFeed:
//! - Identifiers (SubscriptionToken)
//! - Time primitives (LogicalTimestamp, OriginTime)
//! - Channel status tags
//! - Error type shared by every crate

pub mod id;
pub mod time;
pub mod status;
pub mod error;

pub use id::*;
pub use time::*;
pub use status::*;
pub use error::*;
