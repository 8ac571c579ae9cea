//! LiveFeed Wire Format - JSON channel events
//!
//! This crate implements the boundary contract of the real-time channel:
//! - Inbound event envelope (`status` + `data { ts, payload }`)
//! - Reserved control keys (`__TIMESTAMP`, `__APPLY_CHECKBOX`)
//! - Message bodies and update entries
//! - Outbound payload construction

pub mod event;
pub mod message;
pub mod payload;
pub mod reserved;

pub use event::*;
pub use message::*;
pub use payload::*;
pub use reserved::*;
