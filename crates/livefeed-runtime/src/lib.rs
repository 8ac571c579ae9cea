//! LiveFeed Runtime - Subscription lifecycle and worker loop
//!
//! Wires a channel adapter to the state engine:
//! 1. Subscribe with the configured token
//! 2. Queue inbound events on a bounded channel
//! 3. Decode, order and merge on a single worker task
//! 4. Record statistics, latency samples and diagnostics
//! 5. Unsubscribe and stop the worker on close

pub mod channel;
pub mod config;
pub mod feed;
pub mod stats;
pub mod telemetry;

pub use channel::*;
pub use config::*;
pub use feed::*;
pub use stats::*;
pub use telemetry::{init as init_telemetry, LogFormat};
