//! Error types for LiveFeed
//!
//! Per-message outcomes (stale messages, missing targets) are not errors;
//! they are reported as diagnostics by the state engine.

use thiserror::Error;

/// Core LiveFeed errors
#[derive(Error, Debug)]
pub enum LiveFeedError {
    // Wire errors
    #[error("Invalid wire format: {0}")]
    InvalidWireFormat(String),

    #[error("Unknown channel status: {0}")]
    UnknownStatus(String),

    #[error("Invalid logical timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Payload is not an object")]
    PayloadNotObject,

    #[error("Reserved key used as a target key: {0}")]
    ReservedKey(String),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Lifecycle errors
    #[error("Feed already open")]
    AlreadyOpen,

    #[error("Feed already closed")]
    AlreadyClosed,

    // Channel errors
    #[error("Subscription failed: {0}")]
    SubscriptionFailed(String),

    #[error("Channel closed")]
    ChannelClosed,

    #[error("Channel full")]
    ChannelFull,
}

/// Result type for LiveFeed operations
pub type LiveFeedResult<T> = Result<T, LiveFeedError>;
