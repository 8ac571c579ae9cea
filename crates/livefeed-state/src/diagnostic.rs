//! Engine diagnostics
//!
//! None of these stop the engine. They degrade a single key, or at worst a
//! single message.

use std::fmt;

use livefeed_core::LogicalTimestamp;

use crate::Rejection;

/// Severity attached to a diagnostic
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

/// Non-fatal condition observed while processing a message
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Diagnostic {
    /// Whole message behind the last accepted one
    StaleMessage {
        last_accepted: LogicalTimestamp,
        received: LogicalTimestamp,
    },
    /// No node for this key
    TargetNotFound { key: String },
    /// Toggle names a control missing from the target state; applied anyway
    ControlNodeNotFound { key: String, control: String },
    /// Unexpected shape; `key` is `None` for message-level problems
    MalformedEntry { key: Option<String>, reason: String },
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            Diagnostic::StaleMessage { .. } | Diagnostic::MalformedEntry { .. } => {
                Severity::Warning
            }
            Diagnostic::TargetNotFound { .. } | Diagnostic::ControlNodeNotFound { .. } => {
                Severity::Error
            }
        }
    }

    pub fn malformed(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Diagnostic::MalformedEntry {
            key: Some(key.into()),
            reason: reason.into(),
        }
    }

    pub fn malformed_message(reason: impl Into<String>) -> Self {
        Diagnostic::MalformedEntry {
            key: None,
            reason: reason.into(),
        }
    }

    /// Emit through `tracing` at the matching level
    pub fn log(&self) {
        match self.severity() {
            Severity::Warning => tracing::warn!(diagnostic = ?self, "{}", self),
            Severity::Error => tracing::error!(diagnostic = ?self, "{}", self),
        }
    }
}

impl From<Rejection> for Diagnostic {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::StaleMessage {
                last_accepted,
                received,
            } => Diagnostic::StaleMessage {
                last_accepted,
                received,
            },
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::StaleMessage {
                last_accepted,
                received,
            } => write!(
                f,
                "discarding stale message: timestamp {} is behind {}",
                received, last_accepted
            ),
            Diagnostic::TargetNotFound { key } => {
                write!(f, "couldn't find {} in the graph (it was provided by the channel)", key)
            }
            Diagnostic::ControlNodeNotFound { key, control } => write!(
                f,
                "control {} referenced by {} does not exist; applying anyway",
                control, key
            ),
            Diagnostic::MalformedEntry { key: Some(key), reason } => {
                write!(f, "malformed entry for {}: {}", key, reason)
            }
            Diagnostic::MalformedEntry { key: None, reason } => {
                write!(f, "malformed message: {}", reason)
            }
        }
    }
}
