//! Ordering filter for out-of-order and resent messages
//!
//! The gate is non-strict: a message whose logical timestamp equals the last
//! accepted one is admitted, so identical resends still apply.

use livefeed_core::LogicalTimestamp;
use livefeed_wire::{Message, MessageBody};

/// Per-subscription ordering state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineState {
    /// Last accepted logical timestamp, `MIN` until something is accepted
    last_accepted: LogicalTimestamp,
    initialized: bool,
    /// Set once a message carrying its own clock has been accepted
    clocked: bool,
}

impl EngineState {
    /// Fresh state that accepts any timestamp
    pub fn new() -> Self {
        EngineState {
            last_accepted: LogicalTimestamp::MIN,
            initialized: false,
            clocked: false,
        }
    }

    /// Last accepted timestamp, if any message has been accepted
    pub fn last_accepted(&self) -> Option<LogicalTimestamp> {
        self.initialized.then_some(self.last_accepted)
    }

    /// Has any message been accepted yet?
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Has a message with an explicit timestamp been accepted yet?
    pub fn is_clocked(&self) -> bool {
        self.clocked
    }

    /// Would a message with this timestamp pass the gate?
    #[inline]
    pub fn check(&self, ts: LogicalTimestamp) -> Freshness {
        if ts < self.last_accepted {
            Freshness::Stale {
                last_accepted: self.last_accepted,
                received: ts,
            }
        } else {
            Freshness::Fresh
        }
    }

    /// Check and advance in one step
    pub fn accept(&mut self, ts: LogicalTimestamp) -> Freshness {
        let freshness = self.check(ts);
        if freshness.is_fresh() {
            self.last_accepted = ts;
            self.initialized = true;
            self.clocked = true;
        }
        freshness
    }

    /// Gate a message without a clock. It counts as zero and is only
    /// admitted until a timestamped message has been accepted.
    pub fn accept_unclocked(&mut self) -> Freshness {
        let ts = LogicalTimestamp::ZERO;
        if self.clocked {
            return Freshness::Stale {
                last_accepted: self.last_accepted,
                received: ts,
            };
        }
        let freshness = self.check(ts);
        if freshness.is_fresh() {
            self.last_accepted = ts;
            self.initialized = true;
        }
        freshness
    }
}

impl Default for EngineState {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of checking a timestamp against the gate
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    Stale {
        last_accepted: LogicalTimestamp,
        received: LogicalTimestamp,
    },
}

impl Freshness {
    pub fn is_fresh(&self) -> bool {
        matches!(self, Freshness::Fresh)
    }
}

/// Why a whole message was discarded
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    StaleMessage {
        last_accepted: LogicalTimestamp,
        received: LogicalTimestamp,
    },
}

/// Body of an admitted message, ready for per-key processing
#[derive(Clone, Debug, PartialEq)]
pub struct AcceptedBody {
    pub logical_ts: LogicalTimestamp,
    pub body: MessageBody,
}

/// Result of [`OrderingFilter::admit`]
#[derive(Clone, Debug, PartialEq)]
pub enum Admission {
    Accepted(AcceptedBody),
    Rejected(Rejection),
}

impl Admission {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Admission::Accepted(_))
    }
}

/// Message-level staleness gate
#[derive(Clone, Debug, Default)]
pub struct OrderingFilter {
    state: EngineState,
}

impl OrderingFilter {
    pub fn new() -> Self {
        OrderingFilter::default()
    }

    /// Resume from an existing state
    pub fn with_state(state: EngineState) -> Self {
        OrderingFilter { state }
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    /// Probe a timestamp without advancing the gate
    pub fn check(&self, ts: LogicalTimestamp) -> Freshness {
        self.state.check(ts)
    }

    /// Accept or reject a message as a unit.
    /// A missing logical timestamp counts as zero and is stale once any
    /// timestamped message has been accepted.
    pub fn admit(&mut self, message: Message) -> Admission {
        let ts = message.effective_timestamp();
        let freshness = match message.logical_ts {
            Some(ts) => self.state.accept(ts),
            None => self.state.accept_unclocked(),
        };
        match freshness {
            Freshness::Fresh => Admission::Accepted(AcceptedBody {
                logical_ts: ts,
                body: message.body,
            }),
            Freshness::Stale {
                last_accepted,
                received,
            } => Admission::Rejected(Rejection::StaleMessage {
                last_accepted,
                received,
            }),
        }
    }
}
