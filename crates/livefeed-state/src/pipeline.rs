//! Message application pipeline

use livefeed_core::LogicalTimestamp;
use livefeed_wire::{value_kind, BodyItem, Message};
use tracing::debug;

use crate::{
    Admission, Decision, Diagnostic, EngineState, MergePolicy, OrderingFilter, Rejection,
    TargetResolver,
};

/// Per-key tally for one accepted message
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ApplyResult {
    pub logical_ts: LogicalTimestamp,
    pub applied: u32,
    pub gated: u32,
    pub not_found: u32,
    pub malformed: u32,
    /// Applied despite an unevaluable control
    pub failed_open: u32,
    pub diagnostics: Vec<Diagnostic>,
}

/// What happened to one message
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MessageOutcome {
    Applied(ApplyResult),
    Rejected(Rejection),
}

impl MessageOutcome {
    pub fn is_rejected(&self) -> bool {
        matches!(self, MessageOutcome::Rejected(_))
    }

    pub fn result(&self) -> Option<&ApplyResult> {
        match self {
            MessageOutcome::Applied(result) => Some(result),
            MessageOutcome::Rejected(_) => None,
        }
    }
}

/// Ordering filter plus merge policy, driving one subscription
#[derive(Debug, Default)]
pub struct ApplyEngine {
    filter: OrderingFilter,
    policy: MergePolicy,
}

impl ApplyEngine {
    pub fn new() -> Self {
        ApplyEngine::default()
    }

    pub fn state(&self) -> &EngineState {
        self.filter.state()
    }

    /// Process one message completely: ordering check, then every key in order
    pub fn process(&mut self, message: Message, resolver: &dyn TargetResolver) -> MessageOutcome {
        let accepted = match self.filter.admit(message) {
            Admission::Accepted(accepted) => accepted,
            Admission::Rejected(rejection) => {
                Diagnostic::from(rejection).log();
                return MessageOutcome::Rejected(rejection);
            }
        };

        let mut result = ApplyResult {
            logical_ts: accepted.logical_ts,
            ..Default::default()
        };

        for (key, item) in accepted.body {
            let Some(target) = resolver.resolve(&key) else {
                result.not_found += 1;
                result.record(Diagnostic::TargetNotFound { key });
                continue;
            };

            let entry = match item {
                BodyItem::Entry(entry) => entry,
                BodyItem::Malformed(value) => {
                    result.malformed += 1;
                    result.record(Diagnostic::malformed(
                        key,
                        format!("expected object, got {}", value_kind(&value)),
                    ));
                    continue;
                }
            };

            let verdict = self.policy.evaluate(&key, &entry, &target.current_state());
            match verdict.decision {
                Decision::Apply => {
                    target.apply(&entry);
                    result.applied += 1;
                    debug!(key = %key, ts = %accepted.logical_ts, "applied entry");
                }
                Decision::Skip { control } => {
                    result.gated += 1;
                    debug!(key = %key, control = %control, "entry gated off");
                }
            }
            if let Some(diagnostic) = verdict.diagnostic {
                result.failed_open += 1;
                result.record(diagnostic);
            }
        }

        MessageOutcome::Applied(result)
    }
}

impl ApplyResult {
    fn record(&mut self, diagnostic: Diagnostic) {
        diagnostic.log();
        self.diagnostics.push(diagnostic);
    }
}
