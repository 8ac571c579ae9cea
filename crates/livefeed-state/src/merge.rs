//! Conditional merge policy
//!
//! An entry may name a boolean control of its target through
//! `__APPLY_CHECKBOX`. The entry applies only while that control is checked.
//! When the control cannot be evaluated the policy fails open.

use livefeed_wire::{value_kind, StateMap, Toggle, UpdateEntry};
use serde_json::Value;

use crate::Diagnostic;

/// Apply or skip
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    Apply,
    /// Gated off by an unchecked control
    Skip { control: String },
}

/// Decision plus any diagnostic raised while reaching it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MergeVerdict {
    pub decision: Decision,
    pub diagnostic: Option<Diagnostic>,
}

impl MergeVerdict {
    fn apply() -> Self {
        MergeVerdict {
            decision: Decision::Apply,
            diagnostic: None,
        }
    }

    fn fail_open(diagnostic: Diagnostic) -> Self {
        MergeVerdict {
            decision: Decision::Apply,
            diagnostic: Some(diagnostic),
        }
    }

    pub fn should_apply(&self) -> bool {
        matches!(self.decision, Decision::Apply)
    }
}

/// Toggle-reference gate. Pure: never touches the target.
#[derive(Clone, Copy, Debug, Default)]
pub struct MergePolicy;

impl MergePolicy {
    pub fn new() -> Self {
        MergePolicy
    }

    /// Decide whether `entry` for `key` applies given the target's `current` state
    pub fn evaluate(&self, key: &str, entry: &UpdateEntry, current: &StateMap) -> MergeVerdict {
        let control = match entry.toggle() {
            Toggle::Absent => return MergeVerdict::apply(),
            Toggle::Control(control) => control,
            Toggle::Malformed(value) => {
                return MergeVerdict::fail_open(Diagnostic::malformed(
                    key,
                    format!("toggle reference must be a string, got {}", value_kind(value)),
                ))
            }
        };

        match current.get(control) {
            None => MergeVerdict::fail_open(Diagnostic::ControlNodeNotFound {
                key: key.to_owned(),
                control: control.to_owned(),
            }),
            Some(Value::Bool(true)) => MergeVerdict::apply(),
            Some(Value::Bool(false)) => MergeVerdict {
                decision: Decision::Skip {
                    control: control.to_owned(),
                },
                diagnostic: None,
            },
            Some(other) => MergeVerdict::fail_open(Diagnostic::malformed(
                key,
                format!("control {} is {}, expected bool", control, value_kind(other)),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn state(value: Value) -> StateMap {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_no_toggle_always_applies() {
        let policy = MergePolicy::new();
        let entry = UpdateEntry::new().with_field("x", 1);

        for current in [json!({}), json!({ "flag": false }), json!({ "flag": true })] {
            let verdict = policy.evaluate("a", &entry, &state(current));
            assert_eq!(verdict, MergeVerdict::apply());
        }
    }

    #[test]
    fn test_toggle_gating() {
        let policy = MergePolicy::new();
        let entry = UpdateEntry::new().with_toggle("flag").with_field("x", 1);

        let verdict = policy.evaluate("a", &entry, &state(json!({ "flag": false })));
        assert_eq!(
            verdict.decision,
            Decision::Skip {
                control: "flag".into()
            }
        );
        assert_eq!(verdict.diagnostic, None);

        let verdict = policy.evaluate("a", &entry, &state(json!({ "flag": true })));
        assert!(verdict.should_apply());
        assert_eq!(verdict.diagnostic, None);
    }

    #[test]
    fn test_missing_control_fails_open() {
        let policy = MergePolicy::new();
        let entry = UpdateEntry::new().with_toggle("ghost").with_field("x", 1);

        let verdict = policy.evaluate("a", &entry, &state(json!({ "flag": true })));
        assert!(verdict.should_apply());
        assert_eq!(
            verdict.diagnostic,
            Some(Diagnostic::ControlNodeNotFound {
                key: "a".into(),
                control: "ghost".into()
            })
        );
    }

    #[test]
    fn test_non_boolean_control_fails_open() {
        let policy = MergePolicy::new();
        let entry = UpdateEntry::new().with_toggle("flag");

        let verdict = policy.evaluate("a", &entry, &state(json!({ "flag": "yes" })));
        assert!(verdict.should_apply());
        assert!(matches!(
            verdict.diagnostic,
            Some(Diagnostic::MalformedEntry { key: Some(ref k), .. }) if k == "a"
        ));
    }

    #[test]
    fn test_non_string_toggle_fails_open() {
        let policy = MergePolicy::new();
        let mut entry = UpdateEntry::new();
        entry.insert(livefeed_wire::APPLY_CHECKBOX_KEY, json!(false));

        let verdict = policy.evaluate("a", &entry, &state(json!({})));
        assert!(verdict.should_apply());
        assert!(matches!(
            verdict.diagnostic,
            Some(Diagnostic::MalformedEntry { .. })
        ));
    }
}
