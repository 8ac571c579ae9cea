//! Per-target mappings and payload assembly

use livefeed_core::LogicalTimestamp;
use livefeed_wire::PayloadBuilder;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{MapError, Mapping};

/// Mapping bound to a target key, optionally gated on one of its controls
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct TargetMapping {
    pub target_key: String,
    pub mapping: Mapping,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apply_checkbox: Option<String>,
}

impl TargetMapping {
    pub fn new(target_key: impl Into<String>, mapping: Mapping) -> Self {
        TargetMapping {
            target_key: target_key.into(),
            mapping,
            apply_checkbox: None,
        }
    }

    /// Only apply while `control` is checked on the target
    pub fn gated_on(mut self, control: impl Into<String>) -> Self {
        self.apply_checkbox = Some(control.into());
        self
    }
}

/// Build a complete payload from one source record.
///
/// The timestamp, when given, is written as `__TIMESTAMP` ahead of every
/// entry. Two mappings for the same target key: the later one wins.
pub fn build_payload(
    mappings: &[TargetMapping],
    source: &Value,
    exclude_incomplete: bool,
    timestamp: Option<LogicalTimestamp>,
) -> Result<Value, MapError> {
    let mut builder = PayloadBuilder::new();
    if let Some(ts) = timestamp {
        builder.set_timestamp(ts);
    }

    for target in mappings {
        let entry = target.mapping.map(source, exclude_incomplete)?;
        match target.apply_checkbox {
            Some(ref control) => {
                builder.insert_gated(target.target_key.as_str(), entry, control.as_str())?
            }
            None => builder.insert(target.target_key.as_str(), entry)?,
        }
    }

    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MappingItem, Transformation};
    use livefeed_core::LiveFeedError;
    use livefeed_wire::{Message, Toggle};
    use serde_json::json;

    fn mappings() -> Vec<TargetMapping> {
        vec![
            TargetMapping::new(
                "Clock",
                Mapping::new(vec![MappingItem::new("clock", Transformation::AssertString, "time")]),
            ),
            TargetMapping::new(
                "Score",
                Mapping::new(vec![MappingItem::new("home", Transformation::AssertNumber, "home")]),
            )
            .gated_on("ShowScore"),
        ]
    }

    #[test]
    fn test_build_payload() {
        let source = json!({ "clock": "10:00", "home": 3 });
        let payload =
            build_payload(&mappings(), &source, false, Some(LogicalTimestamp::new(42))).unwrap();

        assert_eq!(
            payload,
            json!({
                "__TIMESTAMP": 42,
                "Clock": { "time": "10:00" },
                "Score": { "home": 3, "__APPLY_CHECKBOX": "ShowScore" },
            })
        );
    }

    #[test]
    fn test_payload_parses_back() {
        let source = json!({ "clock": "10:00", "home": 3 });
        let payload =
            build_payload(&mappings(), &source, false, Some(LogicalTimestamp::new(7))).unwrap();
        let message = Message::from_payload(None, payload).unwrap();

        assert_eq!(message.effective_timestamp(), LogicalTimestamp::new(7));
        assert_eq!(message.body.keys().collect::<Vec<_>>(), vec!["Clock", "Score"]);
        match message.body.get("Score") {
            Some(livefeed_wire::BodyItem::Entry(entry)) => {
                assert_eq!(entry.toggle(), Toggle::Control("ShowScore"))
            }
            other => panic!("unexpected item: {:?}", other),
        }
    }

    #[test]
    fn test_no_timestamp() {
        let source = json!({ "clock": "1:00", "home": 0 });
        let payload = build_payload(&mappings(), &source, false, None).unwrap();
        assert!(payload.get("__TIMESTAMP").is_none());
    }

    #[test]
    fn test_reserved_target_key() {
        let mappings = vec![TargetMapping::new("__TIMESTAMP", Mapping::default())];
        let err = build_payload(&mappings, &json!({}), false, None).unwrap_err();
        assert!(matches!(err, MapError::Payload(LiveFeedError::ReservedKey(_))));
    }

    #[test]
    fn test_mapping_error_propagates() {
        let source = json!({ "clock": 5, "home": 0 });
        let err = build_payload(&mappings(), &source, false, None).unwrap_err();
        assert!(matches!(err, MapError::Transformation { .. }));
    }
}
