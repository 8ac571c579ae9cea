//! Field mappings from a flat source record to one update entry

use livefeed_core::LiveFeedError;
use livefeed_wire::UpdateEntry;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::{TransformError, Transformation};

/// Mapping failure
#[derive(Error, Debug)]
pub enum MapError {
    #[error("source is not a map")]
    SourceNotMap,

    #[error("source field {0} does not exist")]
    SourceFieldNonExistent(String),

    #[error("destination field {0} is already present in the output; maybe there's a duplicate?")]
    DestinationFieldAlreadyPresent(String),

    #[error("transformation error for destination field {field}: {source}")]
    Transformation {
        field: String,
        #[source]
        source: TransformError,
    },

    #[error("payload error: {0}")]
    Payload(#[from] LiveFeedError),
}

impl MapError {
    /// The source record has a field with no data yet
    pub fn is_incomplete_data(&self) -> bool {
        matches!(self, MapError::Transformation { source, .. } if source.is_missing_data())
    }
}

/// Ordered list of field mappings producing one entry
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Mapping {
    pub items: Vec<MappingItem>,
}

impl Mapping {
    pub fn new(items: Vec<MappingItem>) -> Self {
        Mapping { items }
    }

    /// Map `source` into an entry.
    ///
    /// With `exclude_incomplete` set, fields whose source is null are left
    /// out instead of failing the whole mapping.
    pub fn map(&self, source: &Value, exclude_incomplete: bool) -> Result<UpdateEntry, MapError> {
        let source = source.as_object().ok_or(MapError::SourceNotMap)?;
        let mut destination = Map::with_capacity(self.items.len());
        for item in &self.items {
            match item.map(source, &mut destination) {
                Ok(()) => {}
                Err(err) if exclude_incomplete && err.is_incomplete_data() => {}
                Err(err) => return Err(err),
            }
        }
        Ok(UpdateEntry::from_fields(destination))
    }
}

/// One source field copied, transformed, into one destination field
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MappingItem {
    pub enabled: bool,
    pub source_field: String,
    pub transformation: Transformation,
    pub destination_field: String,
}

impl Default for MappingItem {
    fn default() -> Self {
        MappingItem {
            enabled: true,
            source_field: String::new(),
            transformation: Transformation::None,
            destination_field: String::new(),
        }
    }
}

impl MappingItem {
    pub fn new(
        source_field: impl Into<String>,
        transformation: Transformation,
        destination_field: impl Into<String>,
    ) -> Self {
        MappingItem {
            enabled: true,
            source_field: source_field.into(),
            transformation,
            destination_field: destination_field.into(),
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn map(
        &self,
        source: &Map<String, Value>,
        destination: &mut Map<String, Value>,
    ) -> Result<(), MapError> {
        if !self.enabled {
            return Ok(());
        }

        let value = source
            .get(&self.source_field)
            .ok_or_else(|| MapError::SourceFieldNonExistent(self.source_field.clone()))?;
        let transformed = self
            .transformation
            .transform(value)
            .map_err(|source| MapError::Transformation {
                field: self.destination_field.clone(),
                source,
            })?;

        if destination.contains_key(&self.destination_field) {
            return Err(MapError::DestinationFieldAlreadyPresent(
                self.destination_field.clone(),
            ));
        }
        destination.insert(self.destination_field.clone(), transformed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn clock_mapping() -> Mapping {
        Mapping::new(vec![
            MappingItem::new("clock", Transformation::TimeMinutes, "min"),
            MappingItem::new("clock", Transformation::TimeSeconds, "sec"),
            MappingItem::new("period", Transformation::AppendOrdinalSuffix, "period"),
        ])
    }

    #[test]
    fn test_map_record() {
        let source = json!({ "clock": "4:07.2", "period": 2, "unused": true });
        let entry = clock_mapping().map(&source, false).unwrap();

        assert_eq!(entry.get("min"), Some(&json!(4)));
        assert_eq!(entry.get("sec"), Some(&json!(7)));
        assert_eq!(entry.get("period"), Some(&json!("2nd")));
        assert_eq!(entry.len(), 3);
    }

    #[test]
    fn test_disabled_item_skipped() {
        let mapping = Mapping::new(vec![
            MappingItem::new("a", Transformation::None, "a"),
            MappingItem::new("missing", Transformation::None, "b").disabled(),
        ]);
        let entry = mapping.map(&json!({ "a": 1 }), false).unwrap();
        assert_eq!(entry.fields().keys().collect::<Vec<_>>(), vec!["a"]);
    }

    #[test]
    fn test_incomplete_data() {
        let source = json!({ "clock": null, "period": 1 });

        let err = clock_mapping().map(&source, false).unwrap_err();
        assert!(err.is_incomplete_data());
        assert_eq!(
            err.to_string(),
            "transformation error for destination field min: unexpected source type: null"
        );

        let entry = clock_mapping().map(&source, true).unwrap();
        assert_eq!(entry.get("min"), None);
        assert_eq!(entry.get("period"), Some(&json!("1st")));
    }

    #[test]
    fn test_exclude_incomplete_keeps_real_errors() {
        let source = json!({ "clock": 12, "period": 1 });
        let err = clock_mapping().map(&source, true).unwrap_err();
        assert!(matches!(err, MapError::Transformation { ref field, .. } if field == "min"));
    }

    #[test]
    fn test_map_errors() {
        let mapping = Mapping::new(vec![
            MappingItem::new("a", Transformation::None, "x"),
            MappingItem::new("b", Transformation::None, "x"),
        ]);

        assert!(matches!(
            mapping.map(&json!([1, 2]), false),
            Err(MapError::SourceNotMap)
        ));
        assert!(matches!(
            mapping.map(&json!({ "a": 1 }), false),
            Err(MapError::SourceFieldNonExistent(ref f)) if f == "b"
        ));
        assert!(matches!(
            mapping.map(&json!({ "a": 1, "b": 2 }), false),
            Err(MapError::DestinationFieldAlreadyPresent(ref f)) if f == "x"
        ));
    }

    #[test]
    fn test_mapping_item_defaults() {
        let item: MappingItem =
            serde_json::from_value(json!({ "source_field": "s", "destination_field": "d" }))
                .unwrap();
        assert!(item.enabled);
        assert_eq!(item.transformation, Transformation::None);
    }
}
