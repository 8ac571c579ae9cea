//! Update messages
//!
//! A message is the unit the ordering filter accepts or rejects. Its body
//! maps target keys to update entries.

use livefeed_core::{LiveFeedError, LiveFeedResult, LogicalTimestamp, OriginTime};
use serde_json::{Map, Value};

use crate::{split_timestamp, APPLY_CHECKBOX_KEY};

/// Observable state of a target: field name to value
pub type StateMap = Map<String, Value>;

/// Human-readable name of a JSON value's type
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Array(_) => "array",
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Object(_) => "object",
    }
}

/// Toggle reference carried by an entry
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Toggle<'a> {
    /// No `__APPLY_CHECKBOX` field
    Absent,
    /// Names a control field of the target
    Control(&'a str),
    /// Present but not a string
    Malformed(&'a Value),
}

/// Fields to write into one target
#[derive(Clone, Debug, PartialEq, Default)]
pub struct UpdateEntry(Map<String, Value>);

impl UpdateEntry {
    pub fn new() -> Self {
        UpdateEntry(Map::new())
    }

    pub fn from_fields(fields: Map<String, Value>) -> Self {
        UpdateEntry(fields)
    }

    /// Builder-style field insertion
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// Gate this entry on a boolean control of the target
    pub fn with_toggle(mut self, control: impl Into<String>) -> Self {
        self.0
            .insert(APPLY_CHECKBOX_KEY.to_owned(), Value::String(control.into()));
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Inspect the toggle reference
    pub fn toggle(&self) -> Toggle<'_> {
        match self.0.get(APPLY_CHECKBOX_KEY) {
            None => Toggle::Absent,
            Some(Value::String(control)) => Toggle::Control(control),
            Some(other) => Toggle::Malformed(other),
        }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for UpdateEntry {
    fn from(fields: Map<String, Value>) -> Self {
        UpdateEntry(fields)
    }
}

impl From<UpdateEntry> for Value {
    fn from(entry: UpdateEntry) -> Self {
        Value::Object(entry.0)
    }
}

/// One keyed item of a message body
#[derive(Clone, Debug, PartialEq)]
pub enum BodyItem {
    Entry(UpdateEntry),
    /// Value under a target key that is not an object
    Malformed(Value),
}

/// Message body with the logical timestamp already removed
#[derive(Clone, Debug, PartialEq, Default)]
pub struct MessageBody {
    items: Vec<(String, BodyItem)>,
}

impl MessageBody {
    pub fn new() -> Self {
        MessageBody::default()
    }

    /// Classify every value of a JSON object, keeping key order
    pub fn from_map(map: Map<String, Value>) -> Self {
        let items = map
            .into_iter()
            .map(|(key, value)| {
                let item = match value {
                    Value::Object(fields) => BodyItem::Entry(UpdateEntry::from_fields(fields)),
                    other => BodyItem::Malformed(other),
                };
                (key, item)
            })
            .collect();
        MessageBody { items }
    }

    pub fn push(&mut self, key: impl Into<String>, entry: UpdateEntry) {
        self.items.push((key.into(), BodyItem::Entry(entry)));
    }

    pub fn get(&self, key: &str) -> Option<&BodyItem> {
        self.items.iter().find(|(k, _)| k == key).map(|(_, item)| item)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BodyItem)> {
        self.items.iter().map(|(k, item)| (k.as_str(), item))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl IntoIterator for MessageBody {
    type Item = (String, BodyItem);
    type IntoIter = std::vec::IntoIter<(String, BodyItem)>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

/// Inbound update message
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    /// Sender wall clock (`data.ts`), if present
    pub origin: Option<OriginTime>,
    /// Logical clock extracted from `__TIMESTAMP`
    pub logical_ts: Option<LogicalTimestamp>,
    pub body: MessageBody,
}

impl Message {
    pub fn new(logical_ts: Option<LogicalTimestamp>, body: MessageBody) -> Self {
        Message {
            origin: None,
            logical_ts,
            body,
        }
    }

    /// Build a message from a raw `data.payload` value
    pub fn from_payload(origin: Option<OriginTime>, payload: Value) -> LiveFeedResult<Self> {
        let Value::Object(map) = payload else {
            return Err(LiveFeedError::PayloadNotObject);
        };
        let (logical_ts, remaining) = split_timestamp(map)?;
        Ok(Message {
            origin,
            logical_ts,
            body: MessageBody::from_map(remaining),
        })
    }

    pub fn with_origin(mut self, origin: OriginTime) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Timestamp used for ordering; a missing clock counts as zero
    #[inline]
    pub fn effective_timestamp(&self) -> LogicalTimestamp {
        self.logical_ts.unwrap_or(LogicalTimestamp::ZERO)
    }
}
