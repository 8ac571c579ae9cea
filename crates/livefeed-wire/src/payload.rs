//! Outbound payload construction
//!
//! Producers stamp the logical clock once per payload and may gate any entry
//! on a control of its target.

use livefeed_core::{LiveFeedError, LiveFeedResult, LogicalTimestamp, OriginTime};
use serde_json::{Map, Value};

use crate::{is_reserved, ChannelEvent, UpdateEntry, TIMESTAMP_KEY};

/// Builder for a message payload
#[derive(Clone, Debug, Default)]
pub struct PayloadBuilder {
    timestamp: Option<LogicalTimestamp>,
    entries: Map<String, Value>,
}

impl PayloadBuilder {
    pub fn new() -> Self {
        PayloadBuilder::default()
    }

    /// Set the logical clock of this payload
    pub fn timestamp(mut self, ts: LogicalTimestamp) -> Self {
        self.timestamp = Some(ts);
        self
    }

    pub fn set_timestamp(&mut self, ts: LogicalTimestamp) {
        self.timestamp = Some(ts);
    }

    /// Add an entry for `key`. A later entry for the same key replaces the earlier one.
    pub fn insert(&mut self, key: impl Into<String>, entry: UpdateEntry) -> LiveFeedResult<()> {
        let key = key.into();
        if is_reserved(&key) {
            return Err(LiveFeedError::ReservedKey(key));
        }
        self.entries.insert(key, entry.into());
        Ok(())
    }

    /// Add an entry that only applies while `control` is checked on the target
    pub fn insert_gated(
        &mut self,
        key: impl Into<String>,
        entry: UpdateEntry,
        control: impl Into<String>,
    ) -> LiveFeedResult<()> {
        self.insert(key, entry.with_toggle(control))
    }

    /// Builder-style [`PayloadBuilder::insert`]
    pub fn entry(mut self, key: impl Into<String>, entry: UpdateEntry) -> LiveFeedResult<Self> {
        self.insert(key, entry)?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Finish the payload; the clock comes first
    pub fn build(self) -> Value {
        let mut map = Map::with_capacity(self.entries.len() + self.timestamp.is_some() as usize);
        if let Some(ts) = self.timestamp {
            map.insert(TIMESTAMP_KEY.to_owned(), Value::from(ts.value()));
        }
        map.extend(self.entries);
        Value::Object(map)
    }

    /// Wrap the payload in a `message` channel event
    pub fn build_event(self, origin: OriginTime) -> ChannelEvent {
        ChannelEvent::message(origin, self.build())
    }
}
