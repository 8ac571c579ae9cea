//! Channel event envelope
//!
//! ```text
//! { status: "open" | "message" | "error" | "close",
//!   data: { ts: number, payload: { "__TIMESTAMP": number, <key>: { ... } } } }
//! ```

use bytes::Bytes;
use livefeed_core::{ChannelStatus, LiveFeedError, LiveFeedResult, OriginTime};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{number_as_i64, Message};

/// Data packet carried by a channel event
#[derive(Clone, Debug, PartialEq)]
pub struct DataPacket {
    /// Origin timestamp (`data.ts`)
    pub ts: Option<OriginTime>,
    /// Raw message body (`data.payload`)
    pub payload: Value,
}

/// One callback invocation of the channel
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelEvent {
    pub status: ChannelStatus,
    pub data: Option<DataPacket>,
}

#[derive(Serialize, Deserialize)]
struct WireEvent {
    status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl ChannelEvent {
    /// Status-only event
    pub fn new(status: ChannelStatus) -> Self {
        ChannelEvent { status, data: None }
    }

    /// `message` event carrying a payload
    pub fn message(ts: OriginTime, payload: Value) -> Self {
        ChannelEvent {
            status: ChannelStatus::Message,
            data: Some(DataPacket {
                ts: Some(ts),
                payload,
            }),
        }
    }

    /// Parse an event from its JSON encoding
    pub fn decode(buf: &[u8]) -> LiveFeedResult<Self> {
        let wire: WireEvent = serde_json::from_slice(buf)
            .map_err(|e| LiveFeedError::InvalidWireFormat(e.to_string()))?;

        let status = ChannelStatus::from_tag(&wire.status)
            .ok_or_else(|| LiveFeedError::UnknownStatus(wire.status.clone()))?;

        let data = match wire.data {
            None | Some(Value::Null) => None,
            Some(Value::Object(mut obj)) => {
                let ts = match obj.remove("ts") {
                    None | Some(Value::Null) => None,
                    Some(value) => Some(OriginTime::from_millis(number_as_i64(&value).ok_or_else(
                        || LiveFeedError::InvalidWireFormat("data.ts is not a number".into()),
                    )?)),
                };
                let payload = obj.remove("payload").unwrap_or(Value::Null);
                Some(DataPacket { ts, payload })
            }
            Some(other) if !status.is_message() => Some(DataPacket {
                ts: None,
                payload: other,
            }),
            Some(_) => {
                return Err(LiveFeedError::InvalidWireFormat(
                    "message data is not an object".into(),
                ))
            }
        };

        Ok(ChannelEvent { status, data })
    }

    /// Serialize to the JSON encoding accepted by [`ChannelEvent::decode`]
    pub fn encode(&self) -> LiveFeedResult<Bytes> {
        let data = self.data.as_ref().map(|packet| {
            let mut obj = Map::with_capacity(2);
            if let Some(ts) = packet.ts {
                obj.insert("ts".to_owned(), Value::from(ts.as_millis()));
            }
            obj.insert("payload".to_owned(), packet.payload.clone());
            Value::Object(obj)
        });

        let wire = WireEvent {
            status: self.status.as_tag().to_owned(),
            data,
        };

        serde_json::to_vec(&wire)
            .map(Bytes::from)
            .map_err(|e| LiveFeedError::InvalidWireFormat(e.to_string()))
    }

    /// Convert a `message` event into an update message
    pub fn into_message(self) -> LiveFeedResult<Message> {
        if !self.status.is_message() {
            return Err(LiveFeedError::InvalidWireFormat(format!(
                "{} event carries no message",
                self.status
            )));
        }
        let packet = self
            .data
            .ok_or_else(|| LiveFeedError::InvalidWireFormat("message event without data".into()))?;
        Message::from_payload(packet.ts, packet.payload)
    }

    /// Short description of the attached data, for status diagnostics
    pub fn detail(&self) -> Option<String> {
        self.data.as_ref().and_then(|packet| match &packet.payload {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        })
    }
}
