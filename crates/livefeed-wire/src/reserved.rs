//! Reserved control keys
//!
//! Both names are part of the channel contract and must never be used as
//! ordinary target keys or field names.

use livefeed_core::{LiveFeedError, LiveFeedResult, LogicalTimestamp};
use serde_json::{Map, Value};

use crate::value_kind;

/// Message-level logical clock, stored next to the target keys
pub const TIMESTAMP_KEY: &str = "__TIMESTAMP";

/// Per-entry toggle reference naming a boolean field of the target
pub const APPLY_CHECKBOX_KEY: &str = "__APPLY_CHECKBOX";

/// Is `key` one of the reserved control keys?
#[inline]
pub fn is_reserved(key: &str) -> bool {
    key == TIMESTAMP_KEY || key == APPLY_CHECKBOX_KEY
}

/// Read a JSON number as a whole number of milliseconds.
/// Fractional values are truncated; non-finite or non-numeric values yield `None`.
pub fn number_as_i64(value: &Value) -> Option<i64> {
    if let Some(v) = value.as_i64() {
        return Some(v);
    }
    if let Some(v) = value.as_u64() {
        return Some(v.min(i64::MAX as u64) as i64);
    }
    value
        .as_f64()
        .filter(|f| f.is_finite())
        .map(|f| f as i64)
}

/// Split the logical timestamp out of a message body.
///
/// Returns the timestamp (`None` if absent or null) and the remaining keys in
/// their original order.
pub fn split_timestamp(
    body: Map<String, Value>,
) -> LiveFeedResult<(Option<LogicalTimestamp>, Map<String, Value>)> {
    let mut timestamp = None;
    let mut remaining = Map::with_capacity(body.len().saturating_sub(1));

    for (key, value) in body {
        if key == TIMESTAMP_KEY {
            timestamp = Some(value);
        } else {
            remaining.insert(key, value);
        }
    }

    let timestamp = match timestamp {
        None | Some(Value::Null) => None,
        Some(value) => Some(LogicalTimestamp::new(number_as_i64(&value).ok_or_else(|| {
            LiveFeedError::InvalidTimestamp(format!("expected number, got {}", value_kind(&value)))
        })?)),
    };

    Ok((timestamp, remaining))
}
