//! Time primitives for LiveFeed
//!
//! Two unrelated clocks show up on the wire:
//! - Logical timestamp: ordering token embedded in a message body
//! - Origin time: transport-level send time, milliseconds since the Unix epoch

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Logical timestamp used to detect out-of-order resends
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct LogicalTimestamp(pub i64);

impl LogicalTimestamp {
    /// Timestamp assumed for messages that carry none
    pub const ZERO: LogicalTimestamp = LogicalTimestamp(0);
    /// Below every legitimate timestamp
    pub const MIN: LogicalTimestamp = LogicalTimestamp(i64::MIN);
    pub const MAX: LogicalTimestamp = LogicalTimestamp(i64::MAX);

    #[inline]
    pub fn new(value: i64) -> Self {
        LogicalTimestamp(value)
    }

    #[inline]
    pub fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Debug for LogicalTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            LogicalTimestamp::MIN => write!(f, "Lts(-inf)"),
            LogicalTimestamp(v) => write!(f, "Lts({})", v),
        }
    }
}

impl fmt::Display for LogicalTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for LogicalTimestamp {
    fn from(value: i64) -> Self {
        LogicalTimestamp(value)
    }
}

/// Origin time (`data.ts`) stamped by the sender
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct OriginTime(pub i64);

impl OriginTime {
    pub const EPOCH: OriginTime = OriginTime(0);

    #[inline]
    pub fn from_millis(millis: i64) -> Self {
        OriginTime(millis)
    }

    #[inline]
    pub fn as_millis(self) -> i64 {
        self.0
    }

    /// Current wall clock as an origin time
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis().min(i64::MAX as u128) as i64)
            .unwrap_or(0);
        OriginTime(millis)
    }

    /// Delay between this origin time and `now`, zero if `now` is earlier
    #[inline]
    pub fn latency_until(self, now: OriginTime) -> Duration {
        let diff = now.0.saturating_sub(self.0);
        if diff > 0 {
            Duration::from_millis(diff as u64)
        } else {
            Duration::ZERO
        }
    }
}

impl fmt::Debug for OriginTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Origin({}ms)", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_logical_timestamp_ordering() {
        assert!(LogicalTimestamp::MIN < LogicalTimestamp::ZERO);
        assert!(LogicalTimestamp::new(3) < LogicalTimestamp::new(5));
        assert_eq!(LogicalTimestamp::from(5), LogicalTimestamp::new(5));
        assert_eq!(format!("{:?}", LogicalTimestamp::MIN), "Lts(-inf)");
    }

    #[test]
    fn test_latency_until() {
        let sent = OriginTime::from_millis(1_000);
        assert_eq!(
            sent.latency_until(OriginTime::from_millis(1_250)),
            Duration::from_millis(250)
        );
        // Sender clock ahead of ours
        assert_eq!(sent.latency_until(OriginTime::from_millis(900)), Duration::ZERO);
    }

    #[test]
    fn test_now_is_after_epoch() {
        assert!(OriginTime::now() > OriginTime::EPOCH);
    }

    proptest! {
        #[test]
        fn latency_never_panics(sent in any::<i64>(), now in any::<i64>()) {
            let latency = OriginTime(sent).latency_until(OriginTime(now));
            if now <= sent {
                prop_assert_eq!(latency, Duration::ZERO);
            }
        }
    }
}
