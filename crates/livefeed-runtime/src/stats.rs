//! Runtime statistics, latency samples and the diagnostics feed

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use livefeed_core::ChannelStatus;
use livefeed_state::{ApplyResult, Diagnostic, Severity};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RuntimeStats {
    pub events_received: u64,
    pub undecodable_frames: u64,
    pub messages_accepted: u64,
    pub messages_rejected: u64,
    pub messages_malformed: u64,
    pub entries_applied: u64,
    pub entries_gated: u64,
    pub entries_malformed: u64,
    pub targets_not_found: u64,
    /// Entries applied although their control could not be evaluated
    pub controls_failed_open: u64,
}

impl RuntimeStats {
    pub(crate) fn record_result(&mut self, result: &ApplyResult) {
        self.messages_accepted += 1;
        self.entries_applied += result.applied as u64;
        self.entries_gated += result.gated as u64;
        self.entries_malformed += result.malformed as u64;
        self.targets_not_found += result.not_found as u64;
        self.controls_failed_open += result.failed_open as u64;
    }
}

/// Delay between a message's origin time and its arrival
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LatencySample {
    pub timestamp: Instant,
    pub latency: Duration,
}

/// Latency samples no older than a fixed window
#[derive(Clone, Debug)]
pub struct LatencyWindow {
    window: Duration,
    samples: VecDeque<LatencySample>,
}

impl LatencyWindow {
    pub fn new(window: Duration) -> Self {
        LatencyWindow {
            window,
            samples: VecDeque::new(),
        }
    }

    pub fn record(&mut self, sample: LatencySample) {
        self.samples.push_back(sample);
        self.purge(sample.timestamp);
    }

    /// Drop samples older than the window, measured from `now`
    pub fn purge(&mut self, now: Instant) {
        while let Some(oldest) = self.samples.front() {
            if now.saturating_duration_since(oldest.timestamp) > self.window {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    pub fn samples(&self) -> Vec<LatencySample> {
        self.samples.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn mean(&self) -> Option<Duration> {
        if self.samples.is_empty() {
            return None;
        }
        let total: Duration = self.samples.iter().map(|s| s.latency).sum();
        Some(total / self.samples.len() as u32)
    }

    pub fn max(&self) -> Option<Duration> {
        self.samples.iter().map(|s| s.latency).max()
    }
}

/// Anything worth showing an operator
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FeedDiagnostic {
    /// Non-message status reported by the channel
    Channel {
        status: ChannelStatus,
        detail: Option<String>,
    },
    /// Raised by the state engine
    Engine(Diagnostic),
    /// Inbound frame that is not a channel event
    UndecodableFrame(String),
}

impl FeedDiagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            FeedDiagnostic::Channel {
                status: ChannelStatus::Error,
                ..
            } => Severity::Error,
            FeedDiagnostic::Channel { .. } => Severity::Warning,
            FeedDiagnostic::Engine(diagnostic) => diagnostic.severity(),
            FeedDiagnostic::UndecodableFrame(_) => Severity::Warning,
        }
    }
}

impl fmt::Display for FeedDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedDiagnostic::Channel {
                status,
                detail: Some(detail),
            } => write!(f, "channel {}: {}", status, detail),
            FeedDiagnostic::Channel {
                status,
                detail: None,
            } => write!(f, "channel {}", status),
            FeedDiagnostic::Engine(diagnostic) => diagnostic.fmt(f),
            FeedDiagnostic::UndecodableFrame(reason) => {
                write!(f, "undecodable frame: {}", reason)
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiagnosticRecord {
    pub event: FeedDiagnostic,
    pub timestamp: Instant,
}

/// Most recent diagnostics, oldest dropped first
#[derive(Clone, Debug)]
pub struct DiagnosticFeed {
    capacity: usize,
    records: VecDeque<DiagnosticRecord>,
}

impl DiagnosticFeed {
    pub fn new(capacity: usize) -> Self {
        DiagnosticFeed {
            capacity,
            records: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, event: FeedDiagnostic, timestamp: Instant) {
        if self.capacity == 0 {
            return;
        }
        while self.records.len() >= self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(DiagnosticRecord { event, timestamp });
    }

    pub fn records(&self) -> Vec<DiagnosticRecord> {
        self.records.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(at: Instant, ms: u64) -> LatencySample {
        LatencySample {
            timestamp: at,
            latency: Duration::from_millis(ms),
        }
    }

    #[test]
    fn test_latency_window_purges_old_samples() {
        let start = Instant::now();
        let mut window = LatencyWindow::new(Duration::from_secs(10));

        window.record(sample(start, 40));
        window.record(sample(start + Duration::from_secs(5), 20));
        assert_eq!(window.len(), 2);
        assert_eq!(window.mean(), Some(Duration::from_millis(30)));
        assert_eq!(window.max(), Some(Duration::from_millis(40)));

        window.record(sample(start + Duration::from_secs(12), 10));
        assert_eq!(window.len(), 2);
        assert_eq!(window.max(), Some(Duration::from_millis(20)));

        window.purge(start + Duration::from_secs(30));
        assert!(window.is_empty());
        assert_eq!(window.mean(), None);
    }

    #[test]
    fn test_diagnostic_feed_bounded() {
        let now = Instant::now();
        let mut feed = DiagnosticFeed::new(2);

        for key in ["a", "b", "c"] {
            feed.push(
                FeedDiagnostic::Engine(Diagnostic::TargetNotFound { key: key.into() }),
                now,
            );
        }

        let keys: Vec<_> = feed
            .records()
            .into_iter()
            .map(|r| r.event.to_string())
            .collect();
        assert_eq!(feed.len(), 2);
        assert!(keys[0].contains(" b "));
        assert!(keys[1].contains(" c "));

        feed.clear();
        assert!(feed.is_empty());
    }

    #[test]
    fn test_zero_capacity_feed_keeps_nothing() {
        let mut feed = DiagnosticFeed::new(0);
        feed.push(FeedDiagnostic::UndecodableFrame("x".into()), Instant::now());
        assert!(feed.is_empty());
    }

    #[test]
    fn test_feed_diagnostic_display() {
        let event = FeedDiagnostic::Channel {
            status: ChannelStatus::Error,
            detail: Some("token rejected".into()),
        };
        assert_eq!(event.to_string(), "channel error: token rejected");
        assert_eq!(event.severity(), Severity::Error);
    }

    #[test]
    fn test_record_result() {
        let mut stats = RuntimeStats::default();
        stats.record_result(&ApplyResult {
            applied: 2,
            gated: 1,
            not_found: 1,
            ..Default::default()
        });
        assert_eq!(stats.messages_accepted, 1);
        assert_eq!(stats.entries_applied, 2);
        assert_eq!(stats.entries_gated, 1);
        assert_eq!(stats.targets_not_found, 1);
    }
}
