//! End-to-end scenarios
//!
//! Behaviour of a whole feed as seen from the host graph:
//! - Stale and resent messages
//! - Toggle gating and fail-open controls
//! - Per-key isolation
//! - Monotonic application under chaos

use livefeed_core::{LiveFeedResult, LogicalTimestamp};
use livefeed_wire::{PayloadBuilder, UpdateEntry};

use crate::chaos::ChaosConfig;
use crate::harness::{run_chaos, ChaosRunResult};

/// Monotonicity check result
#[derive(Clone, Debug)]
pub struct MonotonicityReport {
    pub runs: usize,
    pub failures: Vec<u64>,
    pub messages_rejected: u64,
}

impl MonotonicityReport {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Push shuffled timestamps through one chaos channel per seed
pub fn check_monotonicity(
    config: &ChaosConfig,
    seeds: impl IntoIterator<Item = u64>,
    messages: i64,
) -> LiveFeedResult<MonotonicityReport> {
    let stamps: Vec<i64> = (0..messages).collect();
    let mut report = MonotonicityReport {
        runs: 0,
        failures: Vec::new(),
        messages_rejected: 0,
    };

    for seed in seeds {
        let result: ChaosRunResult = run_chaos(config.clone(), seed, &stamps)?;
        report.runs += 1;
        report.messages_rejected += result.runtime.messages_rejected;
        if !(result.is_monotonic() && result.matches_oracle()) {
            report.failures.push(seed);
        }
    }
    Ok(report)
}

/// Body with several keys under one timestamp
pub fn multi_key_payload(
    ts: i64,
    entries: Vec<(&str, UpdateEntry)>,
) -> LiveFeedResult<serde_json::Value> {
    let mut builder = PayloadBuilder::new().timestamp(LogicalTimestamp::new(ts));
    for (key, entry) in entries {
        builder.insert(key, entry)?;
    }
    Ok(builder.build())
}
