//! Feed harness
//!
//! Drives a [`FeedCore`] against an in-memory graph, optionally through a
//! [`ChaosChannel`], and reports what each target actually received.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use livefeed_core::{LiveFeedResult, LogicalTimestamp, OriginTime};
use livefeed_runtime::{FeedCore, Inbound, LiveFeedConfig, RuntimeStats};
use livefeed_state::{EngineState, MemoryGraph, MemoryNode};
use livefeed_wire::{PayloadBuilder, UpdateEntry};

use crate::chaos::{ChaosChannel, ChaosConfig, ChaosStats};
use crate::oracle::expected_accepted;

/// Encode a single-key message frame
pub fn message_frame(ts: i64, key: &str, entry: UpdateEntry) -> LiveFeedResult<Bytes> {
    PayloadBuilder::new()
        .timestamp(LogicalTimestamp::new(ts))
        .entry(key, entry)?
        .build_event(OriginTime::now())
        .encode()
}

/// Synchronous feed over a memory graph
pub struct FeedHarness {
    graph: Arc<MemoryGraph>,
    core: FeedCore,
}

impl FeedHarness {
    pub fn new() -> Self {
        Self::with_config(&LiveFeedConfig::new("harness"))
    }

    pub fn with_config(config: &LiveFeedConfig) -> Self {
        FeedHarness {
            graph: Arc::new(MemoryGraph::new()),
            core: FeedCore::new(config),
        }
    }

    pub fn graph(&self) -> &Arc<MemoryGraph> {
        &self.graph
    }

    pub fn add_node(&self, name: &str) -> Arc<MemoryNode> {
        self.graph.add(name)
    }

    pub fn deliver(&mut self, inbound: impl Into<Inbound>) {
        self.core.handle(inbound.into(), self.graph.as_ref());
    }

    pub fn stats(&self) -> &RuntimeStats {
        self.core.stats()
    }

    pub fn engine_state(&self) -> EngineState {
        self.core.engine_state()
    }
}

impl Default for FeedHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of pushing a timestamp sequence through a chaos channel
#[derive(Clone, Debug)]
pub struct ChaosRunResult {
    /// Logical timestamps in the order the feed received them
    pub delivered: Vec<i64>,
    /// Logical timestamps of the entries the target received
    pub applied: Vec<i64>,
    pub chaos: ChaosStats,
    pub runtime: RuntimeStats,
    pub last_accepted: Option<LogicalTimestamp>,
}

impl ChaosRunResult {
    /// Did the target receive exactly what a running-max gate admits?
    pub fn matches_oracle(&self) -> bool {
        self.applied == expected_accepted(&self.delivered)
    }

    /// Applied timestamps never decrease
    pub fn is_monotonic(&self) -> bool {
        self.applied.windows(2).all(|w| w[0] <= w[1])
    }
}

/// Send `stamps` for one key through a seeded chaos channel into a feed
pub fn run_chaos(config: ChaosConfig, seed: u64, stamps: &[i64]) -> LiveFeedResult<ChaosRunResult> {
    let mut harness = FeedHarness::new();
    let node = harness.add_node("target");
    let mut channel = ChaosChannel::new(config, seed);

    for &ts in stamps {
        channel.send(message_frame(ts, "target", UpdateEntry::new().with_field("ts", ts))?);
    }

    let mut delivered = Vec::new();
    let mut frames = Vec::new();
    while channel.in_flight() > 0 {
        frames.extend(channel.tick(Duration::from_millis(10)));
    }
    for frame in frames {
        delivered.push(stamps[frame.seq as usize]);
        harness.deliver(frame.data);
    }

    let applied = node
        .applied()
        .iter()
        .filter_map(|entry| entry.get("ts").and_then(|v| v.as_i64()))
        .collect();

    Ok(ChaosRunResult {
        delivered,
        applied,
        chaos: channel.stats().clone(),
        runtime: harness.stats().clone(),
        last_accepted: harness.engine_state().last_accepted(),
    })
}
