//! Chaos channel for LiveFeed
//!
//! Simulates a hostile delivery path between producer and feed:
//! - Jitter
//! - Frame loss
//! - Reordering
//! - Duplication

use std::collections::VecDeque;
use std::time::Duration;

use bytes::Bytes;
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Jitter distribution type
#[derive(Clone, Debug)]
pub enum JitterDistribution {
    /// Uniform distribution
    Uniform { min_ms: u32, max_ms: u32 },
    /// Pareto distribution (heavy tail)
    Pareto { scale_ms: f64, shape: f64 },
}

impl JitterDistribution {
    /// Sample a jitter value
    pub fn sample(&self, rng: &mut StdRng) -> Duration {
        match self {
            JitterDistribution::Uniform { min_ms, max_ms } => {
                let dist = Uniform::new_inclusive(*min_ms, *max_ms);
                Duration::from_millis(dist.sample(rng) as u64)
            }
            JitterDistribution::Pareto { scale_ms, shape } => {
                let u: f64 = rng.gen_range(f64::EPSILON..1.0);
                let value = scale_ms / u.powf(1.0 / shape);
                Duration::from_millis(value.min(1000.0) as u64) // Cap at 1 second
            }
        }
    }
}

/// Channel chaos configuration
#[derive(Clone, Debug)]
pub struct ChaosConfig {
    pub base_latency: Duration,
    pub jitter: JitterDistribution,
    /// Frame loss rate (0.0 - 1.0)
    pub loss_rate: f64,
    pub reorder_prob: f64,
    /// Max frames a reordered frame may overtake
    pub reorder_depth: u32,
    pub duplicate_prob: f64,
}

impl Default for ChaosConfig {
    fn default() -> Self {
        ChaosConfig {
            base_latency: Duration::from_millis(50),
            jitter: JitterDistribution::Uniform {
                min_ms: 0,
                max_ms: 50,
            },
            loss_rate: 0.01,
            reorder_prob: 0.05,
            reorder_depth: 3,
            duplicate_prob: 0.01,
        }
    }
}

impl ChaosConfig {
    /// In-order, lossless delivery
    pub fn perfect() -> Self {
        ChaosConfig {
            base_latency: Duration::from_millis(10),
            jitter: JitterDistribution::Uniform { min_ms: 0, max_ms: 0 },
            loss_rate: 0.0,
            reorder_prob: 0.0,
            reorder_depth: 0,
            duplicate_prob: 0.0,
        }
    }

    /// Flaky mobile connection
    pub fn poor() -> Self {
        ChaosConfig {
            base_latency: Duration::from_millis(100),
            jitter: JitterDistribution::Pareto {
                scale_ms: 50.0,
                shape: 1.5,
            },
            loss_rate: 0.05,
            reorder_prob: 0.1,
            reorder_depth: 5,
            duplicate_prob: 0.05,
        }
    }

    /// Heavy reordering and resends
    pub fn hostile() -> Self {
        ChaosConfig {
            base_latency: Duration::from_millis(200),
            jitter: JitterDistribution::Pareto {
                scale_ms: 100.0,
                shape: 1.2,
            },
            loss_rate: 0.15,
            reorder_prob: 0.3,
            reorder_depth: 10,
            duplicate_prob: 0.2,
        }
    }
}

/// Frame in flight
#[derive(Clone, Debug)]
pub struct ChaosFrame {
    pub data: Bytes,
    pub delivery_time: Duration,
    pub send_time: Duration,
    /// Send order, shared by duplicates
    pub seq: u64,
}

#[derive(Clone, Debug, Default)]
pub struct ChaosStats {
    pub frames_sent: u64,
    pub frames_delivered: u64,
    pub frames_lost: u64,
    pub frames_reordered: u64,
    pub frames_duplicated: u64,
    pub max_latency_ms: u64,
}

impl ChaosStats {
    pub fn loss_rate(&self) -> f64 {
        if self.frames_sent == 0 {
            0.0
        } else {
            self.frames_lost as f64 / self.frames_sent as f64
        }
    }
}

/// Seeded chaos channel
pub struct ChaosChannel {
    config: ChaosConfig,
    rng: StdRng,
    in_flight: VecDeque<ChaosFrame>,
    current_time: Duration,
    next_seq: u64,
    stats: ChaosStats,
}

impl ChaosChannel {
    pub fn new(config: ChaosConfig, seed: u64) -> Self {
        ChaosChannel {
            config,
            rng: StdRng::seed_from_u64(seed),
            in_flight: VecDeque::new(),
            current_time: Duration::ZERO,
            next_seq: 0,
            stats: ChaosStats::default(),
        }
    }

    /// Send a frame into the channel
    pub fn send(&mut self, data: Bytes) {
        self.stats.frames_sent += 1;
        let seq = self.next_seq;
        self.next_seq += 1;

        if self.rng.gen::<f64>() < self.config.loss_rate {
            self.stats.frames_lost += 1;
            return;
        }

        let latency = self.config.base_latency + self.config.jitter.sample(&mut self.rng);
        let frame = ChaosFrame {
            data,
            delivery_time: self.current_time + latency,
            send_time: self.current_time,
            seq,
        };

        if self.rng.gen::<f64>() < self.config.duplicate_prob {
            let mut dup = frame.clone();
            dup.delivery_time += self.config.jitter.sample(&mut self.rng);
            self.in_flight.push_back(dup);
            self.stats.frames_duplicated += 1;
        }

        if self.rng.gen::<f64>() < self.config.reorder_prob && !self.in_flight.is_empty() {
            let depth = self.config.reorder_depth.min(self.in_flight.len() as u32);
            let pos = self.rng.gen_range(0..=depth) as usize;
            let insert_pos = self.in_flight.len().saturating_sub(pos);
            self.in_flight.insert(insert_pos, frame);
            self.stats.frames_reordered += 1;
        } else {
            self.in_flight.push_back(frame);
        }
    }

    /// Advance time and collect delivered frames, in delivery order
    pub fn tick(&mut self, dt: Duration) -> Vec<ChaosFrame> {
        self.current_time += dt;

        let mut delivered = Vec::new();
        while let Some(frame) = self.in_flight.front() {
            if frame.delivery_time > self.current_time {
                break;
            }
            let Some(frame) = self.in_flight.pop_front() else {
                break;
            };
            let latency = (frame.delivery_time.saturating_sub(frame.send_time)).as_millis() as u64;
            self.stats.frames_delivered += 1;
            self.stats.max_latency_ms = self.stats.max_latency_ms.max(latency);
            delivered.push(frame);
        }
        delivered
    }

    /// Deliver everything still in flight
    pub fn flush(&mut self) -> Vec<ChaosFrame> {
        let mut delivered = Vec::new();
        while !self.in_flight.is_empty() {
            delivered.extend(self.tick(Duration::from_millis(100)));
        }
        delivered
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn stats(&self) -> &ChaosStats {
        &self.stats
    }

    pub fn current_time(&self) -> Duration {
        self.current_time
    }
}
