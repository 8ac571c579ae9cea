//! Reference model of the ordering gate
//!
//! A deliberately naive running maximum, used to check the real engine
//! against arbitrary delivery schedules.

/// Naive ordering gate
#[derive(Clone, Debug, Default)]
pub struct OrderingOracle {
    max_seen: Option<i64>,
    accepted: Vec<i64>,
}

impl OrderingOracle {
    pub fn new() -> Self {
        OrderingOracle::default()
    }

    /// Feed one timestamp, returning whether it should be accepted
    pub fn observe(&mut self, ts: i64) -> bool {
        let fresh = match self.max_seen {
            None => true,
            Some(max) => ts >= max,
        };
        if fresh {
            self.max_seen = Some(ts);
            self.accepted.push(ts);
        }
        fresh
    }

    pub fn accepted(&self) -> &[i64] {
        &self.accepted
    }

    pub fn last_accepted(&self) -> Option<i64> {
        self.max_seen
    }
}

/// Timestamps the gate should accept, in delivery order
pub fn expected_accepted(delivered: &[i64]) -> Vec<i64> {
    let mut oracle = OrderingOracle::new();
    for &ts in delivered {
        oracle.observe(ts);
    }
    oracle.accepted
}
