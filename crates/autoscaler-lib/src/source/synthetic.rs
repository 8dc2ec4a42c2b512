//! Capped random-walk workload

use super::{async_trait, MetricSource};
use crate::fleet::Node;
use anyhow::Result;
use std::sync::Mutex;

/// Default largest per-sample usage change (in either direction)
pub const DEFAULT_MAX_STEP_MB: u64 = 40;

/// Random walk of usage: each sample moves by a uniform step in
/// `[-max_step_mb, max_step_mb]`, capped by the node to `[0, capacity]`.
#[derive(Debug)]
pub struct SyntheticWorkload {
    rng: Mutex<fastrand::Rng>,
    max_step_mb: u64,
}

impl SyntheticWorkload {
    /// Seed with `fastrand::Rng::with_seed` for reproducible runs
    pub fn new(rng: fastrand::Rng) -> Self {
        Self {
            rng: Mutex::new(rng),
            max_step_mb: DEFAULT_MAX_STEP_MB,
        }
    }

    pub fn with_max_step(mut self, max_step_mb: u64) -> Self {
        self.max_step_mb = max_step_mb;
        self
    }

    fn next_delta(&self) -> i64 {
        let step = i64::try_from(self.max_step_mb).unwrap_or(i64::MAX);
        // Held only for one draw, never across an await
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        rng.i64(-step..=step)
    }
}

#[async_trait]
impl MetricSource for SyntheticWorkload {
    async fn sample(&self, node: &Node) -> Result<u64> {
        Ok(node.update_usage(self.next_delta()).await)
    }
}
