//! Workload sources for the simulated fleet
//!
//! A `MetricSource` advances a node's memory usage by one sample. The
//! per-node `NodeMonitor` drives a source on a fixed cadence and reports
//! each sample to the controller as a `MetricEvent`.

mod monitor;
mod replay;
mod synthetic;

pub use monitor::{spawn_monitors, MonitorConfig, NodeMonitor, DEFAULT_SAMPLE_INTERVAL};
pub use replay::ReplaySource;
pub use synthetic::{SyntheticWorkload, DEFAULT_MAX_STEP_MB};

use crate::fleet::Node;
use anyhow::Result;

pub use async_trait::async_trait;

/// Trait for usage sample producers
#[async_trait]
pub trait MetricSource: Send + Sync {
    /// Advance the node's workload by one step and return its new usage in MB
    async fn sample(&self, node: &Node) -> Result<u64>;
}
