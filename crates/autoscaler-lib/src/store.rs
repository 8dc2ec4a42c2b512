//! Bounded per-node usage history
//!
//! Keeps the most recent `window` usage samples for each node, oldest first.
//! A single mutex covers the whole map; it is held only for the map access
//! itself, never across a forecast.

use crate::error::{ConfigError, ConfigResult};
use crate::models::NodeId;
use std::collections::{HashMap, VecDeque};
use tokio::sync::Mutex;

/// Default number of samples retained per node
pub const DEFAULT_WINDOW_SIZE: usize = 10;

/// Sliding-window time-series cache keyed by node id
#[derive(Debug)]
pub struct FeatureStore {
    window: usize,
    series: Mutex<HashMap<NodeId, VecDeque<f64>>>,
}

impl FeatureStore {
    pub fn new(window: usize) -> ConfigResult<Self> {
        if window == 0 {
            return Err(ConfigError::ZeroWindow);
        }
        Ok(Self {
            window,
            series: Mutex::new(HashMap::new()),
        })
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Append a sample, evicting the oldest entries beyond the window
    pub async fn record(&self, node_id: NodeId, sample: f64) {
        let mut series = self.series.lock().await;
        let samples = series
            .entry(node_id)
            .or_insert_with(|| VecDeque::with_capacity(self.window + 1));
        samples.push_back(sample);
        while samples.len() > self.window {
            samples.pop_front();
        }
    }

    /// Copy of a node's history, oldest first. Empty if nothing was recorded.
    pub async fn snapshot(&self, node_id: NodeId) -> Vec<f64> {
        let series = self.series.lock().await;
        series
            .get(&node_id)
            .map(|s| s.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Number of samples currently held for a node
    pub async fn len(&self, node_id: NodeId) -> usize {
        let series = self.series.lock().await;
        series.get(&node_id).map(VecDeque::len).unwrap_or(0)
    }

    /// Number of nodes with at least one sample
    pub async fn node_count(&self) -> usize {
        self.series.lock().await.len()
    }
}
