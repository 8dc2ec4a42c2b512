//! Deterministic workload replay
//!
//! Feeds fixed, per-node usage deltas instead of random steps, so monitors
//! and the controller can be exercised with literal input sequences.

use super::{async_trait, MetricSource};
use crate::fleet::Node;
use crate::models::NodeId;
use anyhow::Result;
use dashmap::DashMap;
use std::collections::VecDeque;
use tracing::trace;

/// Replays scripted usage deltas, one per sample
#[derive(Debug, Default)]
pub struct ReplaySource {
    scripts: DashMap<NodeId, VecDeque<i64>>,
}

impl ReplaySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue deltas for a node; appended after any already queued
    pub fn with_deltas(self, node_id: NodeId, deltas: impl IntoIterator<Item = i64>) -> Self {
        self.scripts
            .entry(node_id)
            .or_insert_with(VecDeque::new)
            .extend(deltas);
        self
    }

    /// Number of deltas still queued for a node
    pub fn remaining(&self, node_id: NodeId) -> usize {
        self.scripts.get(&node_id).map(|s| s.len()).unwrap_or(0)
    }
}

#[async_trait]
impl MetricSource for ReplaySource {
    async fn sample(&self, node: &Node) -> Result<u64> {
        let delta = self
            .scripts
            .get_mut(&node.id())
            .and_then(|mut script| script.pop_front())
            .ok_or_else(|| anyhow::anyhow!("Replay script exhausted for node {}", node.id()))?;
        trace!(
            node_id = node.id(),
            delta,
            remaining = self.remaining(node.id()),
            "Replayed delta"
        );

        Ok(node.update_usage(delta).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replays_in_order() {
        let source = ReplaySource::new().with_deltas(1, [100, -50, 25]);
        let node = Node::new(1, 2048, 1000);

        assert_eq!(source.sample(&node).await.unwrap(), 1100);
        assert_eq!(source.sample(&node).await.unwrap(), 1050);
        assert_eq!(source.sample(&node).await.unwrap(), 1075);
        assert_eq!(source.remaining(1), 0);
    }

    #[tokio::test]
    async fn test_exhausted_script_errors() {
        let source = ReplaySource::new().with_deltas(1, [10]);
        let other = Node::new(2, 1024, 100);

        let err = source.sample(&other).await.unwrap_err();
        assert!(err.to_string().contains("exhausted"));
        assert_eq!(source.remaining(1), 1);
    }
}
