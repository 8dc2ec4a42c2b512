//! Simulated compute nodes and the fleet registry
//!
//! Each node guards its capacity/usage pair with its own mutex so that the
//! node's monitor (usage writer) and the controller (capacity writer) never
//! interleave inside a read-modify-write.

use crate::models::{NodeId, NodeSnapshot, ResizeOutcome};
use crate::predictor::CapacityPolicy;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Lower bound of a generated node's initial capacity
const GENERATED_TOTAL_BASE_MB: u64 = 1024;
/// Spread of a generated node's initial capacity
const GENERATED_TOTAL_SPREAD_MB: u64 = 1024;
/// Lower bound of a generated node's initial usage
const GENERATED_USED_BASE_MB: u64 = 256;

#[derive(Debug, Clone, Copy)]
struct NodeState {
    total_mb: u64,
    used_mb: u64,
}

/// A simulated compute unit with total and used memory
#[derive(Debug)]
pub struct Node {
    id: NodeId,
    state: Mutex<NodeState>,
}

impl Node {
    /// Create a node. Usage above capacity is clamped to capacity.
    pub fn new(id: NodeId, total_mb: u64, used_mb: u64) -> Self {
        Self {
            id,
            state: Mutex::new(NodeState {
                total_mb,
                used_mb: used_mb.min(total_mb),
            }),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub async fn snapshot(&self) -> NodeSnapshot {
        let state = self.state.lock().await;
        NodeSnapshot {
            id: self.id,
            total_mb: state.total_mb,
            used_mb: state.used_mb,
        }
    }

    /// Apply a usage delta, clamped to `[0, total_mb]`. Returns the new usage.
    pub async fn update_usage(&self, delta_mb: i64) -> u64 {
        let mut state = self.state.lock().await;
        let current = i64::try_from(state.used_mb).unwrap_or(i64::MAX);
        let total = i64::try_from(state.total_mb).unwrap_or(i64::MAX);
        let next = current.saturating_add(delta_mb).clamp(0, total);
        // clamp above keeps `next` inside [0, total]
        state.used_mb = next as u64;
        state.used_mb
    }

    /// Set a new capacity derived from `candidate_mb` under `policy`.
    ///
    /// Usage is read under the same guard as the write, so the result is
    /// never below the usage the node carries at decision time.
    pub async fn resize_to(&self, candidate_mb: u64, policy: &CapacityPolicy) -> ResizeOutcome {
        let mut state = self.state.lock().await;
        let previous_mb = state.total_mb;
        let new_mb = policy.clamp(candidate_mb, state.used_mb);
        state.total_mb = new_mb;

        ResizeOutcome {
            previous_mb,
            new_mb,
            used_mb: state.used_mb,
        }
    }
}

/// Registry of all nodes in the simulated fleet
#[derive(Debug, Default)]
pub struct Fleet {
    nodes: DashMap<NodeId, Arc<Node>>,
}

impl Fleet {
    pub fn new(nodes: impl IntoIterator<Item = Node>) -> Self {
        let map = DashMap::new();
        for node in nodes {
            map.insert(node.id(), Arc::new(node));
        }
        Self { nodes: map }
    }

    /// Create `count` nodes with ids `1..=count` and plausible random
    /// capacity/usage pairs.
    pub fn generate(count: u32, rng: &mut fastrand::Rng) -> Self {
        let nodes = (1..=count).map(|id| {
            let total_mb = GENERATED_TOTAL_BASE_MB + rng.u64(..GENERATED_TOTAL_SPREAD_MB);
            let used_mb = GENERATED_USED_BASE_MB + rng.u64(..total_mb / 2);
            debug!(node_id = id, total_mb, used_mb, "Generated node");
            Node::new(id, total_mb, used_mb)
        });
        Self::new(nodes)
    }

    pub fn get(&self, id: NodeId) -> Option<Arc<Node>> {
        self.nodes.get(&id).map(|r| r.value().clone())
    }

    /// All nodes ordered by id
    pub fn list(&self) -> Vec<Arc<Node>> {
        let mut nodes: Vec<_> = self.nodes.iter().map(|r| r.value().clone()).collect();
        nodes.sort_by_key(|n| n.id());
        nodes
    }

    /// Snapshot every node, ordered by id
    pub async fn snapshots(&self) -> Vec<NodeSnapshot> {
        let mut out = Vec::with_capacity(self.len());
        for node in self.list() {
            out.push(node.snapshot().await);
        }
        out
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
