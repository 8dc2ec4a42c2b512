//! Read-only fleet status reporting

use crate::fleet::Fleet;
use crate::models::{NodeId, NodeSnapshot};
use crate::observability::{AutoscalerMetrics, StructuredLogger};
use crate::predictor::predict;
use crate::store::FeatureStore;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

/// Default interval between periodic status reports
pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_secs(3);

/// Status of one node as exposed to operators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeStatus {
    pub id: NodeId,
    pub total_mb: u64,
    pub used_mb: u64,
    pub utilization_percent: f64,
}

impl From<NodeSnapshot> for NodeStatus {
    fn from(snapshot: NodeSnapshot) -> Self {
        Self {
            id: snapshot.id,
            total_mb: snapshot.total_mb,
            used_mb: snapshot.used_mb,
            utilization_percent: snapshot.utilization_percent(),
        }
    }
}

/// Status of the whole fleet, ordered by node id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetStatus {
    pub nodes: Vec<NodeStatus>,
    pub generated_at: i64,
}

impl FleetStatus {
    pub async fn collect(fleet: &Fleet) -> Self {
        Self {
            nodes: fleet
                .snapshots()
                .await
                .into_iter()
                .map(NodeStatus::from)
                .collect(),
            generated_at: chrono::Utc::now().timestamp(),
        }
    }

    /// Human-readable status table
    pub fn render(&self) -> String {
        let mut out = String::from("----- Cluster Status -----\n");
        for node in &self.nodes {
            let _ = writeln!(
                out,
                "Node {:02} | Total:{:5}MB | Used:{:5}MB | Util:{:5.1}%",
                node.id, node.total_mb, node.used_mb, node.utilization_percent
            );
        }
        out
    }
}

/// Node status together with its recent history and current forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDetail {
    #[serde(flatten)]
    pub status: NodeStatus,
    pub history: Vec<f64>,
    pub forecast_mb: f64,
    pub window: usize,
}

impl NodeDetail {
    /// `None` when the fleet has no node with this id
    pub async fn collect(fleet: &Fleet, store: &FeatureStore, id: NodeId) -> Option<Self> {
        let node = fleet.get(id)?;
        let history = store.snapshot(id).await;
        let status = NodeStatus::from(node.snapshot().await);

        Some(Self {
            forecast_mb: predict(&history),
            status,
            history,
            window: store.window(),
        })
    }
}

/// Periodically logs the fleet status and refreshes per-node gauges
pub struct StatusReporter {
    fleet: Arc<Fleet>,
    interval: Duration,
    logger: StructuredLogger,
    metrics: AutoscalerMetrics,
}

impl StatusReporter {
    pub fn new(fleet: Arc<Fleet>, interval: Duration, logger: StructuredLogger) -> Self {
        Self {
            fleet,
            interval,
            logger,
            metrics: AutoscalerMetrics::new(),
        }
    }

    /// Take one report
    pub async fn report(&self) -> Vec<NodeSnapshot> {
        let snapshots = self.fleet.snapshots().await;
        for node in &snapshots {
            self.metrics.set_node_state(node.id, node.total_mb, node.used_mb);
        }
        self.logger.log_fleet_status(&snapshots);
        snapshots
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    debug!("Shutting down status reporter");
                    break;
                }
                _ = ticker.tick() => {
                    self.report().await;
                }
            }
        }
    }
}
