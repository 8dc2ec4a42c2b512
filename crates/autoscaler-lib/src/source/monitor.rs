//! Per-node monitoring loop
//!
//! Each node gets exactly one monitor task. It samples the node's workload
//! on a fixed interval and forwards the resulting usage to the controller.

use super::MetricSource;
use crate::fleet::{Fleet, Node};
use crate::models::MetricEvent;
use crate::observability::AutoscalerMetrics;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Default sampling cadence of a node monitor
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_millis(300);

/// Configuration for node monitors
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Interval between samples (default: 300ms)
    pub interval: Duration,
    /// Capacity of the shared metric event channel
    pub buffer_size: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_SAMPLE_INTERVAL,
            buffer_size: 1024,
        }
    }
}

/// Sampling loop for a single node
pub struct NodeMonitor {
    node: Arc<Node>,
    source: Arc<dyn MetricSource>,
    interval: Duration,
    events_tx: mpsc::Sender<MetricEvent>,
    metrics: AutoscalerMetrics,
}

impl NodeMonitor {
    pub fn new(
        node: Arc<Node>,
        source: Arc<dyn MetricSource>,
        interval: Duration,
        events_tx: mpsc::Sender<MetricEvent>,
    ) -> Self {
        Self {
            node,
            source,
            interval,
            events_tx,
            metrics: AutoscalerMetrics::new(),
        }
    }

    /// Run until the shutdown signal fires or the controller goes away
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let node_id = self.node.id();
        debug!(
            node_id,
            interval_ms = self.interval.as_millis() as u64,
            "Starting node monitor"
        );

        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    debug!(node_id, "Shutting down node monitor");
                    break;
                }
                _ = ticker.tick() => {
                    let used_mb = match self.source.sample(&self.node).await {
                        Ok(used_mb) => used_mb,
                        Err(e) => {
                            self.metrics.inc_sample_errors();
                            debug!(node_id, error = %e, "Failed to sample node");
                            continue;
                        }
                    };

                    // A full channel must not keep the monitor from seeing shutdown
                    tokio::select! {
                        biased;
                        _ = shutdown.recv() => {
                            debug!(node_id, "Shutting down node monitor");
                            break;
                        }
                        sent = self.events_tx.send(MetricEvent::new(node_id, used_mb)) => {
                            if sent.is_err() {
                                info!(node_id, "Metric channel closed, stopping node monitor");
                                break;
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Spawn one monitor per fleet node, all feeding a single event channel
pub fn spawn_monitors(
    fleet: &Fleet,
    source: Arc<dyn MetricSource>,
    config: &MonitorConfig,
    shutdown: &broadcast::Sender<()>,
) -> (Vec<JoinHandle<()>>, mpsc::Receiver<MetricEvent>) {
    let (events_tx, events_rx) = mpsc::channel(config.buffer_size.max(1));

    let handles = fleet
        .list()
        .into_iter()
        .map(|node| {
            let monitor =
                NodeMonitor::new(node, source.clone(), config.interval, events_tx.clone());
            tokio::spawn(monitor.run(shutdown.subscribe()))
        })
        .collect();

    (handles, events_rx)
}
