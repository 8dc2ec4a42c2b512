//! Observability infrastructure for the autoscaler
//!
//! Provides:
//! - Prometheus metrics (samples, resize decisions, pass latency, per-node capacity/usage)
//! - Structured JSON logging with tracing

use crate::models::{NodeId, NodeSnapshot, ResizeDecision, ResizeDirection};
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, register_int_gauge,
    register_int_gauge_vec, Histogram, IntCounter, IntCounterVec, IntGauge, IntGaugeVec,
};
use std::sync::OnceLock;
use tracing::{debug, info};

/// Histogram buckets for resize pass latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5,
];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<AutoscalerMetricsInner> = OnceLock::new();

struct AutoscalerMetricsInner {
    samples_recorded: IntCounter,
    sample_errors: IntCounter,
    resize_decisions: IntCounterVec,
    resize_pass_latency_seconds: Histogram,
    node_capacity_mb: IntGaugeVec,
    node_used_mb: IntGaugeVec,
    nodes_monitored: IntGauge,
}

impl AutoscalerMetricsInner {
    fn new() -> Self {
        Self {
            samples_recorded: register_int_counter!(
                "autoscaler_samples_recorded_total",
                "Usage samples recorded into the feature store"
            )
            .expect("Failed to register samples_recorded"),

            sample_errors: register_int_counter!(
                "autoscaler_sample_errors_total",
                "Usage samples a metric source failed to produce"
            )
            .expect("Failed to register sample_errors"),

            resize_decisions: register_int_counter_vec!(
                "autoscaler_resize_decisions_total",
                "Resize decisions by direction",
                &["direction"]
            )
            .expect("Failed to register resize_decisions"),

            resize_pass_latency_seconds: register_histogram!(
                "autoscaler_resize_pass_latency_seconds",
                "Time spent forecasting and resizing the whole fleet",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register resize_pass_latency_seconds"),

            node_capacity_mb: register_int_gauge_vec!(
                "autoscaler_node_capacity_mb",
                "Provisioned memory capacity per node",
                &["node"]
            )
            .expect("Failed to register node_capacity_mb"),

            node_used_mb: register_int_gauge_vec!(
                "autoscaler_node_used_mb",
                "Memory in use per node",
                &["node"]
            )
            .expect("Failed to register node_used_mb"),

            nodes_monitored: register_int_gauge!(
                "autoscaler_nodes_monitored",
                "Number of nodes with a running monitor"
            )
            .expect("Failed to register nodes_monitored"),
        }
    }
}

/// Handle to the process-wide autoscaler metrics.
///
/// Clones share the same underlying Prometheus collectors.
#[derive(Clone)]
pub struct AutoscalerMetrics {
    _private: (),
}

impl Default for AutoscalerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl AutoscalerMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(AutoscalerMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &AutoscalerMetricsInner {
        GLOBAL_METRICS.get_or_init(AutoscalerMetricsInner::new)
    }

    pub fn inc_samples_recorded(&self) {
        self.inner().samples_recorded.inc();
    }

    pub fn inc_sample_errors(&self) {
        self.inner().sample_errors.inc();
    }

    pub fn record_decision(&self, direction: ResizeDirection) {
        self.inner()
            .resize_decisions
            .with_label_values(&[direction.as_str()])
            .inc();
    }

    pub fn observe_resize_pass_latency(&self, duration_secs: f64) {
        self.inner().resize_pass_latency_seconds.observe(duration_secs);
    }

    pub fn set_node_state(&self, node_id: NodeId, total_mb: u64, used_mb: u64) {
        let label = node_id.to_string();
        self.inner()
            .node_capacity_mb
            .with_label_values(&[label.as_str()])
            .set(total_mb as i64);
        self.inner()
            .node_used_mb
            .with_label_values(&[label.as_str()])
            .set(used_mb as i64);
    }

    pub fn set_nodes_monitored(&self, count: i64) {
        self.inner().nodes_monitored.set(count);
    }
}

/// Structured logger for autoscaler events
///
/// Emits `event = ...` records so JSON log consumers can filter on them.
#[derive(Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    pub fn instance(&self) -> &str {
        &self.instance
    }

    pub fn log_startup(&self, version: &str, node_count: usize, strategy: &str) {
        info!(
            event = "autoscaler_started",
            instance = %self.instance,
            version = %version,
            node_count = node_count,
            strategy = %strategy,
            "Autoscaler started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "autoscaler_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Autoscaler shutting down"
        );
    }

    /// Changed capacities are logged at info, unchanged ones at debug
    pub fn log_resize(&self, decision: &ResizeDecision) {
        let direction = decision.direction();
        if direction == ResizeDirection::Unchanged {
            debug!(
                event = "capacity_unchanged",
                instance = %self.instance,
                node_id = decision.node_id,
                total_mb = decision.new_mb,
                used_mb = decision.used_mb,
                "Capacity unchanged"
            );
            return;
        }

        info!(
            event = "capacity_resized",
            instance = %self.instance,
            node_id = decision.node_id,
            direction = direction.as_str(),
            forecast_mb = ?decision.forecast_mb,
            candidate_mb = decision.candidate_mb,
            previous_mb = decision.previous_mb,
            new_mb = decision.new_mb,
            used_mb = decision.used_mb,
            "Node capacity resized"
        );
    }

    pub fn log_fleet_status(&self, nodes: &[NodeSnapshot]) {
        for node in nodes {
            info!(
                event = "fleet_status",
                instance = %self.instance,
                node_id = node.id,
                total_mb = node.total_mb,
                used_mb = node.used_mb,
                utilization_percent = node.utilization_percent(),
                "Node status"
            );
        }
    }
}
