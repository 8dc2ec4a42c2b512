//! Autoscaling decision loop
//!
//! The controller multiplexes two event sources on a single task: metric
//! events from node monitors, which only accumulate history, and its own
//! resize ticker, which forecasts demand and resizes every node.

use crate::error::{ConfigError, ConfigResult};
use crate::fleet::{Fleet, Node};
use crate::health::{components, HealthRegistry};
use crate::models::{MetricEvent, NodeId, ResizeDecision, ResizeDirection};
use crate::observability::{AutoscalerMetrics, StructuredLogger};
use crate::predictor::{CapacityPolicy, ScalingStrategy};
use crate::store::FeatureStore;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Default interval between full-fleet resize passes
pub const DEFAULT_RESIZE_INTERVAL: Duration = Duration::from_secs(1);

/// Configuration for the controller loop
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Interval between resize passes (default: 1 second)
    pub resize_interval: Duration,
    /// Minimum time between two capacity reductions of the same node.
    /// Zero disables the cooldown.
    pub scale_down_cooldown: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            resize_interval: DEFAULT_RESIZE_INTERVAL,
            scale_down_cooldown: Duration::ZERO,
        }
    }
}

/// Counters describing controller activity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControllerStats {
    pub ticks: u64,
    pub samples_recorded: u64,
    pub resizes_applied: u64,
    pub nodes_skipped: u64,
    pub tracked_nodes: usize,
}

#[derive(Debug, Default)]
struct Counters {
    ticks: AtomicU64,
    samples_recorded: AtomicU64,
    resizes_applied: AtomicU64,
    nodes_skipped: AtomicU64,
}

/// Decision loop owning the feature store and resizing the fleet
pub struct Controller {
    fleet: Arc<Fleet>,
    store: Arc<FeatureStore>,
    strategy: Arc<dyn ScalingStrategy>,
    policy: CapacityPolicy,
    config: ControllerConfig,
    last_scale_down: Mutex<HashMap<NodeId, Instant>>,
    counters: Counters,
    metrics: AutoscalerMetrics,
    logger: StructuredLogger,
    health: Option<HealthRegistry>,
}

impl Controller {
    pub fn new(
        fleet: Arc<Fleet>,
        store: Arc<FeatureStore>,
        strategy: Arc<dyn ScalingStrategy>,
        policy: CapacityPolicy,
        config: ControllerConfig,
    ) -> ConfigResult<Self> {
        policy.validate()?;
        if config.resize_interval.is_zero() {
            return Err(ConfigError::ZeroInterval("resize"));
        }

        Ok(Self {
            fleet,
            store,
            strategy,
            policy,
            config,
            last_scale_down: Mutex::new(HashMap::new()),
            counters: Counters::default(),
            metrics: AutoscalerMetrics::new(),
            logger: StructuredLogger::new("controller"),
            health: None,
        })
    }

    pub fn with_logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = logger;
        self
    }

    /// Report loss of the metric channel through this registry
    pub fn with_health(mut self, health: HealthRegistry) -> Self {
        self.health = Some(health);
        self
    }

    pub fn fleet(&self) -> &Arc<Fleet> {
        &self.fleet
    }

    pub fn store(&self) -> &Arc<FeatureStore> {
        &self.store
    }

    pub fn policy(&self) -> &CapacityPolicy {
        &self.policy
    }

    /// Run the decision loop until shutdown
    pub async fn run(
        self: Arc<Self>,
        mut events: mpsc::Receiver<MetricEvent>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        let period = self.config.resize_interval;
        info!(
            resize_interval_ms = period.as_millis() as u64,
            window = self.store.window(),
            strategy = self.strategy.name(),
            "Starting autoscaling controller"
        );

        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut events_open = true;

        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    info!("Shutting down autoscaling controller");
                    break;
                }
                _ = ticker.tick() => {
                    let start = std::time::Instant::now();
                    let decisions = self.resize_pass().await;
                    self.metrics
                        .observe_resize_pass_latency(start.elapsed().as_secs_f64());
                    debug!(
                        decisions = decisions.len(),
                        elapsed_us = start.elapsed().as_micros() as u64,
                        "Resize pass complete"
                    );
                }
                event = events.recv(), if events_open => match event {
                    Some(event) => self.record(event).await,
                    None => {
                        warn!("Metric channel closed, continuing with resize ticks only");
                        events_open = false;
                        if let Some(health) = &self.health {
                            health
                                .set_degraded(components::CONTROLLER, "Metric channel closed")
                                .await;
                        }
                    }
                },
            }
        }
    }

    /// Record a metric event into the feature store
    pub async fn record(&self, event: MetricEvent) {
        if self.fleet.get(event.node_id).is_none() {
            warn!(node_id = event.node_id, "Dropping sample from unknown node");
            return;
        }
        self.store.record(event.node_id, event.used_mb as f64).await;
        self.counters.samples_recorded.fetch_add(1, Ordering::Relaxed);
        self.metrics.inc_samples_recorded();
    }

    /// Forecast and resize every node once
    pub async fn resize_pass(&self) -> Vec<ResizeDecision> {
        self.counters.ticks.fetch_add(1, Ordering::Relaxed);

        let mut decisions = Vec::with_capacity(self.fleet.len());
        for node in self.fleet.list() {
            match self.resize_node(&node).await {
                Some(decision) => decisions.push(decision),
                None => {
                    self.counters.nodes_skipped.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
        decisions
    }

    async fn resize_node(&self, node: &Node) -> Option<ResizeDecision> {
        let node_id = node.id();

        // Store guard is released before the node guard is taken
        let history = self.store.snapshot(node_id).await;
        let current = node.snapshot().await;

        let proposal = match self.strategy.propose(&history, &current, &self.policy) {
            Some(p) => p,
            None => {
                debug!(node_id, "No usage history yet, skipping resize");
                return None;
            }
        };

        let mut candidate_mb = proposal.candidate_mb;
        if candidate_mb < current.total_mb && self.in_scale_down_cooldown(node_id).await {
            debug!(
                node_id,
                candidate_mb,
                total_mb = current.total_mb,
                "Scale-down cooldown active, holding capacity"
            );
            candidate_mb = current.total_mb;
        }

        let outcome = node.resize_to(candidate_mb, &self.policy).await;
        let decision = ResizeDecision {
            node_id,
            forecast_mb: proposal.forecast_mb,
            candidate_mb: proposal.candidate_mb,
            previous_mb: outcome.previous_mb,
            new_mb: outcome.new_mb,
            used_mb: outcome.used_mb,
        };

        let direction = decision.direction();
        if direction == ResizeDirection::Down {
            self.last_scale_down
                .lock()
                .await
                .insert(node_id, Instant::now());
        }
        if direction != ResizeDirection::Unchanged {
            self.counters.resizes_applied.fetch_add(1, Ordering::Relaxed);
        }

        self.metrics.record_decision(direction);
        self.metrics
            .set_node_state(node_id, outcome.new_mb, outcome.used_mb);
        self.logger.log_resize(&decision);

        Some(decision)
    }

    async fn in_scale_down_cooldown(&self, node_id: NodeId) -> bool {
        let cooldown = self.config.scale_down_cooldown;
        if cooldown.is_zero() {
            return false;
        }
        self.last_scale_down
            .lock()
            .await
            .get(&node_id)
            .map(|last| last.elapsed() < cooldown)
            .unwrap_or(false)
    }

    pub async fn stats(&self) -> ControllerStats {
        ControllerStats {
            ticks: self.counters.ticks.load(Ordering::Relaxed),
            samples_recorded: self.counters.samples_recorded.load(Ordering::Relaxed),
            resizes_applied: self.counters.resizes_applied.load(Ordering::Relaxed),
            nodes_skipped: self.counters.nodes_skipped.load(Ordering::Relaxed),
            tracked_nodes: self.store.node_count().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictor::{PredictiveStrategy, ThresholdStrategy};

    fn controller_with(
        nodes: Vec<Node>,
        window: usize,
        strategy: Arc<dyn ScalingStrategy>,
        config: ControllerConfig,
    ) -> Arc<Controller> {
        let fleet = Arc::new(Fleet::new(nodes));
        let store = Arc::new(FeatureStore::new(window).unwrap());
        Arc::new(
            Controller::new(fleet, store, strategy, CapacityPolicy::default(), config).unwrap(),
        )
    }

    fn predictive(nodes: Vec<Node>, window: usize) -> Arc<Controller> {
        controller_with(
            nodes,
            window,
            Arc::new(PredictiveStrategy),
            ControllerConfig::default(),
        )
    }

    #[test]
    fn test_rejects_invalid_settings() {
        let fleet = Arc::new(Fleet::new(vec![Node::new(1, 1024, 100)]));
        let store = Arc::new(FeatureStore::new(3).unwrap());

        let bad_policy = CapacityPolicy {
            floor_mb: 10_000,
            ..CapacityPolicy::default()
        };
        assert!(Controller::new(
            fleet.clone(),
            store.clone(),
            Arc::new(PredictiveStrategy),
            bad_policy,
            ControllerConfig::default(),
        )
        .is_err());

        let zero_interval = ControllerConfig {
            resize_interval: Duration::ZERO,
            ..ControllerConfig::default()
        };
        let err = Controller::new(
            fleet,
            store,
            Arc::new(PredictiveStrategy),
            CapacityPolicy::default(),
            zero_interval,
        )
        .err()
        .unwrap();
        assert_eq!(err, ConfigError::ZeroInterval("resize"));
    }

    #[tokio::test]
    async fn test_flat_history_scenario() {
        let controller = predictive(vec![Node::new(1, 1024, 900)], 3);
        for _ in 0..3 {
            controller.record(MetricEvent::new(1, 1000)).await;
        }

        let decisions = controller.resize_pass().await;

        assert_eq!(decisions.len(), 1);
        let d = &decisions[0];
        assert_eq!(d.forecast_mb, Some(1000.0));
        assert_eq!(d.candidate_mb, 1200);
        assert_eq!(d.new_mb, 1200);
        assert_eq!(d.previous_mb, 1024);
        assert_eq!(d.used_mb, 900);
    }

    #[tokio::test]
    async fn test_never_shrinks_below_usage() {
        // Forecast trends toward zero while the node still carries 1500MB
        let controller = predictive(vec![Node::new(1, 2048, 1500)], 4);
        for used in [400, 300, 200, 100] {
            controller.record(MetricEvent::new(1, used)).await;
        }

        let decisions = controller.resize_pass().await;

        assert_eq!(decisions[0].forecast_mb, Some(0.0));
        assert_eq!(decisions[0].new_mb, 1500);
        assert!(decisions[0].new_mb >= decisions[0].used_mb);
    }

    #[tokio::test]
    async fn test_resizes_within_bounds() {
        let controller = predictive(
            vec![Node::new(1, 1024, 10), Node::new(2, 8192, 8000)],
            5,
        );
        controller.record(MetricEvent::new(1, 10)).await;
        for used in [7000, 7500, 8000] {
            controller.record(MetricEvent::new(2, used)).await;
        }

        let decisions = controller.resize_pass().await;
        let policy = controller.policy();

        for d in &decisions {
            assert!(d.new_mb >= d.used_mb);
            assert!(d.new_mb >= policy.floor_mb && d.new_mb <= policy.ceiling_mb);
        }
        assert_eq!(decisions[0].new_mb, 512);
        assert_eq!(decisions[1].new_mb, 8192);
    }

    #[tokio::test]
    async fn test_empty_history_skips_node() {
        let controller = predictive(vec![Node::new(1, 1024, 900), Node::new(2, 1024, 100)], 3);
        controller.record(MetricEvent::new(2, 100)).await;

        let decisions = controller.resize_pass().await;

        assert_eq!(decisions.len(), 1);
        assert_eq!(decisions[0].node_id, 2);
        let untouched = controller.fleet().get(1).unwrap().snapshot().await;
        assert_eq!(untouched.total_mb, 1024);

        let stats = controller.stats().await;
        assert_eq!(stats.nodes_skipped, 1);
        assert_eq!(stats.ticks, 1);
    }

    #[tokio::test]
    async fn test_unknown_node_event_dropped() {
        let controller = predictive(vec![Node::new(1, 1024, 900)], 3);
        controller.record(MetricEvent::new(99, 500)).await;

        assert!(controller.store().snapshot(99).await.is_empty());
        assert_eq!(controller.stats().await.samples_recorded, 0);
    }

    #[tokio::test]
    async fn test_threshold_strategy_steps_capacity() {
        let controller = controller_with(
            vec![Node::new(1, 1000, 900)],
            3,
            Arc::new(ThresholdStrategy),
            ControllerConfig::default(),
        );

        let decisions = controller.resize_pass().await;

        assert_eq!(decisions[0].new_mb, 1256);
        assert!(decisions[0].forecast_mb.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_scale_down_cooldown_holds_capacity() {
        let controller = controller_with(
            vec![Node::new(1, 4096, 500)],
            1,
            Arc::new(PredictiveStrategy),
            ControllerConfig {
                scale_down_cooldown: Duration::from_secs(10),
                ..ControllerConfig::default()
            },
        );

        controller.record(MetricEvent::new(1, 3000)).await;
        let first = controller.resize_pass().await;
        assert_eq!(first[0].new_mb, 3600);

        controller.record(MetricEvent::new(1, 2000)).await;
        let held = controller.resize_pass().await;
        assert_eq!(held[0].new_mb, 3600);
        assert_eq!(held[0].candidate_mb, 2400);

        tokio::time::advance(Duration::from_secs(11)).await;
        let released = controller.resize_pass().await;
        assert_eq!(released[0].new_mb, 2400);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_records_events_and_resizes_on_tick() {
        let controller = predictive(vec![Node::new(1, 1024, 900)], 3);
        let (tx, rx) = mpsc::channel(16);
        let (shutdown_tx, _) = broadcast::channel(1);

        for _ in 0..3 {
            tx.send(MetricEvent::new(1, 1000)).await.unwrap();
        }

        let handle = tokio::spawn(controller.clone().run(rx, shutdown_tx.subscribe()));

        // First tick fires one interval after start
        tokio::time::sleep(Duration::from_millis(1500)).await;

        let node = controller.fleet().get(1).unwrap().snapshot().await;
        assert_eq!(node.total_mb, 1200);
        let stats = controller.stats().await;
        assert_eq!(stats.samples_recorded, 3);
        assert_eq!(stats.ticks, 1);

        shutdown_tx.send(()).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_keeps_ticking_after_channel_closes() {
        let fleet = Arc::new(Fleet::new(vec![Node::new(1, 1024, 900)]));
        let store = Arc::new(FeatureStore::new(3).unwrap());
        let health = HealthRegistry::new();
        health.register(components::CONTROLLER).await;
        let controller = Arc::new(
            Controller::new(
                fleet,
                store,
                Arc::new(PredictiveStrategy),
                CapacityPolicy::default(),
                ControllerConfig::default(),
            )
            .unwrap()
            .with_health(health.clone()),
        );
        let (tx, rx) = mpsc::channel(16);
        let (shutdown_tx, _) = broadcast::channel(1);

        tx.send(MetricEvent::new(1, 1000)).await.unwrap();
        drop(tx);

        let handle = tokio::spawn(controller.clone().run(rx, shutdown_tx.subscribe()));
        tokio::time::sleep(Duration::from_millis(3500)).await;

        assert_eq!(controller.stats().await.ticks, 3);
        assert!(!handle.is_finished());
        assert_eq!(
            health.health().await.status,
            crate::health::ComponentStatus::Degraded
        );

        shutdown_tx.send(()).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_prevents_further_processing() {
        let controller = predictive(vec![Node::new(1, 1024, 900)], 3);
        let (tx, rx) = mpsc::channel(16);
        let (shutdown_tx, _) = broadcast::channel(1);

        let shutdown_rx = shutdown_tx.subscribe();
        shutdown_tx.send(()).unwrap();
        tx.send(MetricEvent::new(1, 1000)).await.unwrap();

        controller.clone().run(rx, shutdown_rx).await;

        assert_eq!(controller.stats().await.samples_recorded, 0);
        assert_eq!(controller.fleet().get(1).unwrap().snapshot().await.total_mb, 1024);
    }
}
