//! Autoscaler lifecycle
//!
//! Wires the fleet, the node monitors, the controller and the status reporter
//! together behind one broadcast stop signal, and tears them down again with
//! a bounded grace period.

use crate::controller::{Controller, ControllerConfig, ControllerStats};
use crate::error::{ConfigError, ConfigResult};
use crate::fleet::Fleet;
use crate::health::{components, HealthRegistry};
use crate::models::NodeSnapshot;
use crate::observability::{AutoscalerMetrics, StructuredLogger};
use crate::predictor::{CapacityPolicy, StrategyKind};
use crate::reporter::{StatusReporter, DEFAULT_REPORT_INTERVAL};
use crate::source::{spawn_monitors, MetricSource, MonitorConfig};
use crate::store::{FeatureStore, DEFAULT_WINDOW_SIZE};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{info, warn};

/// Default time tasks get to observe the stop signal
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_millis(500);

/// Everything needed to start the control loop
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub monitor: MonitorConfig,
    pub controller: ControllerConfig,
    pub window_size: usize,
    pub policy: CapacityPolicy,
    pub strategy: StrategyKind,
    pub report_interval: Duration,
    pub grace_period: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            monitor: MonitorConfig::default(),
            controller: ControllerConfig::default(),
            window_size: DEFAULT_WINDOW_SIZE,
            policy: CapacityPolicy::default(),
            strategy: StrategyKind::default(),
            report_interval: DEFAULT_REPORT_INTERVAL,
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }
}

impl RuntimeConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        self.policy.validate()?;
        if self.window_size == 0 {
            return Err(ConfigError::ZeroWindow);
        }
        if self.monitor.interval.is_zero() {
            return Err(ConfigError::ZeroInterval("sample"));
        }
        if self.controller.resize_interval.is_zero() {
            return Err(ConfigError::ZeroInterval("resize"));
        }
        if self.report_interval.is_zero() {
            return Err(ConfigError::ZeroInterval("report"));
        }
        Ok(())
    }
}

/// A running control loop
pub struct Autoscaler {
    controller: Arc<Controller>,
    health: HealthRegistry,
    shutdown_tx: broadcast::Sender<()>,
    tasks: Vec<JoinHandle<()>>,
    grace_period: Duration,
}

impl Autoscaler {
    /// Spawn one monitor per node, the controller and the reporter
    pub async fn start(
        fleet: Arc<Fleet>,
        source: Arc<dyn MetricSource>,
        config: RuntimeConfig,
        health: HealthRegistry,
        logger: StructuredLogger,
    ) -> ConfigResult<Self> {
        config.validate()?;
        if fleet.is_empty() {
            return Err(ConfigError::EmptyFleet);
        }

        let store = Arc::new(FeatureStore::new(config.window_size)?);
        let controller = Arc::new(
            Controller::new(
                fleet.clone(),
                store,
                config.strategy.build(),
                config.policy,
                config.controller.clone(),
            )?
            .with_logger(logger.clone())
            .with_health(health.clone()),
        );

        health.register(components::MONITORS).await;
        health.register(components::CONTROLLER).await;

        let (shutdown_tx, _) = broadcast::channel(1);
        let (mut tasks, events_rx) =
            spawn_monitors(&fleet, source, &config.monitor, &shutdown_tx);
        tasks.push(tokio::spawn(
            controller.clone().run(events_rx, shutdown_tx.subscribe()),
        ));

        let reporter = StatusReporter::new(fleet.clone(), config.report_interval, logger.clone());
        tasks.push(tokio::spawn(reporter.run(shutdown_tx.subscribe())));

        AutoscalerMetrics::new().set_nodes_monitored(fleet.len() as i64);
        info!(
            instance = logger.instance(),
            nodes = fleet.len(),
            tasks = tasks.len(),
            "Control loop started"
        );

        Ok(Self {
            controller,
            health,
            shutdown_tx,
            tasks,
            grace_period: config.grace_period,
        })
    }

    pub fn controller(&self) -> &Arc<Controller> {
        &self.controller
    }

    pub fn fleet(&self) -> &Arc<Fleet> {
        self.controller.fleet()
    }

    pub fn store(&self) -> &Arc<FeatureStore> {
        self.controller.store()
    }

    pub async fn stats(&self) -> ControllerStats {
        self.controller.stats().await
    }

    /// Signal every task to stop, wait up to the grace period, then read the
    /// final fleet state. Tasks still running at the deadline are aborted.
    pub async fn shutdown(self) -> Vec<NodeSnapshot> {
        self.health.set_ready(false).await;
        // No receivers left only means every task already exited
        let _ = self.shutdown_tx.send(());

        let deadline = Instant::now() + self.grace_period;
        let mut lingering = 0usize;
        for mut task in self.tasks {
            match tokio::time::timeout_at(deadline, &mut task).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "Task ended abnormally"),
                Err(_) => {
                    task.abort();
                    lingering += 1;
                }
            }
        }
        if lingering > 0 {
            warn!(lingering, "Tasks did not stop within the grace period");
        }

        AutoscalerMetrics::new().set_nodes_monitored(0);
        self.controller.fleet().snapshots().await
    }
}
