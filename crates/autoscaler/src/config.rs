//! Autoscaler configuration

use anyhow::{Context, Result};
use autoscaler_lib::{
    controller::ControllerConfig,
    predictor::{CapacityPolicy, StrategyKind},
    runtime::RuntimeConfig,
    source::MonitorConfig,
};
use serde::Deserialize;
use std::time::Duration;

/// Driver configuration, read from `autoscaler.toml` and `AUTOSCALER_*`
#[derive(Debug, Clone, Deserialize)]
pub struct AutoscalerConfig {
    /// Name attached to structured log records
    #[serde(default = "default_instance")]
    pub instance: String,

    /// Number of simulated nodes
    #[serde(default = "default_node_count")]
    pub node_count: u32,

    #[serde(default = "default_sample_interval")]
    pub sample_interval_ms: u64,

    #[serde(default = "default_resize_interval")]
    pub resize_interval_ms: u64,

    /// Usage samples kept per node
    #[serde(default = "default_window_size")]
    pub window_size: usize,

    #[serde(default = "default_headroom_factor")]
    pub headroom_factor: f64,

    #[serde(default = "default_floor")]
    pub floor_mb: u64,

    #[serde(default = "default_ceiling")]
    pub ceiling_mb: u64,

    #[serde(default)]
    pub strategy: StrategyKind,

    /// Minimum time between two reductions of one node (0 disables)
    #[serde(default)]
    pub scale_down_cooldown_ms: u64,

    /// How long to run before shutting down (0 runs until Ctrl-C)
    #[serde(default = "default_run_duration")]
    pub run_duration_secs: u64,

    #[serde(default = "default_report_interval")]
    pub report_interval_secs: u64,

    #[serde(default = "default_grace_period")]
    pub grace_period_ms: u64,

    /// API server port for health/metrics/status (0 disables the server)
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Fixed seed for reproducible synthetic workloads
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_instance() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "autoscaler".to_string())
}

fn default_node_count() -> u32 {
    5
}

fn default_sample_interval() -> u64 {
    300
}

fn default_resize_interval() -> u64 {
    1000
}

fn default_window_size() -> usize {
    10
}

fn default_headroom_factor() -> f64 {
    1.2
}

fn default_floor() -> u64 {
    512
}

fn default_ceiling() -> u64 {
    8192
}

fn default_run_duration() -> u64 {
    30
}

fn default_report_interval() -> u64 {
    3
}

fn default_grace_period() -> u64 {
    500
}

fn default_api_port() -> u16 {
    8080
}

fn default_channel_capacity() -> usize {
    1024
}

impl AutoscalerConfig {
    /// Load configuration from an optional `autoscaler` file and the environment
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("autoscaler").required(false))
            .add_source(config::Environment::with_prefix("AUTOSCALER").try_parsing(true))
            .build()
            .context("Failed to read configuration")?;

        Self::from_config(config)
    }

    fn from_config(config: config::Config) -> Result<Self> {
        let parsed: Self = config
            .try_deserialize()
            .context("Invalid autoscaler configuration")?;
        parsed.validate()?;
        Ok(parsed)
    }

    pub fn validate(&self) -> Result<()> {
        if self.node_count == 0 {
            anyhow::bail!("node_count must be at least 1");
        }
        self.runtime_config()
            .validate()
            .context("Invalid autoscaler configuration")?;
        Ok(())
    }

    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            monitor: MonitorConfig {
                interval: Duration::from_millis(self.sample_interval_ms),
                buffer_size: self.channel_capacity,
            },
            controller: ControllerConfig {
                resize_interval: Duration::from_millis(self.resize_interval_ms),
                scale_down_cooldown: Duration::from_millis(self.scale_down_cooldown_ms),
            },
            window_size: self.window_size,
            policy: CapacityPolicy {
                headroom_factor: self.headroom_factor,
                floor_mb: self.floor_mb,
                ceiling_mb: self.ceiling_mb,
            },
            strategy: self.strategy,
            report_interval: Duration::from_secs(self.report_interval_secs),
            grace_period: Duration::from_millis(self.grace_period_ms),
        }
    }

    /// `None` means run until interrupted
    pub fn run_duration(&self) -> Option<Duration> {
        (self.run_duration_secs > 0).then(|| Duration::from_secs(self.run_duration_secs))
    }
}
