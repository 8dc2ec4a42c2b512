//! Predictive memory autoscaler library
//!
//! This crate provides the core functionality for:
//! - Simulated nodes and their workloads
//! - Sliding-window usage history
//! - Demand forecasting and capacity decisions
//! - The control loop and its lifecycle
//! - Health checks and observability

pub mod controller;
pub mod error;
pub mod fleet;
pub mod health;
pub mod models;
pub mod observability;
pub mod predictor;
pub mod reporter;
pub mod runtime;
pub mod source;
pub mod store;

pub use controller::{Controller, ControllerConfig, ControllerStats};
pub use error::{ConfigError, ConfigResult};
pub use fleet::{Fleet, Node};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{AutoscalerMetrics, StructuredLogger};
pub use reporter::{FleetStatus, NodeDetail, NodeStatus, StatusReporter};
pub use runtime::{Autoscaler, RuntimeConfig};
pub use store::FeatureStore;
