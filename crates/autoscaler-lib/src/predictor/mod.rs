//! Demand forecasting and capacity decisions

mod forecast;
mod policy;
mod strategy;

pub use forecast::{fit_line, predict, LinearFit, DEGENERATE_TOLERANCE};
pub use policy::{CapacityPolicy, DEFAULT_CEILING_MB, DEFAULT_FLOOR_MB, DEFAULT_HEADROOM_FACTOR};
pub use strategy::{
    PredictiveStrategy, Proposal, ScalingStrategy, StrategyKind, ThresholdStrategy,
    SCALE_DOWN_STEP_MB, SCALE_DOWN_UTILIZATION, SCALE_UP_STEP_MB, SCALE_UP_UTILIZATION,
};
