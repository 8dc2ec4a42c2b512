//! Scaling strategies
//!
//! A strategy proposes a candidate capacity for a node. The controller then
//! clamps the candidate with the `CapacityPolicy` before writing it.

use super::{predict, CapacityPolicy};
use crate::models::NodeSnapshot;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Utilization above which the threshold strategy grows capacity
pub const SCALE_UP_UTILIZATION: f64 = 80.0;
/// Utilization below which the threshold strategy shrinks capacity
pub const SCALE_DOWN_UTILIZATION: f64 = 40.0;
/// Capacity added per threshold scale-up
pub const SCALE_UP_STEP_MB: u64 = 256;
/// Capacity removed per threshold scale-down
pub const SCALE_DOWN_STEP_MB: u64 = 128;

/// Candidate capacity proposed for one node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Proposal {
    pub candidate_mb: u64,
    pub forecast_mb: Option<f64>,
}

/// Trait for capacity decision implementations
pub trait ScalingStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Propose a candidate capacity, or `None` when there is no signal
    fn propose(
        &self,
        history: &[f64],
        node: &NodeSnapshot,
        policy: &CapacityPolicy,
    ) -> Option<Proposal>;
}

/// Forecast next-interval usage and provision headroom above it
#[derive(Debug, Default, Clone, Copy)]
pub struct PredictiveStrategy;

impl ScalingStrategy for PredictiveStrategy {
    fn name(&self) -> &'static str {
        "predictive"
    }

    fn propose(
        &self,
        history: &[f64],
        _node: &NodeSnapshot,
        policy: &CapacityPolicy,
    ) -> Option<Proposal> {
        if history.is_empty() {
            return None;
        }
        let forecast_mb = predict(history);
        Some(Proposal {
            candidate_mb: policy.with_headroom(forecast_mb),
            forecast_mb: Some(forecast_mb),
        })
    }
}

/// Step capacity up or down based on current utilization alone
#[derive(Debug, Default, Clone, Copy)]
pub struct ThresholdStrategy;

impl ScalingStrategy for ThresholdStrategy {
    fn name(&self) -> &'static str {
        "threshold"
    }

    fn propose(
        &self,
        _history: &[f64],
        node: &NodeSnapshot,
        policy: &CapacityPolicy,
    ) -> Option<Proposal> {
        let utilization = node.utilization_percent();
        let candidate_mb = if utilization > SCALE_UP_UTILIZATION {
            node.total_mb.saturating_add(SCALE_UP_STEP_MB)
        } else if utilization < SCALE_DOWN_UTILIZATION && node.total_mb > policy.floor_mb {
            node.total_mb.saturating_sub(SCALE_DOWN_STEP_MB)
        } else {
            node.total_mb
        };

        Some(Proposal {
            candidate_mb,
            forecast_mb: None,
        })
    }
}

/// Strategy selector used by configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    #[default]
    Predictive,
    Threshold,
}

impl StrategyKind {
    pub fn build(self) -> Arc<dyn ScalingStrategy> {
        match self {
            StrategyKind::Predictive => Arc::new(PredictiveStrategy),
            StrategyKind::Threshold => Arc::new(ThresholdStrategy),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(total_mb: u64, used_mb: u64) -> NodeSnapshot {
        NodeSnapshot {
            id: 1,
            total_mb,
            used_mb,
        }
    }

    #[test]
    fn test_predictive_no_history_no_signal() {
        let proposal =
            PredictiveStrategy.propose(&[], &node(1024, 900), &CapacityPolicy::default());
        assert!(proposal.is_none());
    }

    #[test]
    fn test_predictive_applies_headroom() {
        let proposal = PredictiveStrategy
            .propose(
                &[1000.0, 1000.0, 1000.0],
                &node(1024, 900),
                &CapacityPolicy::default(),
            )
            .unwrap();

        assert_eq!(proposal.forecast_mb, Some(1000.0));
        assert_eq!(proposal.candidate_mb, 1200);
    }

    #[test]
    fn test_threshold_scale_up() {
        let proposal = ThresholdStrategy
            .propose(&[], &node(1000, 850), &CapacityPolicy::default())
            .unwrap();
        assert_eq!(proposal.candidate_mb, 1256);
        assert!(proposal.forecast_mb.is_none());
    }

    #[test]
    fn test_threshold_scale_down() {
        let proposal = ThresholdStrategy
            .propose(&[], &node(1000, 300), &CapacityPolicy::default())
            .unwrap();
        assert_eq!(proposal.candidate_mb, 872);
    }

    #[test]
    fn test_threshold_no_scale_down_at_floor() {
        let proposal = ThresholdStrategy
            .propose(&[], &node(512, 10), &CapacityPolicy::default())
            .unwrap();
        assert_eq!(proposal.candidate_mb, 512);
    }

    #[test]
    fn test_threshold_stable() {
        let proposal = ThresholdStrategy
            .propose(&[], &node(1000, 600), &CapacityPolicy::default())
            .unwrap();
        assert_eq!(proposal.candidate_mb, 1000);
    }

    #[test]
    fn test_strategy_kind_build_and_serde() {
        assert_eq!(StrategyKind::default().build().name(), "predictive");
        assert_eq!(StrategyKind::Threshold.build().name(), "threshold");

        let kind: StrategyKind = serde_json::from_str("\"threshold\"").unwrap();
        assert_eq!(kind, StrategyKind::Threshold);
    }
}
