//! Core data models for the autoscaler

use serde::{Deserialize, Serialize};

/// Stable node identifier, assigned at fleet creation (1..N)
pub type NodeId = u32;

/// Memory usage sample reported by a node monitor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricEvent {
    pub node_id: NodeId,
    pub used_mb: u64,
    pub timestamp: i64,
}

impl MetricEvent {
    pub fn new(node_id: NodeId, used_mb: u64) -> Self {
        Self {
            node_id,
            used_mb,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// Point-in-time copy of a node's capacity and usage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub id: NodeId,
    pub total_mb: u64,
    pub used_mb: u64,
}

impl NodeSnapshot {
    /// Usage as a percentage of capacity. Zero capacity reports 0%.
    pub fn utilization_percent(&self) -> f64 {
        if self.total_mb == 0 {
            return 0.0;
        }
        self.used_mb as f64 / self.total_mb as f64 * 100.0
    }
}

/// Outcome of applying a capacity change to a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeOutcome {
    pub previous_mb: u64,
    pub new_mb: u64,
    pub used_mb: u64,
}

/// A single resize decision taken by the controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResizeDecision {
    pub node_id: NodeId,
    /// Forecast usage, when the strategy produced one
    pub forecast_mb: Option<f64>,
    pub candidate_mb: u64,
    pub previous_mb: u64,
    pub new_mb: u64,
    pub used_mb: u64,
}

impl ResizeDecision {
    pub fn direction(&self) -> ResizeDirection {
        match self.new_mb.cmp(&self.previous_mb) {
            std::cmp::Ordering::Greater => ResizeDirection::Up,
            std::cmp::Ordering::Less => ResizeDirection::Down,
            std::cmp::Ordering::Equal => ResizeDirection::Unchanged,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeDirection {
    Up,
    Down,
    Unchanged,
}

impl ResizeDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResizeDirection::Up => "up",
            ResizeDirection::Down => "down",
            ResizeDirection::Unchanged => "unchanged",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utilization_percent() {
        let snapshot = NodeSnapshot {
            id: 1,
            total_mb: 1200,
            used_mb: 900,
        };
        assert!((snapshot.utilization_percent() - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_utilization_zero_capacity() {
        let snapshot = NodeSnapshot {
            id: 1,
            total_mb: 0,
            used_mb: 0,
        };
        assert_eq!(snapshot.utilization_percent(), 0.0);
    }

    #[test]
    fn test_resize_direction() {
        let mut decision = ResizeDecision {
            node_id: 1,
            forecast_mb: Some(1000.0),
            candidate_mb: 1200,
            previous_mb: 1024,
            new_mb: 1200,
            used_mb: 900,
        };
        assert_eq!(decision.direction(), ResizeDirection::Up);

        decision.new_mb = 512;
        assert_eq!(decision.direction(), ResizeDirection::Down);

        decision.new_mb = 1024;
        assert_eq!(decision.direction().as_str(), "unchanged");
    }

    #[test]
    fn test_snapshot_serializes_field_names() {
        let snapshot = NodeSnapshot {
            id: 3,
            total_mb: 2048,
            used_mb: 512,
        };
        let json = serde_json::to_value(snapshot).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["total_mb"], 2048);
        assert_eq!(json["used_mb"], 512);
    }
}
