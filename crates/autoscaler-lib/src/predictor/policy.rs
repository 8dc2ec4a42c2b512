//! Capacity policy: headroom and safety bounds
//!
//! Turns a forecast into a candidate capacity and clamps any candidate into
//! the range the fleet is allowed to run at.

use crate::error::{ConfigError, ConfigResult};
use tracing::warn;

/// Safety margin applied above the forecast (20%)
pub const DEFAULT_HEADROOM_FACTOR: f64 = 1.2;

/// Smallest capacity a node may be given
pub const DEFAULT_FLOOR_MB: u64 = 512;

/// Largest capacity a node may be given
pub const DEFAULT_CEILING_MB: u64 = 8192;

/// Headroom and absolute bounds applied to every resize
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapacityPolicy {
    /// Multiplier applied to the forecast (must be > 1.0)
    pub headroom_factor: f64,
    /// Absolute capacity floor in MB
    pub floor_mb: u64,
    /// Absolute capacity ceiling in MB
    pub ceiling_mb: u64,
}

impl Default for CapacityPolicy {
    fn default() -> Self {
        Self {
            headroom_factor: DEFAULT_HEADROOM_FACTOR,
            floor_mb: DEFAULT_FLOOR_MB,
            ceiling_mb: DEFAULT_CEILING_MB,
        }
    }
}

impl CapacityPolicy {
    pub fn validate(&self) -> ConfigResult<()> {
        if !self.headroom_factor.is_finite() || self.headroom_factor <= 1.0 {
            return Err(ConfigError::InvalidHeadroom(self.headroom_factor));
        }
        if self.floor_mb == 0 {
            return Err(ConfigError::ZeroFloor);
        }
        if self.floor_mb > self.ceiling_mb {
            return Err(ConfigError::FloorAboveCeiling {
                floor_mb: self.floor_mb,
                ceiling_mb: self.ceiling_mb,
            });
        }
        Ok(())
    }

    /// `ceil(forecast * headroom_factor)` in whole MB
    pub fn with_headroom(&self, forecast_mb: f64) -> u64 {
        // float-to-int casts saturate; NaN maps to 0
        (forecast_mb * self.headroom_factor).ceil() as u64
    }

    /// Clamp a candidate capacity given the node's current usage.
    ///
    /// Order matters: floor at usage, then the absolute ceiling, then the
    /// absolute floor. Capacity is never left below usage; if usage itself
    /// is above the ceiling, usage wins.
    pub fn clamp(&self, candidate_mb: u64, used_mb: u64) -> u64 {
        let bounded = candidate_mb
            .max(used_mb)
            .min(self.ceiling_mb)
            .max(self.floor_mb);

        if bounded < used_mb {
            warn!(
                used_mb,
                ceiling_mb = self.ceiling_mb,
                "Usage exceeds capacity ceiling, holding capacity at usage"
            );
            return used_mb;
        }
        bounded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> CapacityPolicy {
        CapacityPolicy::default()
    }

    #[test]
    fn test_defaults() {
        let p = policy();
        assert_eq!(p.headroom_factor, 1.2);
        assert_eq!(p.floor_mb, 512);
        assert_eq!(p.ceiling_mb, 8192);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_with_headroom_rounds_up() {
        assert_eq!(policy().with_headroom(1000.0), 1200);
        assert_eq!(policy().with_headroom(1000.5), 1201);
        assert_eq!(policy().with_headroom(0.0), 0);
    }

    #[test]
    fn test_clamp_floors_at_usage() {
        assert_eq!(policy().clamp(700, 900), 900);
    }

    #[test]
    fn test_clamp_ceiling_and_floor() {
        assert_eq!(policy().clamp(10_000, 100), 8192);
        assert_eq!(policy().clamp(100, 100), 512);
        assert_eq!(policy().clamp(0, 0), 512);
    }

    #[test]
    fn test_clamp_passes_through_in_range() {
        assert_eq!(policy().clamp(1200, 900), 1200);
    }

    #[test]
    fn test_clamp_usage_above_ceiling_wins() {
        assert_eq!(policy().clamp(100, 9000), 9000);
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        let mut p = policy();
        p.headroom_factor = 1.0;
        assert_eq!(p.validate(), Err(ConfigError::InvalidHeadroom(1.0)));

        let mut p = policy();
        p.headroom_factor = f64::NAN;
        assert!(matches!(p.validate(), Err(ConfigError::InvalidHeadroom(_))));

        let mut p = policy();
        p.floor_mb = 0;
        assert_eq!(p.validate(), Err(ConfigError::ZeroFloor));

        let mut p = policy();
        p.floor_mb = 9000;
        assert_eq!(
            p.validate(),
            Err(ConfigError::FloorAboveCeiling {
                floor_mb: 9000,
                ceiling_mb: 8192
            })
        );
    }
}
