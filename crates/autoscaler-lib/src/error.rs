//! Configuration error types.

use thiserror::Error;

/// Errors raised while validating autoscaler settings.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("feature window must hold at least one sample")]
    ZeroWindow,

    #[error("headroom factor must be a finite value above 1.0, got {0}")]
    InvalidHeadroom(f64),

    #[error("capacity floor must be positive")]
    ZeroFloor,

    #[error("capacity floor {floor_mb}MB exceeds ceiling {ceiling_mb}MB")]
    FloorAboveCeiling { floor_mb: u64, ceiling_mb: u64 },

    #[error("{0} interval must be non-zero")]
    ZeroInterval(&'static str),

    #[error("fleet must contain at least one node")]
    EmptyFleet,
}

pub type ConfigResult<T> = Result<T, ConfigError>;
