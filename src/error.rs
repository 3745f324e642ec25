use thiserror::Error;

use crate::types::SensorKind;

/// Library error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SensorError {
    /// The availability probe exhausted its retry budget without ever
    /// observing a sample for this sensor kind.
    #[error("{0} sensor is not supported")]
    NotSupported(SensorKind),

    /// The platform reported a screen angle outside {0, 90, 180, 270, -90}.
    #[error("invalid screen orientation angle: {0} degrees")]
    InvalidScreenAngle(i32),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for sensor operations
pub type SensorResult<T> = Result<T, SensorError>;
