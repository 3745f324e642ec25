use std::f64::consts::{FRAC_PI_2, PI};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::error::{SensorError, SensorResult};

/// Screen rotation quadrant.
///
/// Platforms report the angle as 0, 90, 180, 270 or -90 degrees; -90 and
/// 270 describe the same physical rotation and collapse to one variant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScreenRotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl ScreenRotation {
    pub fn from_angle(degrees: i32) -> Option<Self> {
        match degrees {
            0 => Some(ScreenRotation::Deg0),
            90 => Some(ScreenRotation::Deg90),
            180 => Some(ScreenRotation::Deg180),
            270 | -90 => Some(ScreenRotation::Deg270),
            _ => None,
        }
    }

    pub fn radians(self) -> f64 {
        match self {
            ScreenRotation::Deg0 => 0.0,
            ScreenRotation::Deg90 => FRAC_PI_2,
            ScreenRotation::Deg180 => PI,
            ScreenRotation::Deg270 => -FRAC_PI_2,
        }
    }
}

/// Current screen rotation, updated synchronously from platform
/// rotation-change notifications and read by every screen-adjusted query.
#[derive(Debug, Default)]
pub struct ScreenState {
    rotation: Mutex<ScreenRotation>,
}

impl ScreenState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a platform rotation notification. Angles outside the
    /// supported set are rejected and leave the current rotation unchanged.
    pub fn set_angle(&self, degrees: i32) -> SensorResult<()> {
        let rotation =
            ScreenRotation::from_angle(degrees).ok_or(SensorError::InvalidScreenAngle(degrees))?;
        let mut guard = self
            .rotation
            .lock()
            .map_err(|_| SensorError::Internal("screen rotation lock poisoned".to_string()))?;
        *guard = rotation;
        Ok(())
    }

    pub fn rotation(&self) -> ScreenRotation {
        self.rotation.lock().map(|r| *r).unwrap_or_default()
    }

    pub fn angle_radians(&self) -> f64 {
        self.rotation().radians()
    }
}
