use std::fmt;

use serde::{Deserialize, Serialize};

/// The two sensor event streams the registry manages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SensorKind {
    Orientation,
    Motion,
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorKind::Orientation => write!(f, "orientation"),
            SensorKind::Motion => write!(f, "motion"),
        }
    }
}

/// Raw orientation sample as delivered by the platform event stream.
///
/// Angle fields are `None` when the platform could not determine them,
/// mirroring the nullable event fields. Query paths substitute zero for
/// missing angles so per-frame reads never fail.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct RawOrientationSample {
    /// Device heading in degrees [0, 360)
    pub alpha: Option<f64>,
    /// Front-back tilt in degrees [-180, 180]
    pub beta: Option<f64>,
    /// Left-right tilt in degrees [-90, 90]
    pub gamma: Option<f64>,
    /// Whether the heading is anchored to an absolute reference frame
    pub absolute: bool,
    /// Compass heading in degrees, when the platform exposes one
    pub compass_heading: Option<f64>,
    /// Reported compass error in degrees, when the platform exposes one
    pub compass_accuracy: Option<f64>,
}

impl RawOrientationSample {
    pub fn new(alpha: f64, beta: f64, gamma: f64) -> Self {
        Self {
            alpha: Some(alpha),
            beta: Some(beta),
            gamma: Some(gamma),
            ..Self::default()
        }
    }

    pub fn with_absolute(mut self, absolute: bool) -> Self {
        self.absolute = absolute;
        self
    }

    pub fn with_compass(mut self, heading: f64, accuracy: f64) -> Self {
        self.compass_heading = Some(heading);
        self.compass_accuracy = Some(accuracy);
        self
    }
}

/// Cartesian reading along the device axes (m/s^2 for acceleration).
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct Axes3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Axes3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// Angular velocity around the device axes in degrees per second.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct RotationRate {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl RotationRate {
    pub fn new(alpha: f64, beta: f64, gamma: f64) -> Self {
        Self { alpha, beta, gamma }
    }
}

/// Raw motion sample as delivered by the platform event stream.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct RawMotionSample {
    pub acceleration: Axes3,
    pub acceleration_including_gravity: Axes3,
    pub rotation_rate: RotationRate,
}

impl RawMotionSample {
    pub fn new(acceleration: Axes3, acceleration_including_gravity: Axes3, rotation_rate: RotationRate) -> Self {
        Self {
            acceleration,
            acceleration_including_gravity,
            rotation_rate,
        }
    }
}
