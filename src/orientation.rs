// orientation - the DeviceOrientation facade
//
// Combines the latest raw orientation sample, the calibration offset
// captured at construction time and the current screen rotation into
// fixed-frame and screen-adjusted attitude readings. All query methods
// are pure reads and safe to call any number of times per frame.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::attitude::{Axis, Euler, Quaternion, RotationMatrix};
use crate::error::SensorResult;
use crate::registry::{OrientationListener, SensorRegistry};
use crate::types::RawOrientationSample;

/// Maximum number of events the calibration listener observes before
/// giving up.
pub const CALIBRATION_EVENT_BUDGET: u32 = 200;

/// Number of accepted baselines required to lock calibration in.
pub const CALIBRATION_LOCK_COUNT: u32 = 10;

/// Compass readings at or above this reported error are rejected.
pub const COMPASS_ACCURACY_LIMIT_DEG: f64 = 50.0;

/// Heading calibration mode.
///
/// `Game` zeroes the heading baseline at calibration time, `World`
/// anchors it to the compass heading, `Passthrough` reports whatever the
/// platform delivers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalibrationMode {
    Game,
    World,
    #[default]
    Passthrough,
}

#[derive(Debug, Default)]
struct CalibrationState {
    /// Baseline candidate from the most recent accepted event. Only
    /// promoted to `locked` once enough acceptances accumulate; a partial
    /// run that exhausts the event budget leaves the facade uncalibrated.
    candidate: Option<(Euler, f64)>,
    locked: Option<(Euler, f64)>,
    tries: u32,
    acceptances: u32,
}

/// Per-session orientation sensor facade.
pub struct DeviceOrientation {
    registry: Arc<SensorRegistry>,
    mode: CalibrationMode,
    calibration: Arc<Mutex<CalibrationState>>,
}

impl DeviceOrientation {
    /// Create a facade over the shared registry.
    ///
    /// For `Game` and `World` a self-retiring calibration listener is
    /// registered immediately; it samples the event stream once `start`
    /// activates it and detaches after locking a baseline or exhausting
    /// its budget.
    pub fn new(registry: Arc<SensorRegistry>, mode: CalibrationMode) -> SensorResult<Self> {
        let calibration = Arc::new(Mutex::new(CalibrationState::default()));

        if mode != CalibrationMode::Passthrough {
            let state = Arc::clone(&calibration);
            let reg = Arc::clone(&registry);
            let retired = Arc::new(AtomicBool::new(false));
            let flag = Arc::clone(&retired);

            let listener: OrientationListener = Arc::new(move |sample: &RawOrientationSample| {
                let Ok(mut cal) = state.lock() else {
                    flag.store(true, Ordering::SeqCst);
                    return;
                };
                let screen_rad = reg.screen().angle_radians();

                let accepted = match mode {
                    CalibrationMode::Game => match sample.alpha {
                        Some(alpha) => {
                            let offset = Euler::new(alpha, 0.0, 0.0).rotated(Axis::Z, -screen_rad);
                            cal.candidate = Some((offset, 0.0));
                            true
                        }
                        None => false,
                    },
                    CalibrationMode::World => match (sample.compass_heading, sample.compass_accuracy)
                    {
                        (Some(heading), Some(accuracy))
                            if !sample.absolute
                                && accuracy >= 0.0
                                && accuracy < COMPASS_ACCURACY_LIMIT_DEG =>
                        {
                            let offset =
                                Euler::new(heading, 0.0, 0.0).rotated(Axis::Z, screen_rad);
                            cal.candidate = Some((offset, screen_rad));
                            true
                        }
                        _ => false,
                    },
                    CalibrationMode::Passthrough => false,
                };

                if accepted {
                    cal.acceptances += 1;
                    if cal.acceptances >= CALIBRATION_LOCK_COUNT {
                        cal.locked = cal.candidate;
                        log::debug!(
                            "orientation calibration locked after {} events",
                            cal.tries + 1
                        );
                        flag.store(true, Ordering::SeqCst);
                        return;
                    }
                }

                cal.tries += 1;
                if cal.tries >= CALIBRATION_EVENT_BUDGET {
                    log::debug!(
                        "orientation calibration gave up after {} events ({} accepted)",
                        cal.tries,
                        cal.acceptances
                    );
                    flag.store(true, Ordering::SeqCst);
                }
            });

            registry.add_orientation_listener_with_flag(listener, retired)?;
        }

        Ok(Self {
            registry,
            mode,
            calibration,
        })
    }

    pub fn mode(&self) -> CalibrationMode {
        self.mode
    }

    /// Subscribe this session, optionally registering a per-event listener.
    pub fn start(&self, listener: Option<OrientationListener>) -> SensorResult<()> {
        self.registry.start_orientation(listener)
    }

    /// `start` with a required listener.
    pub fn listen(&self, listener: OrientationListener) -> SensorResult<()> {
        self.start(Some(listener))
    }

    pub fn stop(&self) -> SensorResult<()> {
        self.registry.stop_orientation()
    }

    /// Whether a calibration baseline has been locked in.
    pub fn is_calibrated(&self) -> bool {
        self.calibration
            .lock()
            .map(|cal| cal.locked.is_some())
            .unwrap_or(false)
    }

    /// Latest raw sample with the locked heading baseline subtracted.
    fn adjusted_euler(&self) -> Euler {
        let raw = self
            .registry
            .latest_orientation()
            .ok()
            .flatten()
            .unwrap_or_default();

        let mut alpha = raw.alpha.unwrap_or(0.0);
        if let Ok(cal) = self.calibration.lock() {
            if let Some((offset, offset_screen)) = cal.locked {
                let m = RotationMatrix::from_euler(&offset).rotated(Axis::Z, -offset_screen);
                let baseline = Euler::from_rotation_matrix(&m);
                alpha -= baseline.alpha.rem_euclid(360.0);
            }
        }

        Euler::new(alpha, raw.beta.unwrap_or(0.0), raw.gamma.unwrap_or(0.0))
    }

    pub fn fixed_frame_quaternion(&self) -> Quaternion {
        Quaternion::from_euler(&self.adjusted_euler())
    }

    pub fn fixed_frame_matrix(&self) -> RotationMatrix {
        RotationMatrix::from_euler(&self.adjusted_euler())
    }

    pub fn fixed_frame_euler(&self) -> Euler {
        Euler::from_rotation_matrix(&self.fixed_frame_matrix())
    }

    /// Fixed-frame attitude rotated back by the current screen rotation,
    /// so the reading stays aligned with the user-visible screen.
    pub fn screen_adjusted_quaternion(&self) -> Quaternion {
        self.fixed_frame_quaternion()
            .rotated(Axis::Z, -self.registry.screen().angle_radians())
    }

    pub fn screen_adjusted_matrix(&self) -> RotationMatrix {
        self.fixed_frame_matrix()
            .rotated(Axis::Z, -self.registry.screen().angle_radians())
    }

    pub fn screen_adjusted_euler(&self) -> Euler {
        Euler::from_rotation_matrix(&self.screen_adjusted_matrix())
    }

    /// Whether the latest raw sample carried an absolute heading.
    pub fn is_absolute(&self) -> bool {
        self.registry
            .latest_orientation()
            .ok()
            .flatten()
            .map(|sample| sample.absolute)
            .unwrap_or(false)
    }

    pub fn last_raw_sample(&self) -> Option<RawOrientationSample> {
        self.registry.latest_orientation().ok().flatten()
    }
}
