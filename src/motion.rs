use std::sync::Arc;

use crate::error::SensorResult;
use crate::registry::{MotionListener, SensorRegistry};
use crate::screen::ScreenRotation;
use crate::types::{Axes3, RawMotionSample, RotationRate};

/// Per-session motion sensor facade.
///
/// Remaps the raw device axes into screen-relative axes: x and y swap and
/// flip with the screen rotation quadrant, z is perpendicular to the
/// screen and never changes. Rotation rates remap the same way on beta
/// and gamma, with alpha (about z) untouched.
pub struct DeviceMotion {
    registry: Arc<SensorRegistry>,
}

fn remap_axes(v: Axes3, rotation: ScreenRotation) -> Axes3 {
    match rotation {
        ScreenRotation::Deg0 => v,
        ScreenRotation::Deg90 => Axes3::new(-v.y, v.x, v.z),
        ScreenRotation::Deg180 => Axes3::new(-v.x, -v.y, v.z),
        ScreenRotation::Deg270 => Axes3::new(v.y, -v.x, v.z),
    }
}

fn remap_rate(r: RotationRate, rotation: ScreenRotation) -> RotationRate {
    match rotation {
        ScreenRotation::Deg0 => r,
        ScreenRotation::Deg90 => RotationRate::new(r.alpha, -r.gamma, r.beta),
        ScreenRotation::Deg180 => RotationRate::new(r.alpha, -r.beta, -r.gamma),
        ScreenRotation::Deg270 => RotationRate::new(r.alpha, r.gamma, -r.beta),
    }
}

impl DeviceMotion {
    pub fn new(registry: Arc<SensorRegistry>) -> Self {
        Self { registry }
    }

    /// Subscribe this session, optionally registering a per-event listener.
    pub fn start(&self, listener: Option<MotionListener>) -> SensorResult<()> {
        self.registry.start_motion(listener)
    }

    /// `start` with a required listener.
    pub fn listen(&self, listener: MotionListener) -> SensorResult<()> {
        self.start(Some(listener))
    }

    pub fn stop(&self) -> SensorResult<()> {
        self.registry.stop_motion()
    }

    fn raw(&self) -> RawMotionSample {
        self.registry
            .latest_motion()
            .ok()
            .flatten()
            .unwrap_or_default()
    }

    pub fn screen_adjusted_acceleration(&self) -> Axes3 {
        remap_axes(self.raw().acceleration, self.registry.screen().rotation())
    }

    pub fn screen_adjusted_acceleration_including_gravity(&self) -> Axes3 {
        remap_axes(
            self.raw().acceleration_including_gravity,
            self.registry.screen().rotation(),
        )
    }

    pub fn screen_adjusted_rotation_rate(&self) -> RotationRate {
        remap_rate(self.raw().rotation_rate, self.registry.screen().rotation())
    }

    pub fn last_raw_sample(&self) -> Option<RawMotionSample> {
        self.registry.latest_motion().ok().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn motion_with_accel(x: f64, y: f64, z: f64) -> RawMotionSample {
        RawMotionSample::new(
            Axes3::new(x, y, z),
            Axes3::new(x, y, z + 9.81),
            RotationRate::default(),
        )
    }

    fn facade_with_sample(sample: RawMotionSample) -> (Arc<SensorRegistry>, DeviceMotion) {
        let registry = Arc::new(SensorRegistry::new());
        let control = DeviceMotion::new(Arc::clone(&registry));
        control.start(None).unwrap();
        registry.push_motion_sample(sample).unwrap();
        (registry, control)
    }

    #[test]
    fn test_acceleration_remap_per_quadrant() {
        let (registry, control) = facade_with_sample(motion_with_accel(1.0, 0.0, 0.5));

        let at = |angle: i32| {
            registry.screen().set_angle(angle).unwrap();
            control.screen_adjusted_acceleration()
        };

        let a = at(0);
        assert_abs_diff_eq!(a.x, 1.0);
        assert_abs_diff_eq!(a.y, 0.0);

        let a = at(90);
        assert_abs_diff_eq!(a.x, 0.0);
        assert_abs_diff_eq!(a.y, 1.0);

        let a = at(180);
        assert_abs_diff_eq!(a.x, -1.0);
        assert_abs_diff_eq!(a.y, 0.0);

        let a = at(270);
        assert_abs_diff_eq!(a.x, 0.0);
        assert_abs_diff_eq!(a.y, -1.0);

        let a = at(-90);
        assert_abs_diff_eq!(a.x, 0.0);
        assert_abs_diff_eq!(a.y, -1.0);

        // z is perpendicular to the screen and never remapped
        assert_abs_diff_eq!(a.z, 0.5);
    }

    #[test]
    fn test_gravity_variant_uses_same_remap() {
        let (registry, control) = facade_with_sample(motion_with_accel(0.0, 2.0, 0.0));
        registry.screen().set_angle(90).unwrap();

        let g = control.screen_adjusted_acceleration_including_gravity();
        assert_abs_diff_eq!(g.x, -2.0);
        assert_abs_diff_eq!(g.y, 0.0);
        assert_abs_diff_eq!(g.z, 9.81);
    }

    #[test]
    fn test_rotation_rate_remap() {
        let sample = RawMotionSample::new(
            Axes3::default(),
            Axes3::default(),
            RotationRate::new(5.0, 1.0, 2.0),
        );
        let (registry, control) = facade_with_sample(sample);

        let at = |angle: i32| {
            registry.screen().set_angle(angle).unwrap();
            control.screen_adjusted_rotation_rate()
        };

        let r = at(90);
        assert_abs_diff_eq!(r.alpha, 5.0);
        assert_abs_diff_eq!(r.beta, -2.0);
        assert_abs_diff_eq!(r.gamma, 1.0);

        let r = at(180);
        assert_abs_diff_eq!(r.beta, -1.0);
        assert_abs_diff_eq!(r.gamma, -2.0);

        let r = at(270);
        assert_abs_diff_eq!(r.beta, 2.0);
        assert_abs_diff_eq!(r.gamma, -1.0);
    }

    #[test]
    fn test_zero_defaults_before_first_sample() {
        let registry = Arc::new(SensorRegistry::new());
        let control = DeviceMotion::new(registry);

        let a = control.screen_adjusted_acceleration();
        assert_eq!((a.x, a.y, a.z), (0.0, 0.0, 0.0));
        assert!(control.last_raw_sample().is_none());
    }
}
