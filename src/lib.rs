// device_orientation_rs - normalised device orientation and motion sensing
//
// Takes raw orientation/motion sensor samples in, produces screen-adjusted
// and fixed-frame attitude readings out, as Euler angles, quaternions or
// rotation matrices, with conversions between all three.
//
// Everything in the attitude layer is independent of:
//   - tokio / async runtime
//   - the platform event source feeding the registry
//   - logging, the simulate binary, serialization
//
// A platform integration layer pushes raw samples into a shared
// `SensorRegistry`; `DeviceOrientation` / `DeviceMotion` facades combine
// the latest sample with a one-time heading calibration and the current
// screen rotation. Consumers read a fresh value once per animation frame.
//
// Typical usage:
//
//   let registry = Arc::new(SensorRegistry::new());
//   // platform glue: registry.push_orientation_sample(...) per event
//   let orientation = device_orientation(registry.clone(), CalibrationMode::Game).await?;
//   // per frame:
//   let euler = orientation.screen_adjusted_euler();

pub mod attitude;
pub mod error;
pub mod motion;
pub mod orientation;
pub mod probe;
pub mod registry;
pub mod screen;
pub mod types;

use std::sync::Arc;

pub use attitude::{Axis, Euler, Quaternion, RotationMatrix};
pub use error::{SensorError, SensorResult};
pub use motion::DeviceMotion;
pub use orientation::{CalibrationMode, DeviceOrientation};
pub use registry::SensorRegistry;
pub use screen::{ScreenRotation, ScreenState};
pub use types::{Axes3, RawMotionSample, RawOrientationSample, RotationRate, SensorKind};

/// Start an orientation session and wait for the sensor to prove itself.
///
/// Constructs the facade, subscribes it and runs the availability probe;
/// if no sample ever arrives the session is stopped again and the sensor
/// reported as unsupported.
pub async fn device_orientation(
    registry: Arc<SensorRegistry>,
    mode: CalibrationMode,
) -> SensorResult<DeviceOrientation> {
    let control = DeviceOrientation::new(Arc::clone(&registry), mode)?;
    control.start(None)?;

    if let Err(err) = probe::wait_for_sample(&registry, SensorKind::Orientation).await {
        control.stop()?;
        return Err(err);
    }
    Ok(control)
}

/// Start a motion session and wait for the sensor to prove itself.
pub async fn device_motion(registry: Arc<SensorRegistry>) -> SensorResult<DeviceMotion> {
    let control = DeviceMotion::new(Arc::clone(&registry));
    control.start(None)?;

    if let Err(err) = probe::wait_for_sample(&registry, SensorKind::Motion).await {
        control.stop()?;
        return Err(err);
    }
    Ok(control)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{sleep, Duration};

    #[tokio::test]
    async fn test_device_orientation_resolves_once_samples_flow() {
        let registry = Arc::new(SensorRegistry::new());

        let feeder = Arc::clone(&registry);
        tokio::spawn(async move {
            loop {
                sleep(Duration::from_millis(20)).await;
                let _ = feeder.push_orientation_sample(RawOrientationSample::new(90.0, 10.0, 5.0));
            }
        });

        let control = device_orientation(Arc::clone(&registry), CalibrationMode::Passthrough)
            .await
            .unwrap();

        let euler = control.fixed_frame_euler();
        assert!((euler.alpha - 90.0).abs() < 1e-6);
        assert!(registry.is_active(SensorKind::Orientation).unwrap());
    }

    #[tokio::test]
    async fn test_device_motion_reports_unsupported_and_unwinds() {
        let registry = Arc::new(SensorRegistry::new());

        let result = device_motion(Arc::clone(&registry)).await;
        assert_eq!(result.err(), Some(SensorError::NotSupported(SensorKind::Motion)));

        // the failed session unsubscribed itself again
        assert!(!registry.is_active(SensorKind::Motion).unwrap());
        assert_eq!(registry.subscriber_count(SensorKind::Motion).unwrap(), 0);
    }
}
