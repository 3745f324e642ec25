use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use serde_json::json;
use tokio::time::{interval, sleep, Duration};

use device_orientation_rs::{
    device_motion, device_orientation, Axes3, CalibrationMode, RawMotionSample,
    RawOrientationSample, RotationRate, SensorRegistry,
};

#[derive(Parser, Debug)]
#[command(name = "simulate")]
#[command(about = "Synthetic sensor feed - per-frame screen-adjusted readout", long_about = None)]
struct Args {
    /// Duration in seconds
    #[arg(value_name = "SECONDS", default_value = "5")]
    duration: u64,

    /// Calibration mode (game, world, none)
    #[arg(long, default_value = "none")]
    calibration: String,

    /// Sensor sample rate in Hz
    #[arg(long, default_value = "50")]
    rate: u64,

    /// Screen angle to rotate to halfway through (degrees)
    #[arg(long, default_value = "90")]
    rotate_to: i32,

    /// Emit one JSON object per frame instead of text
    #[arg(long)]
    json: bool,
}

/// Synthetic attitude sweep at time `t` seconds.
fn orientation_at(t: f64) -> RawOrientationSample {
    let alpha = (t * 30.0).rem_euclid(360.0);
    let beta = 45.0 * (t * 0.5).sin();
    let gamma = 20.0 * (t * 0.3).sin();
    RawOrientationSample::new(alpha, beta, gamma).with_compass(alpha, 20.0)
}

fn motion_at(t: f64) -> RawMotionSample {
    RawMotionSample::new(
        Axes3::new((t * 2.0).sin() * 0.5, (t * 2.0).cos() * 0.3, 0.1),
        Axes3::new((t * 2.0).sin() * 0.5, (t * 2.0).cos() * 0.3, 9.81),
        RotationRate::new((t * 0.5).sin() * 3.0, 1.5, -0.5),
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mode = match args.calibration.as_str() {
        "game" => CalibrationMode::Game,
        "world" => CalibrationMode::World,
        _ => CalibrationMode::Passthrough,
    };

    println!("Simulate: {}s at {}Hz, calibration {:?}", args.duration, args.rate, mode);

    let registry = Arc::new(
        SensorRegistry::new().with_lifecycle(
            Arc::new(|kind| eprintln!("[platform] {kind} stream subscribed")),
            Arc::new(|kind| eprintln!("[platform] {kind} stream unsubscribed")),
        ),
    );

    // Synthetic platform event source
    let feeder = Arc::clone(&registry);
    let sample_period = Duration::from_millis(1000 / args.rate.max(1));
    let _feeder_handle = tokio::spawn(async move {
        let mut ticker = interval(sample_period);
        let mut sample_count = 0u64;
        let mut t = 0.0f64;
        loop {
            ticker.tick().await;
            t += sample_period.as_secs_f64();
            let _ = feeder.push_orientation_sample(orientation_at(t));
            let _ = feeder.push_motion_sample(motion_at(t));
            sample_count += 1;
            if sample_count % 500 == 0 {
                eprintln!("[feeder] {sample_count} samples");
            }
        }
    });

    let orientation = device_orientation(Arc::clone(&registry), mode).await?;
    let motion = device_motion(Arc::clone(&registry)).await?;

    let motion_events = Arc::new(AtomicU64::new(0));
    let event_count = Arc::clone(&motion_events);
    registry.add_motion_listener(Arc::new(move |_| {
        event_count.fetch_add(1, Ordering::Relaxed);
    }))?;

    // Per-frame readout at ~30fps, flipping the screen halfway through
    let total_frames = args.duration * 30;
    let mut frame_ticker = interval(Duration::from_millis(33));
    let mut rotated = false;

    for frame in 0..total_frames {
        frame_ticker.tick().await;

        if !rotated && frame >= total_frames / 2 {
            registry.screen().set_angle(args.rotate_to)?;
            rotated = true;
            eprintln!("[platform] screen rotated to {} degrees", args.rotate_to);
        }

        let euler = orientation.screen_adjusted_euler();
        let quat = orientation.screen_adjusted_quaternion();
        let accel = motion.screen_adjusted_acceleration();
        let rate = motion.screen_adjusted_rotation_rate();

        if args.json {
            println!(
                "{}",
                json!({
                    "frame": frame,
                    "euler": { "alpha": euler.alpha, "beta": euler.beta, "gamma": euler.gamma },
                    "quaternion": { "x": quat.x, "y": quat.y, "z": quat.z, "w": quat.w },
                    "acceleration": { "x": accel.x, "y": accel.y, "z": accel.z },
                    "rotation_rate": { "alpha": rate.alpha, "beta": rate.beta, "gamma": rate.gamma },
                    "absolute": orientation.is_absolute(),
                })
            );
        } else if frame % 30 == 0 {
            println!(
                "frame {frame:4}  alpha {:7.2}  beta {:7.2}  gamma {:7.2}  accel ({:5.2}, {:5.2}, {:5.2})",
                euler.alpha, euler.beta, euler.gamma, accel.x, accel.y, accel.z
            );
        }
    }

    orientation.stop()?;
    motion.stop()?;

    // let the unsubscribe messages land before exiting
    sleep(Duration::from_millis(50)).await;
    println!(
        "Done: {total_frames} frames, {} motion events",
        motion_events.load(Ordering::Relaxed)
    );
    Ok(())
}
