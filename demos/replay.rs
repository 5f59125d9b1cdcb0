//! Replay recorded sensor and receiver data
//!
//! This example feeds the recorded IMU trace through the fusion engine and
//! the recorded receiver capture through the GNSS receiver, the same way a
//! device main loop would drive them.
//!
//! Features demonstrated:
//! - Accelerometer offset estimation from the stationary start of a run
//! - Launch detection from gravity-compensated forward acceleration
//! - Cooperative polling of a byte source
//! - Reading published snapshots from another thread
//!
//! Run with: `RUST_LOG=info cargo run --example replay [imu.csv] [capture.bin]`

use nalgebra::Vector3;
use navcore::{
    AccelOffsetEstimator, FusionEngine, GnssReceiver, GnssSettings, ImuSample, MagSample,
    ReaderSource, SensorCalibration,
};
use serde::Deserialize;
use std::error::Error;
use std::fs::File;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct SensorData {
    #[serde(rename = "Time (s)")]
    time: f32,
    #[serde(rename = "Gyroscope X (deg/s)")]
    gyro_x: f32,
    #[serde(rename = "Gyroscope Y (deg/s)")]
    gyro_y: f32,
    #[serde(rename = "Gyroscope Z (deg/s)")]
    gyro_z: f32,
    #[serde(rename = "Accelerometer X (m/s^2)")]
    accel_x: f32,
    #[serde(rename = "Accelerometer Y (m/s^2)")]
    accel_y: f32,
    #[serde(rename = "Accelerometer Z (m/s^2)")]
    accel_z: f32,
    #[serde(rename = "Magnetometer X (uT)")]
    mag_x: f32,
    #[serde(rename = "Magnetometer Y (uT)")]
    mag_y: f32,
    #[serde(rename = "Magnetometer Z (uT)")]
    mag_z: f32,
}

/// Samples taken before the device moves
const STATIONARY_SAMPLES: u32 = 10;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let imu_path = args.next().unwrap_or_else(|| "testdata/imu_trace.csv".to_string());
    let capture_path = args
        .next()
        .unwrap_or_else(|| "testdata/receiver_capture.bin".to_string());

    replay_imu(&imu_path)?;
    replay_receiver(&capture_path)?;
    Ok(())
}

fn replay_imu(path: &str) -> Result<(), Box<dyn Error>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut sensor_data = Vec::new();
    for result in reader.deserialize() {
        let record: SensorData = result?;
        sensor_data.push(record);
    }
    println!("Replaying {} IMU samples from {}", sensor_data.len(), path);

    // Estimate the accelerometer offset while the device sits still
    let mut estimator = AccelOffsetEstimator::new(STATIONARY_SAMPLES)?;
    let mut offset = Vector3::zeros();
    for data in &sensor_data {
        if let Some(estimate) =
            estimator.add_sample(Vector3::new(data.accel_x, data.accel_y, data.accel_z))
        {
            offset = estimate;
            break;
        }
    }
    println!(
        "Accelerometer offset: ({:.3}, {:.3}, {:.3}) m/s²",
        offset.x, offset.y, offset.z
    );

    let mut engine = FusionEngine::new().with_calibration(SensorCalibration {
        accel_offset: offset,
        ..Default::default()
    });

    let mut previous_time = None;
    let mut launch_time = None;
    let mut peak_g: f32 = 0.0;

    for data in &sensor_data {
        let delta_time = previous_time.map_or(0.0, |t| data.time - t);
        previous_time = Some(data.time);

        let imu = ImuSample::new(
            Vector3::new(data.accel_x, data.accel_y, data.accel_z),
            Vector3::new(data.gyro_x, data.gyro_y, data.gyro_z),
            (data.time * 1000.0).round() as u32,
        );
        let mag = MagSample::new(Vector3::new(data.mag_x, data.mag_y, data.mag_z));
        engine.update(Some(&imu), Some(&mag), delta_time);

        let output = engine.output();
        peak_g = peak_g.max(output.forward_g);
        if launch_time.is_none() && engine.launch_detected() {
            launch_time = Some(data.time);
        }

        if output.timestamp_ms % 1000 == 0 {
            println!(
                "t={:.1}s roll={:.1}° pitch={:.1}° yaw={:.1}° heading={:.1}° forward={:+.3} g",
                data.time, output.roll, output.pitch, output.yaw, output.heading, output.forward_g
            );
        }
    }

    match launch_time {
        Some(t) => println!("✓ Launch detected at {:.1}s, peak {:.2} g", t, peak_g),
        None => println!("No launch detected, peak {:.2} g", peak_g),
    }
    Ok(())
}

fn replay_receiver(path: &str) -> Result<(), Box<dyn Error>> {
    let mut receiver = GnssReceiver::new(GnssSettings::default());
    let snapshots = receiver.subscribe();
    let mut source = ReaderSource::new(File::open(path)?);
    println!("Replaying receiver capture from {}", path);

    // A display task only ever sees whole snapshots
    let done = Arc::new(AtomicBool::new(false));
    let display = {
        let done = Arc::clone(&done);
        thread::spawn(move || {
            while !done.load(Ordering::Relaxed) {
                let snapshot = snapshots.snapshot();
                println!(
                    "  fix={} sats={} used={} alt={:.1} m",
                    snapshot.fix.fix_valid,
                    snapshot.fix.satellites,
                    snapshot.used_satellites().count(),
                    snapshot.fix.altitude
                );
                thread::sleep(Duration::from_millis(5));
            }
        })
    };

    // 100 ms per poll, as the receiver task on the device runs
    let mut now_ms = 0;
    let mut idle_polls = 0;
    while idle_polls < 3 {
        let records = receiver.poll(&mut source, now_ms);
        idle_polls = if records == 0 { idle_polls + 1 } else { 0 };
        now_ms += 100;
        thread::sleep(Duration::from_millis(2));
    }

    done.store(true, Ordering::Relaxed);
    display.join().map_err(|_| "display thread panicked")?;

    let stats = receiver.stats();
    let fix = receiver.fix();
    println!(
        "✓ {} sentences, {} frames, {} checksum failures",
        stats.sentences, stats.frames, stats.checksum_failures
    );
    println!(
        "✓ Final fix: {:.6}, {:.6} at {:.1} m, {} satellites, HDOP {:.2}",
        fix.latitude, fix.longitude, fix.altitude, fix.satellites, fix.hdop
    );
    for sat in receiver.satellites().iter() {
        println!(
            "  {} {:>3} snr={:>2} el={:>2} az={:>3} {:?}",
            sat.constellation.name(),
            sat.id,
            sat.snr,
            sat.elevation,
            sat.azimuth,
            sat.status
        );
    }
    Ok(())
}
