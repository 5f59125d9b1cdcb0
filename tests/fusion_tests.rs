use nalgebra::Vector3;
use navcore::{
    AccelOffsetEstimator, FusedAttitude, FusionEngine, FusionSettings, GravitySeparator,
    ImuSample, MagRangeEstimator, MagSample, SensorCalibration, SensorSource,
};
use serde::Deserialize;
use std::collections::VecDeque;
use std::error::Error;

const EPSILON: f32 = 1e-4;
const TRACE: &str = "testdata/imu_trace.csv";
const TRACE_PERIOD: f32 = 0.1;

#[derive(Debug, Deserialize)]
struct TraceRow {
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

impl TraceRow {
    fn imu(&self) -> ImuSample {
        ImuSample::new(
            Vector3::new(self.accel_x, self.accel_y, self.accel_z),
            Vector3::new(self.gyro_x, self.gyro_y, self.gyro_z),
            (self.time * 1000.0).round() as u32,
        )
    }

    fn mag(&self) -> MagSample {
        MagSample::new(Vector3::new(self.mag_x, self.mag_y, self.mag_z))
    }
}

fn load_trace() -> Result<Vec<TraceRow>, Box<dyn Error>> {
    let mut reader = csv::Reader::from_path(TRACE)?;
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

/// Replays queued samples; an empty slot is a failed read
struct ScriptedSensors {
    imu: VecDeque<Option<ImuSample>>,
    mag: VecDeque<Option<MagSample>>,
}

impl SensorSource for ScriptedSensors {
    fn read_imu(&mut self) -> Option<ImuSample> {
        self.imu.pop_front().flatten()
    }

    fn read_mag(&mut self) -> Option<MagSample> {
        self.mag.pop_front().flatten()
    }
}

/// Stationary, launch and turn phases of the recorded trace
#[test]
fn test_trace_phases() -> Result<(), Box<dyn Error>> {
    let rows = load_trace()?;
    assert_eq!(rows.len(), 60);

    let mut engine = FusionEngine::new();
    let mut outputs: Vec<FusedAttitude> = Vec::new();
    let mut launches = Vec::new();

    for (index, row) in rows.iter().enumerate() {
        assert!(engine.update(Some(&row.imu()), Some(&row.mag()), TRACE_PERIOD));
        outputs.push(*engine.output());
        if engine.launch_detected() {
            launches.push(index);
        }
    }

    // 0.3 g applied from 2.0 s to 4.0 s
    assert_eq!(launches, (20..40).collect::<Vec<_>>());

    // stationary and facing north
    let settled = &outputs[19];
    assert!(settled.heading_valid);
    assert!(
        settled.heading < 2.0 || settled.heading > 358.0,
        "heading {}",
        settled.heading
    );
    assert!(settled.forward_g.abs() < 0.01);

    // 45 deg/s for 2 s, yaw is pure integration
    let last = outputs.last().unwrap();
    assert!((last.yaw - 90.0).abs() < 1.0, "yaw {}", last.yaw);
    assert!((last.heading - 90.0).abs() < 15.0, "heading {}", last.heading);
    assert_eq!(last.timestamp_ms, 5900);
    Ok(())
}

/// Every output is finite and heading stays in range
#[test]
fn test_trace_numerical_stability() -> Result<(), Box<dyn Error>> {
    let rows = load_trace()?;
    let mut engine = FusionEngine::new();

    for row in &rows {
        engine.update(Some(&row.imu()), Some(&row.mag()), TRACE_PERIOD);
        let output = engine.output();
        assert!(output.gravity.iter().all(|c| c.is_finite()));
        assert!(output.linear_acceleration.iter().all(|c| c.is_finite()));
        assert!(output.roll.is_finite() && output.pitch.is_finite() && output.yaw.is_finite());
        assert!((0.0..360.0).contains(&output.heading));
    }
    Ok(())
}

/// Constant gravity converges for any smoothing constant
#[test]
fn test_gravity_convergence_for_any_alpha() {
    for alpha in [0.1, 0.5, 0.9, 0.98] {
        let mut separator = GravitySeparator::new(alpha);
        separator.update(Vector3::new(0.5, -0.5, 9.0));
        for _ in 0..2000 {
            separator.update(Vector3::new(0.0, 0.0, 9.81));
        }
        assert!((separator.gravity() - Vector3::new(0.0, 0.0, 9.81)).magnitude() < 1e-2);
        assert!(separator.linear_acceleration().magnitude() < 1e-2);
    }
}

/// 90 deg/s for one second at 100 Hz accumulates 90 degrees of yaw
#[test]
fn test_yaw_rate_integration() {
    let mut engine = FusionEngine::new();
    let sample = ImuSample::new(Vector3::new(0.0, 0.0, 9.81), Vector3::new(0.0, 0.0, 90.0), 0);
    for _ in 0..100 {
        engine.update(Some(&sample), None, 0.01);
    }
    assert!((engine.output().yaw - 90.0).abs() < 0.01);
}

/// IMU and magnetometer failures are independent
#[test]
fn test_sensor_failure_domains() {
    let level = ImuSample::new(Vector3::new(0.0, 0.0, 9.81), Vector3::zeros(), 0);
    let east = MagSample::new(Vector3::new(0.0, 20.0, -40.0));

    let mut sensors = ScriptedSensors {
        imu: VecDeque::from([
            Some(level),
            Some(ImuSample {
                timestamp_ms: 100,
                ..level
            }),
            None,
        ]),
        mag: VecDeque::from([Some(east), None, Some(east)]),
    };

    let mut engine = FusionEngine::new();
    let reader = engine.subscribe();

    assert!(engine.tick(&mut sensors, 0.1));
    assert!((reader.snapshot().heading - 90.0).abs() < EPSILON * 10.0);

    // magnetometer missing: fresh attitude, old heading
    assert!(engine.tick(&mut sensors, 0.1));
    let snapshot = reader.snapshot();
    assert_eq!(snapshot.timestamp_ms, 100);
    assert!((snapshot.heading - 90.0).abs() < EPSILON * 10.0);

    // IMU missing: nothing published
    assert!(!engine.tick(&mut sensors, 0.1));
    assert_eq!(reader.snapshot().timestamp_ms, 100);
}

/// Calibration estimated from samples corrects later samples
#[test]
fn test_calibration_round_trip() {
    let bias = Vector3::new(0.3, -0.2, 0.5);
    let mut accel = AccelOffsetEstimator::new(10).unwrap();
    let mut offset = None;
    for _ in 0..10 {
        offset = accel.add_sample(Vector3::new(0.0, 0.0, 9.81) + bias);
    }
    let offset = offset.unwrap();
    assert!((offset - bias).magnitude() < EPSILON);

    let mut mag = MagRangeEstimator::new(6).unwrap();
    let hard_iron = Vector3::new(5.0, -3.0, 12.0);
    let mut result = None;
    for axis in 0..3 {
        for sign in [1.0, -1.0] {
            let mut field = Vector3::zeros();
            field[axis] = 40.0 * sign;
            result = mag.add_sample(field + hard_iron);
        }
    }
    let (mag_hard_iron, mag_scale) = result.unwrap();
    assert!((mag_hard_iron - hard_iron).magnitude() < EPSILON);
    assert!((mag_scale - Vector3::new(1.0, 1.0, 1.0)).magnitude() < EPSILON);

    let mut engine = FusionEngine::with_settings(FusionSettings::default())
        .unwrap()
        .with_calibration(SensorCalibration {
            accel_offset: offset,
            mag_hard_iron,
            mag_scale,
        });
    engine.update(
        Some(&ImuSample::new(Vector3::new(0.0, 0.0, 9.81) + bias, Vector3::zeros(), 0)),
        Some(&MagSample::new(Vector3::new(20.0, 0.0, -40.0) + hard_iron)),
        0.1,
    );
    let output = engine.output();
    assert!((output.gravity - Vector3::new(0.0, 0.0, 9.81)).magnitude() < EPSILON);
    assert!(output.heading < 0.01 || output.heading > 359.99);
}
