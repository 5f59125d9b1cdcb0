//! Sensor calibration for the navcore library
//!
//! Corrections are applied to raw samples before fusion. The estimators
//! derive them from a run of samples: a stationary run for the
//! accelerometer, a figure-eight rotation for the magnetometer. Persisting
//! the results is up to the caller.

use log::info;
use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{ImuSample, MagSample, STANDARD_GRAVITY};

/// Stationary samples averaged for the accelerometer offset
pub const DEFAULT_ACCEL_SAMPLES: u32 = 1000;
/// Samples tracked for the magnetometer range
pub const DEFAULT_MAG_SAMPLES: u32 = 500;

/// Applies the accelerometer offset
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use navcore::calibration::calibrate_accelerometer;
///
/// let raw = Vector3::new(0.1, -0.2, 9.9);
/// let offset = Vector3::new(0.1, -0.2, 0.09);
/// let corrected = calibrate_accelerometer(raw, offset);
/// assert!((corrected - Vector3::new(0.0, 0.0, 9.81)).magnitude() < 1e-5);
/// ```
pub fn calibrate_accelerometer(raw: Vector3<f32>, offset: Vector3<f32>) -> Vector3<f32> {
    raw - offset
}

/// Applies hard-iron offset and per-axis scale
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use navcore::calibration::calibrate_magnetometer;
///
/// let raw = Vector3::new(30.0, -10.0, 45.0);
/// let hard_iron = Vector3::new(10.0, -20.0, 5.0);
/// let scale = Vector3::new(1.0, 2.0, 0.5);
///
/// let corrected = calibrate_magnetometer(raw, hard_iron, scale);
/// assert_eq!(corrected, Vector3::new(20.0, 20.0, 20.0));
/// ```
pub fn calibrate_magnetometer(
    raw: Vector3<f32>,
    hard_iron: Vector3<f32>,
    scale: Vector3<f32>,
) -> Vector3<f32> {
    (raw - hard_iron).component_mul(&scale)
}

/// Calibration values applied by the fusion engine
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SensorCalibration {
    /// Subtracted from every accelerometer sample (m/s²)
    pub accel_offset: Vector3<f32>,
    /// Subtracted from every magnetometer sample (µT)
    pub mag_hard_iron: Vector3<f32>,
    /// Multiplied into every magnetometer sample after the offset
    pub mag_scale: Vector3<f32>,
}

impl Default for SensorCalibration {
    fn default() -> Self {
        Self {
            accel_offset: Vector3::zeros(),
            mag_hard_iron: Vector3::zeros(),
            mag_scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

impl SensorCalibration {
    pub fn apply_imu(&self, sample: &ImuSample) -> ImuSample {
        ImuSample {
            accel: calibrate_accelerometer(sample.accel, self.accel_offset),
            ..*sample
        }
    }

    pub fn apply_mag(&self, sample: &MagSample) -> MagSample {
        MagSample {
            field: calibrate_magnetometer(sample.field, self.mag_hard_iron, self.mag_scale),
        }
    }
}

/// Accumulates stationary samples into an accelerometer offset
///
/// The device must lie flat and still; the offset removes everything but
/// gravity on the Z axis.
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use navcore::calibration::AccelOffsetEstimator;
///
/// let mut estimator = AccelOffsetEstimator::new(2).unwrap();
/// assert_eq!(estimator.add_sample(Vector3::new(0.2, 0.0, 10.0)), None);
/// let offset = estimator.add_sample(Vector3::new(0.0, 0.2, 10.0)).unwrap();
/// assert!((offset - Vector3::new(0.1, 0.1, 0.19)).magnitude() < 1e-5);
/// ```
#[derive(Debug, Clone)]
pub struct AccelOffsetEstimator {
    required: u32,
    collected: u32,
    gravity: f32,
    sum: Vector3<f32>,
}

impl AccelOffsetEstimator {
    pub fn new(required: u32) -> Result<Self> {
        Self::with_gravity(required, STANDARD_GRAVITY)
    }

    pub fn with_gravity(required: u32, gravity: f32) -> Result<Self> {
        if required == 0 {
            return Err(Error::ZeroSampleCount);
        }
        if !(gravity.is_finite() && gravity > 0.0) {
            return Err(Error::InvalidGravity(gravity));
        }
        Ok(Self {
            required,
            collected: 0,
            gravity,
            sum: Vector3::zeros(),
        })
    }

    /// Add one sample; returns the offset once enough samples were seen
    pub fn add_sample(&mut self, accel: Vector3<f32>) -> Option<Vector3<f32>> {
        if self.collected < self.required {
            self.sum += accel;
            self.collected += 1;
            if self.collected == self.required {
                let offset = self.offset()?;
                info!(
                    "accelerometer calibration complete: X={:.3} Y={:.3} Z={:.3}",
                    offset.x, offset.y, offset.z
                );
            }
        }
        self.offset()
    }

    /// Offset, available once every required sample was collected
    pub fn offset(&self) -> Option<Vector3<f32>> {
        if self.collected < self.required {
            return None;
        }
        let mean = self.sum / self.collected as f32;
        Some(mean - Vector3::new(0.0, 0.0, self.gravity))
    }

    /// Completion in percent
    pub fn progress(&self) -> u8 {
        (u64::from(self.collected) * 100 / u64::from(self.required)) as u8
    }

    pub fn is_complete(&self) -> bool {
        self.collected >= self.required
    }
}

impl Default for AccelOffsetEstimator {
    fn default() -> Self {
        Self {
            required: DEFAULT_ACCEL_SAMPLES,
            collected: 0,
            gravity: STANDARD_GRAVITY,
            sum: Vector3::zeros(),
        }
    }
}

/// Tracks per-axis extremes into a hard-iron offset and scale
///
/// The device should be rotated through every orientation while samples
/// are collected.
#[derive(Debug, Clone)]
pub struct MagRangeEstimator {
    required: u32,
    collected: u32,
    min: Vector3<f32>,
    max: Vector3<f32>,
}

impl MagRangeEstimator {
    pub fn new(required: u32) -> Result<Self> {
        if required == 0 {
            return Err(Error::ZeroSampleCount);
        }
        Ok(Self {
            required,
            ..Default::default()
        })
    }

    /// Add one sample; returns `(hard_iron, scale)` once enough samples were seen
    pub fn add_sample(&mut self, field: Vector3<f32>) -> Option<(Vector3<f32>, Vector3<f32>)> {
        if self.collected < self.required {
            self.min = self.min.inf(&field);
            self.max = self.max.sup(&field);
            self.collected += 1;
            if self.collected == self.required {
                let (offset, scale) = self.calibration()?;
                info!(
                    "magnetometer calibration complete: offset=({:.2},{:.2},{:.2}) scale=({:.3},{:.3},{:.3})",
                    offset.x, offset.y, offset.z, scale.x, scale.y, scale.z
                );
            }
        }
        self.calibration()
    }

    /// Hard-iron offset (range center) and scale (mean range over axis range)
    ///
    /// An axis that never moved gets a scale of 1.
    pub fn calibration(&self) -> Option<(Vector3<f32>, Vector3<f32>)> {
        if self.collected < self.required {
            return None;
        }
        let offset = (self.max + self.min) / 2.0;
        let range = self.max - self.min;
        let mean_range = range.sum() / 3.0;
        let scale = range.map(|r| if r > 0.0 { mean_range / r } else { 1.0 });
        Some((offset, scale))
    }

    /// Completion in percent
    pub fn progress(&self) -> u8 {
        (u64::from(self.collected) * 100 / u64::from(self.required)) as u8
    }

    pub fn is_complete(&self) -> bool {
        self.collected >= self.required
    }
}

impl Default for MagRangeEstimator {
    fn default() -> Self {
        Self {
            required: DEFAULT_MAG_SAMPLES,
            collected: 0,
            min: Vector3::repeat(f32::INFINITY),
            max: Vector3::repeat(f32::NEG_INFINITY),
        }
    }
}
