//! Fusion of inertial and magnetic samples into the published attitude
//!
//! [`FusionEngine`] runs one cycle per IMU sample: calibration, gravity
//! separation, the complementary attitude filter and, when a magnetometer
//! sample is available, the tilt-compensated heading. The complete
//! [`FusedAttitude`] is then published in one piece.

use log::{debug, trace, warn};
use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::attitude::AttitudeFilter;
use crate::calibration::SensorCalibration;
use crate::error::Result;
use crate::gravity::GravitySeparator;
use crate::math::Vector3Ext;
use crate::publish::{Publisher, SnapshotReader};
use crate::source::SensorSource;
use crate::types::{FusionSettings, ImuSample, MagSample};

/// Result of one fusion cycle
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FusedAttitude {
    /// Low-pass gravity estimate in the sensor frame (m/s²)
    pub gravity: Vector3<f32>,
    /// Acceleration with gravity removed (m/s²)
    pub linear_acceleration: Vector3<f32>,
    /// Degrees
    pub roll: f32,
    /// Degrees
    pub pitch: f32,
    /// Integrated gyroscope yaw in degrees, drifts and is not wrapped
    pub yaw: f32,
    /// Magnetic heading in degrees within [0, 360)
    pub heading: f32,
    /// False until a magnetometer sample produced a heading
    pub heading_valid: bool,
    /// Linear acceleration along the forward (X) axis in g
    pub forward_g: f32,
    /// Timestamp of the IMU sample that produced this output
    pub timestamp_ms: u32,
}

impl FusedAttitude {
    /// Whether forward acceleration is above `threshold_g`
    ///
    /// # Example
    /// ```
    /// use navcore::FusedAttitude;
    ///
    /// let output = FusedAttitude { forward_g: 0.2, ..Default::default() };
    /// assert!(output.exceeds_forward_g(0.15));
    /// assert!(!output.exceeds_forward_g(0.25));
    /// ```
    pub fn exceeds_forward_g(&self, threshold_g: f32) -> bool {
        self.forward_g > threshold_g
    }
}

/// Owner of the fusion state
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use navcore::{FusionEngine, ImuSample, MagSample};
///
/// let mut engine = FusionEngine::new();
/// let reader = engine.subscribe();
///
/// let imu = ImuSample::new(Vector3::new(0.0, 0.0, 9.81), Vector3::zeros(), 100);
/// let mag = MagSample::new(Vector3::new(20.0, 0.0, -40.0));
/// assert!(engine.update(Some(&imu), Some(&mag), 0.1));
///
/// let output = reader.snapshot();
/// assert_eq!(output.timestamp_ms, 100);
/// assert!(output.heading_valid);
/// assert!(output.heading.abs() < 1e-3);
/// ```
pub struct FusionEngine {
    settings: FusionSettings,
    calibration: SensorCalibration,
    gravity: GravitySeparator,
    attitude: AttitudeFilter,
    output: FusedAttitude,
    skipped_cycles: u32,
    publisher: Publisher<FusedAttitude>,
}

impl Default for FusionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FusionEngine {
    /// Create an engine with default settings
    pub fn new() -> Self {
        Self::build(FusionSettings::default())
    }

    /// Create an engine with validated settings
    pub fn with_settings(settings: FusionSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self::build(settings))
    }

    fn build(settings: FusionSettings) -> Self {
        Self {
            settings,
            calibration: SensorCalibration::default(),
            gravity: GravitySeparator::new(settings.alpha),
            attitude: AttitudeFilter::new(settings.alpha),
            output: FusedAttitude::default(),
            skipped_cycles: 0,
            publisher: Publisher::new(FusedAttitude::default()),
        }
    }

    /// Apply `calibration` to every sample from now on
    pub fn with_calibration(mut self, calibration: SensorCalibration) -> Self {
        self.calibration = calibration;
        self
    }

    pub fn set_calibration(&mut self, calibration: SensorCalibration) {
        self.calibration = calibration;
    }

    pub fn calibration(&self) -> &SensorCalibration {
        &self.calibration
    }

    pub fn settings(&self) -> &FusionSettings {
        &self.settings
    }

    /// Reader handle for published outputs
    pub fn subscribe(&self) -> SnapshotReader<FusedAttitude> {
        self.publisher.reader()
    }

    /// Output of the last completed cycle
    pub fn output(&self) -> &FusedAttitude {
        &self.output
    }

    /// Cycles skipped for lack of a usable IMU sample
    pub fn skipped_cycles(&self) -> u32 {
        self.skipped_cycles
    }

    /// Forward acceleration of the last cycle is above the launch threshold
    pub fn launch_detected(&self) -> bool {
        self.output.exceeds_forward_g(self.settings.launch_threshold_g)
    }

    /// Run one fusion cycle
    ///
    /// A missing or non-finite IMU sample skips the cycle and keeps the
    /// previous output. A missing or unusable magnetometer sample only
    /// keeps the previous heading. A negative or non-finite `delta_time`
    /// integrates nothing.
    ///
    /// Returns true when a new output was published.
    pub fn update(
        &mut self,
        imu: Option<&ImuSample>,
        mag: Option<&MagSample>,
        delta_time: f32,
    ) -> bool {
        let Some(imu) = imu else {
            debug!("no IMU sample, fusion cycle skipped");
            self.skipped_cycles += 1;
            return false;
        };

        let imu = self.calibration.apply_imu(imu);
        if !imu.accel.all_finite() || !imu.gyro.all_finite() {
            warn!("non-finite IMU sample at {} ms, fusion cycle skipped", imu.timestamp_ms);
            self.skipped_cycles += 1;
            return false;
        }

        let delta_time = if delta_time.is_finite() && delta_time >= 0.0 {
            delta_time
        } else {
            warn!("invalid time step {}, gyroscope not integrated", delta_time);
            0.0
        };

        let linear = self.gravity.update(imu.accel);
        self.attitude.update(imu.accel, imu.gyro, delta_time);

        let mut output = FusedAttitude {
            gravity: self.gravity.gravity(),
            linear_acceleration: linear,
            roll: self.attitude.roll(),
            pitch: self.attitude.pitch(),
            yaw: self.attitude.yaw(),
            heading: self.output.heading,
            heading_valid: self.output.heading_valid,
            forward_g: linear.x / self.settings.gravity,
            timestamp_ms: imu.timestamp_ms,
        };

        match mag.map(|sample| self.calibration.apply_mag(sample)) {
            Some(sample) => match self.attitude.heading(sample.field) {
                Some(heading) => {
                    output.heading = heading;
                    output.heading_valid = true;
                }
                None => trace!("unusable magnetometer sample, heading kept"),
            },
            None => trace!("no magnetometer sample, heading kept"),
        }

        self.output = output;
        self.publisher.publish(output);
        true
    }

    /// Pull one sample of each kind from `source` and run a cycle
    pub fn tick<S: SensorSource + ?Sized>(&mut self, source: &mut S, delta_time: f32) -> bool {
        let imu = source.read_imu();
        let mag = source.read_mag();
        self.update(imu.as_ref(), mag.as_ref(), delta_time)
    }

    /// Forget all filter state; calibration and settings are kept
    pub fn reset(&mut self) {
        self.gravity.reset();
        self.attitude.reset();
        self.output = FusedAttitude::default();
        self.publisher.publish(self.output);
    }
}
