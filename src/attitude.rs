//! Complementary attitude filter for the navcore library

use nalgebra::Vector3;

use crate::compass::tilt_compensated_heading;
use crate::math::RAD_TO_DEG;

/// First-order complementary filter for roll and pitch
///
/// Gyroscope rates are integrated every update and blended with the tilt
/// the accelerometer implies. The gyroscope dominates short-term motion;
/// the accelerometer slowly pulls roll and pitch back to the gravity
/// direction. Yaw has no absolute reference and is integrated only, so it
/// drifts with gyroscope bias.
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use navcore::AttitudeFilter;
///
/// let mut filter = AttitudeFilter::new(0.98);
/// for _ in 0..100 {
///     filter.update(Vector3::new(0.0, 0.0, 9.81), Vector3::new(0.0, 0.0, 90.0), 0.01);
/// }
/// assert!((filter.yaw() - 90.0).abs() < 1e-2);
/// assert!(filter.roll().abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttitudeFilter {
    /// Weight given to the integrated gyroscope estimate
    alpha: f32,
    /// Roll estimate in degrees
    roll: f32,
    /// Pitch estimate in degrees
    pitch: f32,
    /// Integrated yaw in degrees, not wrapped
    yaw: f32,
}

impl AttitudeFilter {
    /// Create a filter starting level with smoothing constant `alpha` in (0, 1)
    pub fn new(alpha: f32) -> Self {
        Self {
            alpha,
            roll: 0.0,
            pitch: 0.0,
            yaw: 0.0,
        }
    }

    /// Reset all angles to zero
    pub fn reset(&mut self) {
        self.roll = 0.0;
        self.pitch = 0.0;
        self.yaw = 0.0;
    }

    /// Update with one accelerometer and gyroscope sample
    ///
    /// # Arguments
    /// * `accel` - Accelerometer reading in m/s² (any consistent unit works)
    /// * `gyro` - Gyroscope reading in degrees per second
    /// * `delta_time` - Time step in seconds
    pub fn update(&mut self, accel: Vector3<f32>, gyro: Vector3<f32>, delta_time: f32) {
        let (accel_roll, accel_pitch) = accelerometer_tilt(accel);

        self.roll += gyro.x * delta_time;
        self.pitch += gyro.y * delta_time;
        self.yaw += gyro.z * delta_time;

        self.roll = self.alpha * self.roll + (1.0 - self.alpha) * accel_roll;
        self.pitch = self.alpha * self.pitch + (1.0 - self.alpha) * accel_pitch;
    }

    /// Tilt-compensated heading for a magnetometer reading at the current attitude
    pub fn heading(&self, magnetometer: Vector3<f32>) -> Option<f32> {
        tilt_compensated_heading(magnetometer, self.roll, self.pitch)
    }

    pub fn roll(&self) -> f32 {
        self.roll
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

}

/// Roll and pitch in degrees implied by the gravity direction alone
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use navcore::attitude::accelerometer_tilt;
///
/// let (roll, pitch) = accelerometer_tilt(Vector3::new(0.0, 9.81, 0.0));
/// assert!((roll - 90.0).abs() < 1e-4);
/// assert!(pitch.abs() < 1e-4);
/// ```
pub fn accelerometer_tilt(accel: Vector3<f32>) -> (f32, f32) {
    let roll = accel.y.atan2(accel.z) * RAD_TO_DEG;
    let pitch = (-accel.x).atan2((accel.y * accel.y + accel.z * accel.z).sqrt()) * RAD_TO_DEG;
    (roll, pitch)
}
