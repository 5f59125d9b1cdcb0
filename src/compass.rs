//! Tilt-compensated compass for the navcore library

use crate::math::{DEG_TO_RAD, RAD_TO_DEG, Vector3Ext};
use nalgebra::Vector3;

/// Calculate tilt-compensated magnetic heading
///
/// Projects the magnetometer reading onto the horizontal plane using the
/// current roll and pitch estimates, then takes the angle of the projected
/// field.
///
/// # Arguments
/// * `magnetometer` - Calibrated magnetometer reading
/// * `roll` - Roll estimate in degrees
/// * `pitch` - Pitch estimate in degrees
///
/// # Returns
/// Heading in degrees within [0, 360), or `None` when the reading is all
/// zeros or not finite
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use navcore::compass::tilt_compensated_heading;
///
/// let heading = tilt_compensated_heading(Vector3::new(0.0, 20.0, -40.0), 0.0, 0.0).unwrap();
/// assert!((heading - 90.0).abs() < 1e-3);
/// ```
pub fn tilt_compensated_heading(magnetometer: Vector3<f32>, roll: f32, pitch: f32) -> Option<f32> {
    if magnetometer.all_zero() || !magnetometer.all_finite() {
        return None;
    }

    let (sin_roll, cos_roll) = (roll * DEG_TO_RAD).sin_cos();
    let (sin_pitch, cos_pitch) = (pitch * DEG_TO_RAD).sin_cos();
    let (mx, my, mz) = (magnetometer.x, magnetometer.y, magnetometer.z);

    let horizontal_x = mx * cos_pitch + mz * sin_pitch;
    let horizontal_y = mx * sin_roll * sin_pitch + my * cos_roll - mz * sin_roll * cos_pitch;

    let heading = normalize_heading(horizontal_y.atan2(horizontal_x) * RAD_TO_DEG);
    heading.is_finite().then_some(heading)
}

/// Wrap an angle in degrees into [0, 360)
///
/// # Example
/// ```
/// use navcore::compass::normalize_heading;
///
/// assert_eq!(normalize_heading(-90.0), 270.0);
/// assert_eq!(normalize_heading(720.0), 0.0);
/// ```
pub fn normalize_heading(degrees: f32) -> f32 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid rounds tiny negative inputs up to exactly 360
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}
