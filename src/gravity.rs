//! Gravity / linear acceleration separation
//!
//! A first-order low-pass filter tracks the slowly varying gravity component
//! of the accelerometer signal; whatever the filter does not follow is
//! reported as linear acceleration. Sustained acceleration slowly leaks into
//! the gravity estimate, which is the accepted cost of an O(1) filter.

use nalgebra::Vector3;

/// Low-pass gravity estimator
///
/// # Example
/// ```
/// use nalgebra::Vector3;
/// use navcore::GravitySeparator;
///
/// let mut separator = GravitySeparator::new(0.98);
/// let linear = separator.update(Vector3::new(0.0, 0.0, 9.81));
/// assert_eq!(linear, Vector3::zeros()); // first sample seeds gravity
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GravitySeparator {
    alpha: f32,
    gravity: Vector3<f32>,
    linear: Vector3<f32>,
    seeded: bool,
}

impl GravitySeparator {
    /// Create a separator with smoothing constant `alpha` in (0, 1)
    pub fn new(alpha: f32) -> Self {
        Self {
            alpha,
            gravity: Vector3::zeros(),
            linear: Vector3::zeros(),
            seeded: false,
        }
    }

    /// Filter one accelerometer sample and return the linear residual
    pub fn update(&mut self, accel: Vector3<f32>) -> Vector3<f32> {
        if self.seeded {
            self.gravity = self.gravity * self.alpha + accel * (1.0 - self.alpha);
        } else {
            self.gravity = accel;
            self.seeded = true;
        }
        self.linear = accel - self.gravity;
        self.linear
    }

    pub fn gravity(&self) -> Vector3<f32> {
        self.gravity
    }

    pub fn linear_acceleration(&self) -> Vector3<f32> {
        self.linear
    }

    /// Forget the gravity estimate; the next sample seeds it again
    pub fn reset(&mut self) {
        self.gravity = Vector3::zeros();
        self.linear = Vector3::zeros();
        self.seeded = false;
    }
}
