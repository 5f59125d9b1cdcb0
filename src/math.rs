//! Mathematical utilities and nalgebra extensions for the navcore library

use nalgebra::Vector3;

/// Mathematical constants
pub const DEG_TO_RAD: f32 = core::f32::consts::PI / 180.0;
pub const RAD_TO_DEG: f32 = 180.0 / core::f32::consts::PI;

/// Extension trait for Vector3 operations
pub trait Vector3Ext {
    /// True when every component is neither NaN nor infinite
    fn all_finite(&self) -> bool;

    /// True when every component is exactly zero
    fn all_zero(&self) -> bool;
}

impl Vector3Ext for Vector3<f32> {
    fn all_finite(&self) -> bool {
        self.iter().all(|c| c.is_finite())
    }

    fn all_zero(&self) -> bool {
        self.iter().all(|&c| c == 0.0)
    }
}
