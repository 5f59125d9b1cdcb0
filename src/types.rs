//! Core types and settings for the navcore library

use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Standard gravity used to express forward acceleration in g
pub const STANDARD_GRAVITY: f32 = 9.81;

/// Satellite navigation system a satellite belongs to
///
/// Derived from the talker id of the GSV sentence that reported the satellite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Constellation {
    /// US GPS (talker `GP`, also the fallback for unrecognised talkers)
    #[default]
    Gps,
    /// Russian GLONASS (talker `GL`)
    Glonass,
    /// European Galileo (talker `GA`)
    Galileo,
    /// Chinese BeiDou (talker `BD` or `GB`)
    Beidou,
    /// Not attributable to a constellation
    Unknown,
}

impl Constellation {
    /// Map an NMEA talker id to a constellation
    ///
    /// # Example
    /// ```
    /// use navcore::Constellation;
    ///
    /// assert_eq!(Constellation::from_talker("GL"), Constellation::Glonass);
    /// assert_eq!(Constellation::from_talker("GN"), Constellation::Gps);
    /// ```
    pub fn from_talker(talker: &str) -> Self {
        match talker {
            "GL" => Constellation::Glonass,
            "GA" => Constellation::Galileo,
            "BD" | "GB" => Constellation::Beidou,
            _ => Constellation::Gps,
        }
    }

    /// Short display name used by the satellite view
    pub fn name(self) -> &'static str {
        match self {
            Constellation::Gps => "GPS",
            Constellation::Glonass => "GLO",
            Constellation::Galileo => "GAL",
            Constellation::Beidou => "BDS",
            Constellation::Unknown => "UNK",
        }
    }

    pub(crate) fn bit(self) -> u8 {
        match self {
            Constellation::Gps => 1,
            Constellation::Glonass => 1 << 1,
            Constellation::Galileo => 1 << 2,
            Constellation::Beidou => 1 << 3,
            Constellation::Unknown => 1 << 4,
        }
    }
}

/// Tracking state of a satellite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SatelliteStatus {
    /// Known but no signal reported
    #[default]
    Searching,
    /// Reported by GSV with a signal strength
    Tracking,
    /// Listed by GSA as part of the navigation solution
    Used,
}

/// Sensor fusion settings
///
/// The same smoothing constant drives both the gravity low-pass filter and
/// the roll/pitch complementary blend.
///
/// # Example
/// ```
/// use navcore::FusionSettings;
///
/// let settings = FusionSettings {
///     alpha: 0.95,              // faster adaptation
///     launch_threshold_g: 0.2,
///     ..Default::default()
/// };
/// assert!(settings.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FusionSettings {
    /// Smoothing constant in (0, 1), close to 1 for slow adaptation (typically 0.98)
    pub alpha: f32,
    /// Gravity magnitude in m/s² used to convert forward acceleration to g
    pub gravity: f32,
    /// Forward acceleration in g above which a performance run is considered started
    pub launch_threshold_g: f32,
}

impl FusionSettings {
    /// Check every field is usable
    pub fn validate(&self) -> Result<()> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(Error::SmoothingOutOfRange(self.alpha));
        }
        if !(self.gravity.is_finite() && self.gravity > 0.0) {
            return Err(Error::InvalidGravity(self.gravity));
        }
        if !self.launch_threshold_g.is_finite() {
            return Err(Error::InvalidThreshold(self.launch_threshold_g));
        }
        Ok(())
    }
}

impl Default for FusionSettings {
    fn default() -> Self {
        Self {
            alpha: 0.98,
            gravity: STANDARD_GRAVITY,
            launch_threshold_g: 0.15,
        }
    }
}

/// GNSS receiver settings
///
/// Defaults: no checksum enforcement, RMC used
/// only as a heartbeat and satellites kept until overwritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GnssSettings {
    /// Drop binary frames with a bad checksum and NMEA sentences without a valid `*hh`
    pub strict_checksum: bool,
    /// Decode position, speed, course and date from RMC instead of using it as a heartbeat
    pub rmc_navigation: bool,
    /// Remove satellites not reported for longer than this many milliseconds
    pub satellite_max_age_ms: Option<u32>,
}

/// One inertial sample
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ImuSample {
    /// Acceleration in m/s²
    pub accel: Vector3<f32>,
    /// Angular rate in degrees per second
    pub gyro: Vector3<f32>,
    /// Device time in milliseconds
    pub timestamp_ms: u32,
}

impl ImuSample {
    pub fn new(accel: Vector3<f32>, gyro: Vector3<f32>, timestamp_ms: u32) -> Self {
        Self {
            accel,
            gyro,
            timestamp_ms,
        }
    }
}

/// One magnetometer sample in µT
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MagSample {
    pub field: Vector3<f32>,
}

impl MagSample {
    pub fn new(field: Vector3<f32>) -> Self {
        Self { field }
    }
}
