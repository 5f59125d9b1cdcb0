//! Configuration errors for the navcore library
//!
//! Runtime faults (malformed bytes, checksum mismatches, missing sensor
//! samples) are absorbed by the scanner and the filters and only show up as
//! stale output. The only errors surfaced to callers are rejected settings
//! at construction time.

/// Errors reported when settings are validated
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum Error {
    /// Smoothing constant must lie strictly between 0 and 1
    #[error("smoothing constant {0} is outside (0, 1)")]
    SmoothingOutOfRange(f32),

    /// Gravity magnitude must be finite and positive
    #[error("gravity magnitude {0} is not a positive number")]
    InvalidGravity(f32),

    /// Launch threshold must be finite
    #[error("launch threshold {0} is not finite")]
    InvalidThreshold(f32),

    /// Calibration estimators need at least one sample
    #[error("calibration needs at least one sample")]
    ZeroSampleCount,
}

pub type Result<T> = std::result::Result<T, Error>;
