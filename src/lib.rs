//! navcore - GNSS stream parsing and attitude fusion for handheld performance meters
//!
//! This library is the sensor-interpretation core of a handheld navigation
//! and acceleration-measurement device. It turns the raw serial output of a
//! GNSS receiver and raw inertial/magnetic samples into position, speed,
//! attitude, heading and gravity-compensated acceleration.
//!
//! # Features
//!
//! - Resumable byte scanner for interleaved NMEA sentences and UBX binary frames
//! - GGA/RMC/GSV/GSA decoding into a position fix and a satellite table
//! - UBX ACK/NAK tracking and CFG-VALSET command generation
//! - Gravity separation and complementary roll/pitch filter
//! - Tilt-compensated magnetic heading
//! - Accelerometer and magnetometer calibration estimators
//! - Whole-snapshot publication to any number of readers
//!
//! # Quick Start
//!
//! ```rust
//! use nalgebra::Vector3;
//! use navcore::{FusionEngine, GnssReceiver, GnssSettings, ImuSample, MagSample};
//!
//! // Receiver side
//! let mut receiver = GnssReceiver::new(GnssSettings::default());
//! let gnss = receiver.subscribe();
//! receiver.ingest(b"$GPGGA,120000,,,,,1,08,,12.3,M,,M,,\r\n", 1000);
//! assert_eq!(gnss.snapshot().fix.satellites, 8);
//!
//! // Sensor side
//! let mut engine = FusionEngine::new();
//! let attitude = engine.subscribe();
//! let imu = ImuSample::new(Vector3::new(0.0, 0.0, 9.81), Vector3::new(0.0, 0.0, 5.0), 1000);
//! let mag = MagSample::new(Vector3::new(20.0, 0.0, -40.0));
//! engine.update(Some(&imu), Some(&mag), 0.1); // 10 Hz
//!
//! let output = attitude.snapshot();
//! println!("heading {:.1}°, forward {:.2} g", output.heading, output.forward_g);
//! ```

pub mod attitude;
pub mod calibration;
pub mod checksum;
pub mod compass;
mod error;
pub mod fusion;
pub mod gnss;
pub mod gravity;
mod math;
pub mod nmea;
pub mod publish;
pub mod satellites;
pub mod scanner;
pub mod source;
mod types;
pub mod ubx;

// Re-export the types most callers need
pub use attitude::AttitudeFilter;
pub use calibration::{AccelOffsetEstimator, MagRangeEstimator, SensorCalibration};
pub use error::{Error, Result};
pub use fusion::{FusedAttitude, FusionEngine};
pub use gnss::{GnssReceiver, GnssSnapshot, PositionFix};
pub use gravity::GravitySeparator;
pub use math::{DEG_TO_RAD, RAD_TO_DEG, Vector3Ext};
pub use publish::{Publisher, SnapshotReader};
pub use satellites::{MAX_SATELLITES, SatelliteRecord, SatelliteTable};
pub use scanner::{Record, Scanner, ScannerStats};
pub use source::{ByteSource, ReaderSource, SensorSource};
pub use types::*;
pub use ubx::{ProtocolFrame, UbxCommands, UbxMessage};
