//! # AHRS - attitude estimation for the gimbal
//!
//! Turns raw MPU-6050 style samples into per-axis angle estimates:
//!
//! - [`projection`]: accelerometer tilt and gyro rate projections of a [`hal::RawSample`]
//! - [`calibration`]: stationary averaging that produces per-axis offsets
//! - [`estimator`]: offset-corrected reads, gyro integration and publishing of the pitch estimate
//!
//! The accelerometer estimate is the authoritative one. Gyro angles are integrated
//! on their own and never blended back in, so they drift without bound over long runs.

pub mod calibration;
pub mod error;
pub mod estimator;
pub mod projection;

pub use calibration::{AxisOffset, CalibrationConfig, Calibrator};
pub use error::{CalibrationError, EstimatorError, EstimatorResult};
pub use estimator::{AttitudeEstimator, GyroIntegrator, Offsets};
pub use projection::Projector;
