use hal::{BusError, RawSample};
use thiserror::Error;

/// Errors raised while calibrating an axis
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalibrationError {
    #[error("calibration of {axis} needs at least one sample")]
    ZeroSamples { axis: &'static str },

    /// The bus failed mid-pass; nothing from the pass is kept
    #[error("bus failure during {axis} calibration after {completed} samples: {source}")]
    Bus {
        axis: &'static str,
        completed: u32,
        #[source]
        source: BusError,
    },

    /// The samples spread too much for the platform to have been still
    #[error("{axis} calibration invalid: spread {spread:.2} exceeds limit {limit:.2} (was the platform moving?)")]
    Invalid {
        axis: &'static str,
        spread: f32,
        limit: f32,
    },
}

/// Errors raised by the attitude estimator
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EstimatorError {
    /// The read failed; `last_valid` is the most recent good sample, marked stale by context
    #[error("sensor read failed: {source}")]
    Bus {
        #[source]
        source: BusError,
        last_valid: Option<RawSample>,
    },

    #[error(transparent)]
    Calibration(#[from] CalibrationError),

    #[error("estimator used before calibration")]
    NotCalibrated,
}

/// Result type for estimator operations
pub type EstimatorResult<T> = Result<T, EstimatorError>;
