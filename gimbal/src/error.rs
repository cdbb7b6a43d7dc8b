use ahrs::EstimatorError;
use hal::{ActuatorError, Axis};
use thiserror::Error;

/// Rejected tunables, reported before anything touches the hardware
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be at least one sample")]
    ZeroSamples(&'static str),

    #[error("{0} must be nonzero")]
    ZeroDuration(&'static str),

    #[error("{name} must be positive, got {value}")]
    NonPositiveSpread { name: &'static str, value: f32 },

    #[error("{axis} axis: {source}")]
    Axis {
        axis: Axis,
        #[source]
        source: control::ConfigError,
    },

    /// Only pitch has a published estimate to act on
    #[error("{0} axis cannot be enabled: no estimate is published for it")]
    NoEstimate(Axis),
}

#[derive(Error, Debug)]
pub enum GimbalError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("IMU wake-up failed: {0}")]
    Wake(#[source] EstimatorError),

    #[error("startup calibration failed: {0}")]
    Calibration(#[source] EstimatorError),

    #[error("{axis} motor refused the initial brake: {source}")]
    Actuator {
        axis: Axis,
        #[source]
        source: ActuatorError,
    },

    #[error("failed to spawn {task} task: {source}")]
    Spawn {
        task: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} task panicked")]
    TaskPanicked(&'static str),
}
