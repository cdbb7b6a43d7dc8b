use std::time::Duration;

use hal::{ActuatorError, CommandError, ShareError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ControlError {
    #[error("attitude estimate unavailable: {0}")]
    EstimateUnavailable(#[from] ShareError),

    #[error("attitude estimate is {age:?} old, limit {limit:?}")]
    StaleEstimate { age: Duration, limit: Duration },

    #[error("actuator failure: {0}")]
    Actuator(#[from] ActuatorError),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("acceptance threshold must not be negative, got {0}")]
    InvalidThreshold(i16),

    #[error("{which} pulse violates the actuator precondition: {source}")]
    InvalidPulse {
        which: &'static str,
        #[source]
        source: CommandError,
    },

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
}
