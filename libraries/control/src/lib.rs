mod axis;
mod config;
mod error;
mod source;

pub use axis::{AxisController, ControlState, StepReport};
pub use config::{AxisConfig, Pulse};
pub use error::{ConfigError, ControlError};
pub use source::{EstimateSource, ShareSource};
