mod board;
mod config;
mod error;
mod runtime;
mod status;
mod task;

pub use board::{Board, Resources};
pub use config::GimbalConfig;
pub use error::{ConfigError, GimbalError};
pub use runtime::{Gimbal, GimbalHandle};
pub use status::{StatusBoard, StatusSnapshot};
pub use task::TaskCommand;
