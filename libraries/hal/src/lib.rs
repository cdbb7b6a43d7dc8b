mod imu;
mod motor;
mod share;
mod types;

pub use imu::*;
pub use motor::*;
pub use share::*;
pub use types::*;
