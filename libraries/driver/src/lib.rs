//! Concrete sensor and actuator ports on top of `embedded-hal` 1.0 traits

pub mod hbridge;
pub mod mpu6050;

pub use hbridge::HBridge;
pub use mpu6050::Mpu6050;
