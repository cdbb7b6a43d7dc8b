/// IMU (Inertial Measurement Unit) bus interface
use std::time::Duration;

use thiserror::Error;

use crate::types::Vector3d;

/// Accelerometer sensitivity at the ±2 g range, in LSB per g
pub const ACCEL_LSB_PER_G: f32 = 16384.0;

/// Gyroscope sensitivity at the ±250 °/s range, in LSB per °/s
pub const GYRO_LSB_PER_DPS: f32 = 131.0;

/// One accelerometer + gyroscope reading, exactly as the device reported it
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RawSample {
    pub accel_x: i16,
    pub accel_y: i16,
    pub accel_z: i16,
    pub gyro_x: i16,
    pub gyro_y: i16,
    pub gyro_z: i16,
}

impl RawSample {
    pub fn new(accel: [i16; 3], gyro: [i16; 3]) -> Self {
        Self {
            accel_x: accel[0],
            accel_y: accel[1],
            accel_z: accel[2],
            gyro_x: gyro[0],
            gyro_y: gyro[1],
            gyro_z: gyro[2],
        }
    }

    /// Decode big-endian register contents (high byte first for every axis)
    pub fn from_be_bytes(accel: &[u8; 6], gyro: &[u8; 6]) -> Self {
        let word = |bytes: &[u8; 6], i: usize| i16::from_be_bytes([bytes[2 * i], bytes[2 * i + 1]]);
        Self::new(
            [word(accel, 0), word(accel, 1), word(accel, 2)],
            [word(gyro, 0), word(gyro, 1), word(gyro, 2)],
        )
    }

    /// Acceleration in g
    pub fn acceleration(&self) -> Vector3d {
        Vector3d::new(
            self.accel_x as f32 / ACCEL_LSB_PER_G,
            self.accel_y as f32 / ACCEL_LSB_PER_G,
            self.accel_z as f32 / ACCEL_LSB_PER_G,
        )
    }

    /// Angular rate in °/s
    pub fn angular_rate(&self) -> Vector3d {
        Vector3d::new(
            self.gyro_x as f32 / GYRO_LSB_PER_DPS,
            self.gyro_y as f32 / GYRO_LSB_PER_DPS,
            self.gyro_z as f32 / GYRO_LSB_PER_DPS,
        )
    }
}

/// Failure of a single sensor bus transaction
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BusError {
    /// The device answered the transaction with zero bytes
    #[error("no data available from device 0x{address:02x}")]
    NoData { address: u8 },

    #[error("short read from device 0x{address:02x}: expected {expected} bytes, got {got}")]
    ShortRead {
        address: u8,
        expected: usize,
        got: usize,
    },

    /// The transaction completed, but too late to be trusted
    #[error("read from device 0x{address:02x} took {elapsed:?} (limit {limit:?})")]
    Timeout {
        address: u8,
        elapsed: Duration,
        limit: Duration,
    },

    #[error("bus transport error on device 0x{address:02x}: {message}")]
    Transport { address: u8, message: String },
}

/// Sensor port: one atomic read of all six raw axes
pub trait ImuBus {
    /// Read one raw sample from the device at `address`.
    ///
    /// Implementations must never hand back zeroed or partial data on failure;
    /// the error is returned instead and retry policy is left to the caller.
    fn read_raw(&mut self, address: u8) -> Result<RawSample, BusError>;

    /// Take the device out of sleep. Devices that need no wake-up keep the default.
    fn wake(&mut self, _address: u8) -> Result<(), BusError> {
        Ok(())
    }
}

impl<B: ImuBus + ?Sized> ImuBus for Box<B> {
    fn read_raw(&mut self, address: u8) -> Result<RawSample, BusError> {
        (**self).read_raw(address)
    }

    fn wake(&mut self, address: u8) -> Result<(), BusError> {
        (**self).wake(address)
    }
}

impl<B: ImuBus + ?Sized> ImuBus for &mut B {
    fn read_raw(&mut self, address: u8) -> Result<RawSample, BusError> {
        (**self).read_raw(address)
    }

    fn wake(&mut self, address: u8) -> Result<(), BusError> {
        (**self).wake(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_be_bytes() {
        let accel = [0x40, 0x00, 0xff, 0xff, 0x80, 0x00];
        let gyro = [0x00, 0x83, 0xff, 0x7d, 0x00, 0x00];
        let sample = RawSample::from_be_bytes(&accel, &gyro);

        assert_eq!(sample.accel_x, 16384);
        assert_eq!(sample.accel_y, -1);
        assert_eq!(sample.accel_z, i16::MIN);
        assert_eq!(sample.gyro_x, 131);
        assert_eq!(sample.gyro_y, -131);
        assert_eq!(sample.gyro_z, 0);
    }

    #[test]
    fn test_sensitivity_scaling() {
        let sample = RawSample::new([16384, -8192, 0], [131, -262, 0]);
        let accel = sample.acceleration();
        let rate = sample.angular_rate();

        assert!((accel.x - 1.0).abs() < 1e-6, "Expected 1 g, got {}", accel.x);
        assert!((accel.y + 0.5).abs() < 1e-6, "Expected -0.5 g, got {}", accel.y);
        assert!((rate.x - 1.0).abs() < 1e-6, "Expected 1 °/s, got {}", rate.x);
        assert!((rate.y + 2.0).abs() < 1e-6, "Expected -2 °/s, got {}", rate.y);
    }
}
