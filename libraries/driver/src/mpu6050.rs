use embedded_hal::i2c::{Error as _, ErrorKind, I2c, NoAcknowledgeSource};
use hal::{BusError, ImuBus, RawSample};

// MPU-6050 I2C addresses (depends on AD0 pin state)
pub const MPU6050_I2C_ADDR_PRIMARY: u8 = 0x68;
pub const MPU6050_I2C_ADDR_SECONDARY: u8 = 0x69;

// Register addresses
pub const MPU6050_REG_ACCEL_XOUT_H: u8 = 0x3B;
pub const MPU6050_REG_GYRO_XOUT_H: u8 = 0x43;
pub const MPU6050_REG_PWR_MGMT_1: u8 = 0x6B;
pub const MPU6050_REG_WHO_AM_I: u8 = 0x75;

// ACCEL_XOUT_H..GYRO_ZOUT_L: accel (6), temperature (2), gyro (6)
const BURST_LEN: usize = 14;

/// MPU-6050 on a blocking I2C bus.
///
/// All six axes come from one burst read starting at `ACCEL_XOUT_H`, so a
/// sample never mixes two conversion cycles. Full-scale ranges are left at
/// their reset values (±2 g, ±250 °/s), which is what the sensitivity
/// constants in `hal` assume.
pub struct Mpu6050<I2C> {
    i2c: I2C,
}

impl<I2C: I2c> Mpu6050<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self { i2c }
    }

    pub fn release(self) -> I2C {
        self.i2c
    }

    pub fn who_am_i(&mut self, address: u8) -> Result<u8, BusError> {
        let mut id = [0u8; 1];
        self.i2c
            .write_read(address, &[MPU6050_REG_WHO_AM_I], &mut id)
            .map_err(|e| map_error(address, e.kind()))?;
        Ok(id[0])
    }
}

impl<I2C: I2c> ImuBus for Mpu6050<I2C> {
    fn read_raw(&mut self, address: u8) -> Result<RawSample, BusError> {
        let mut burst = [0u8; BURST_LEN];
        self.i2c
            .write_read(address, &[MPU6050_REG_ACCEL_XOUT_H], &mut burst)
            .map_err(|e| map_error(address, e.kind()))?;

        let mut accel = [0u8; 6];
        let mut gyro = [0u8; 6];
        accel.copy_from_slice(&burst[0..6]);
        gyro.copy_from_slice(&burst[8..14]);
        Ok(RawSample::from_be_bytes(&accel, &gyro))
    }

    /// Clears the sleep bit, selecting the internal oscillator
    fn wake(&mut self, address: u8) -> Result<(), BusError> {
        self.i2c
            .write(address, &[MPU6050_REG_PWR_MGMT_1, 0x00])
            .map_err(|e| map_error(address, e.kind()))?;
        log::info!("MPU-6050 at 0x{:02x} awake", address);
        Ok(())
    }
}

fn map_error(address: u8, kind: ErrorKind) -> BusError {
    match kind {
        ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address) => BusError::NoData { address },
        other => BusError::Transport {
            address,
            message: format!("{:?}", other),
        },
    }
}
