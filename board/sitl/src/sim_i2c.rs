use driver::mpu6050::{MPU6050_REG_ACCEL_XOUT_H, MPU6050_REG_PWR_MGMT_1, MPU6050_REG_WHO_AM_I};
use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};

use crate::platform::Platform;

const SLEEP_BIT: u8 = 0x40;

/// MPU-6050 register file backed by the platform model.
///
/// Measurement registers are refreshed from the platform whenever the
/// register pointer is set to the start of the accelerometer block. While the
/// sleep bit is set they read as zero, like the real part.
pub struct SimMpu6050 {
    address: u8,
    platform: Platform,
    registers: [u8; 128],
    pointer: usize,
}

impl SimMpu6050 {
    pub fn new(address: u8, platform: Platform) -> Self {
        let mut registers = [0u8; 128];
        registers[MPU6050_REG_PWR_MGMT_1 as usize] = SLEEP_BIT;
        registers[MPU6050_REG_WHO_AM_I as usize] = 0x68;
        Self {
            address,
            platform,
            registers,
            pointer: 0,
        }
    }

    fn refresh(&mut self) {
        let base = MPU6050_REG_ACCEL_XOUT_H as usize;
        if self.registers[MPU6050_REG_PWR_MGMT_1 as usize] & SLEEP_BIT != 0 {
            self.registers[base..base + 14].fill(0);
            return;
        }

        let (accel, gyro) = self.platform.measure();
        for (i, value) in accel.iter().enumerate() {
            self.registers[base + 2 * i..base + 2 * i + 2].copy_from_slice(&value.to_be_bytes());
        }
        // Temperature registers sit between the two blocks
        for (i, value) in gyro.iter().enumerate() {
            let at = base + 8 + 2 * i;
            self.registers[at..at + 2].copy_from_slice(&value.to_be_bytes());
        }
    }

    fn register(&mut self) -> Result<&mut u8, ErrorKind> {
        let byte = self.registers.get_mut(self.pointer).ok_or(ErrorKind::Other)?;
        self.pointer += 1;
        Ok(byte)
    }
}

impl ErrorType for SimMpu6050 {
    type Error = ErrorKind;
}

impl I2c for SimMpu6050 {
    fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), ErrorKind> {
        if address != self.address {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }

        for operation in operations {
            match operation {
                Operation::Write(bytes) => {
                    let Some((reg, data)) = bytes.split_first() else {
                        continue;
                    };
                    self.pointer = *reg as usize;
                    if self.pointer == MPU6050_REG_ACCEL_XOUT_H as usize && data.is_empty() {
                        self.refresh();
                    }
                    for byte in data {
                        *self.register()? = *byte;
                    }
                }
                Operation::Read(buffer) => {
                    for byte in buffer.iter_mut() {
                        *byte = *self.register()?;
                    }
                }
            }
        }
        Ok(())
    }
}
