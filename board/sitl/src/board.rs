use driver::{HBridge, Mpu6050};
use gimbal::Resources;

use crate::platform::{Channel, Platform};
use crate::sim_i2c::SimMpu6050;
use crate::sim_pwm::SimPwm;

/// Simulated gimbal board: one MPU-6050 on the platform and three motor
/// channels, of which only pitch is connected to anything
pub struct SitlBoard {
    imu_address: u8,
    platform: Platform,
}

impl SitlBoard {
    pub fn new(imu_address: u8, platform: Platform) -> Self {
        Self {
            imu_address,
            platform,
        }
    }
}

impl gimbal::Board for SitlBoard {
    fn name(&self) -> &str {
        "SITL"
    }

    fn split_resources(self) -> Resources {
        let imu = Mpu6050::new(SimMpu6050::new(self.imu_address, self.platform.clone()));
        let pitch_motor = HBridge::new(
            "pitch",
            SimPwm::wired(self.platform.clone(), Channel::A),
            SimPwm::wired(self.platform, Channel::B),
        );

        Resources {
            imu: Box::new(imu),
            pitch_motor: Box::new(pitch_motor),
            roll_motor: Box::new(HBridge::new("roll", SimPwm::unwired(), SimPwm::unwired())),
            yaw_motor: Box::new(HBridge::new("yaw", SimPwm::unwired(), SimPwm::unwired())),
        }
    }
}
