use embedded_hal::pwm::{ErrorKind, ErrorType, SetDutyCycle};
use hal::MAX_DUTY;

use crate::platform::{Channel, Platform};

/// 8-bit PWM output. Wired outputs move the platform; unwired ones go nowhere.
pub struct SimPwm {
    wiring: Option<(Platform, Channel)>,
}

impl SimPwm {
    pub fn wired(platform: Platform, channel: Channel) -> Self {
        Self {
            wiring: Some((platform, channel)),
        }
    }

    pub fn unwired() -> Self {
        Self { wiring: None }
    }
}

impl ErrorType for SimPwm {
    type Error = ErrorKind;
}

impl SetDutyCycle for SimPwm {
    fn max_duty_cycle(&self) -> u16 {
        MAX_DUTY as u16
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), ErrorKind> {
        let duty = u8::try_from(duty).map_err(|_| ErrorKind::Other)?;
        if let Some((platform, channel)) = &self.wiring {
            platform.set_duty(*channel, duty);
        }
        Ok(())
    }
}
