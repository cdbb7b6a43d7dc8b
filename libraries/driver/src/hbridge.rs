use embedded_hal::pwm::{Error as _, SetDutyCycle};
use hal::{ActuatorError, Direction, MotorCommand, MotorDriver, MAX_DUTY};

/// Two PWM inputs of one H-bridge motor channel.
///
/// Channel A high spins the motor forward, channel B high spins it backwards,
/// both high is the driver-stage brake. Duties are 8-bit and scaled onto each
/// output's own range.
pub struct HBridge<A, B> {
    name: &'static str,
    channel_a: A,
    channel_b: B,
}

impl<A: SetDutyCycle, B: SetDutyCycle> HBridge<A, B> {
    pub fn new(name: &'static str, channel_a: A, channel_b: B) -> Self {
        Self {
            name,
            channel_a,
            channel_b,
        }
    }

    pub fn release(self) -> (A, B) {
        (self.channel_a, self.channel_b)
    }
}

impl<A: SetDutyCycle, B: SetDutyCycle> MotorDriver for HBridge<A, B> {
    fn apply(&mut self, command: MotorCommand) -> Result<(), ActuatorError> {
        self.channel_a
            .set_duty_cycle_fraction(command.channel_a() as u16, MAX_DUTY as u16)
            .map_err(|e| ActuatorError::Output(format!("{} channel A: {:?}", self.name, e.kind())))?;
        self.channel_b
            .set_duty_cycle_fraction(command.channel_b() as u16, MAX_DUTY as u16)
            .map_err(|e| ActuatorError::Output(format!("{} channel B: {:?}", self.name, e.kind())))?;

        match command.direction() {
            Some(Direction::Forward) => log::debug!("{} spinning forward ({})", self.name, command.channel_a()),
            Some(Direction::Reverse) => log::debug!("{} spinning backwards ({})", self.name, command.channel_b()),
            None => log::debug!("{} braked", self.name),
        }
        Ok(())
    }
}
