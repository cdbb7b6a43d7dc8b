/// Motor (actuator) interface for a two-channel H-bridge stage
use thiserror::Error;

/// Full-scale duty value for one 8-bit PWM channel
pub const MAX_DUTY: u8 = u8::MAX;

/// Reasons a duty pair cannot be issued as a directional drive
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// Both channels nonzero: the driver stage would treat it as a brake
    #[error("both channels driven (a = {duty_a}, b = {duty_b}); use brake() to stop")]
    BothChannelsDriven { duty_a: u8, duty_b: u8 },

    #[error("no channel driven; a drive command needs exactly one nonzero duty")]
    NoChannelDriven,
}

/// Failure to apply a motor command
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ActuatorError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("PWM output error: {0}")]
    Output(String),
}

/// Direction implied by a drive command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Channel A carries the duty
    Forward,
    /// Channel B carries the duty
    Reverse,
}

/// A pair of duty cycles for the two H-bridge inputs.
///
/// Only two shapes can be constructed: a directional drive with exactly one
/// nonzero channel, or the full brake with both channels at [`MAX_DUTY`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotorCommand {
    channel_a: u8,
    channel_b: u8,
}

impl MotorCommand {
    pub const BRAKE: MotorCommand = MotorCommand {
        channel_a: MAX_DUTY,
        channel_b: MAX_DUTY,
    };

    pub fn drive(duty_a: u8, duty_b: u8) -> Result<Self, CommandError> {
        match (duty_a, duty_b) {
            (0, 0) => Err(CommandError::NoChannelDriven),
            (a, b) if a != 0 && b != 0 => Err(CommandError::BothChannelsDriven {
                duty_a: a,
                duty_b: b,
            }),
            (a, b) => Ok(Self {
                channel_a: a,
                channel_b: b,
            }),
        }
    }

    pub fn channel_a(&self) -> u8 {
        self.channel_a
    }

    pub fn channel_b(&self) -> u8 {
        self.channel_b
    }

    pub fn is_brake(&self) -> bool {
        *self == Self::BRAKE
    }

    /// `None` for the brake command
    pub fn direction(&self) -> Option<Direction> {
        match (self.channel_a, self.channel_b) {
            (a, 0) if a > 0 => Some(Direction::Forward),
            (0, b) if b > 0 => Some(Direction::Reverse),
            _ => None,
        }
    }
}

/// Actuator port: write-and-forget duty commands to one motor
pub trait MotorDriver {
    /// Apply a validated command to both channels
    fn apply(&mut self, command: MotorCommand) -> Result<(), ActuatorError>;

    /// Directional drive.
    ///
    /// Precondition: exactly one of `duty_a`/`duty_b` is nonzero. Anything else
    /// is rejected with [`CommandError`] before the outputs are touched.
    fn drive(&mut self, duty_a: u8, duty_b: u8) -> Result<(), ActuatorError> {
        let command = MotorCommand::drive(duty_a, duty_b)?;
        self.apply(command)
    }

    /// Both channels to full duty (driver-stage brake, not "zero power")
    fn brake(&mut self) -> Result<(), ActuatorError> {
        self.apply(MotorCommand::BRAKE)
    }
}

impl<M: MotorDriver + ?Sized> MotorDriver for Box<M> {
    fn apply(&mut self, command: MotorCommand) -> Result<(), ActuatorError> {
        (**self).apply(command)
    }
}

impl<M: MotorDriver + ?Sized> MotorDriver for &mut M {
    fn apply(&mut self, command: MotorCommand) -> Result<(), ActuatorError> {
        (**self).apply(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        applied: Vec<MotorCommand>,
    }

    impl MotorDriver for Recorder {
        fn apply(&mut self, command: MotorCommand) -> Result<(), ActuatorError> {
            self.applied.push(command);
            Ok(())
        }
    }

    #[test]
    fn test_drive_precondition() {
        assert_eq!(
            MotorCommand::drive(0, 0),
            Err(CommandError::NoChannelDriven)
        );
        assert_eq!(
            MotorCommand::drive(25, 50),
            Err(CommandError::BothChannelsDriven {
                duty_a: 25,
                duty_b: 50
            })
        );
        assert!(
            MotorCommand::drive(MAX_DUTY, MAX_DUTY).is_err(),
            "Brake must not be expressible as a drive"
        );

        let forward = MotorCommand::drive(25, 0).expect("single channel is a valid drive");
        assert_eq!(forward.direction(), Some(Direction::Forward));
        let reverse = MotorCommand::drive(0, 50).expect("single channel is a valid drive");
        assert_eq!(reverse.direction(), Some(Direction::Reverse));
    }

    #[test]
    fn test_brake_is_full_duty_on_both_channels() {
        let mut motor = Recorder::default();
        motor.brake().expect("brake never fails on the recorder");

        let applied = motor.applied[0];
        assert!(applied.is_brake());
        assert_eq!(applied.channel_a(), 255);
        assert_eq!(applied.channel_b(), 255);
        assert_eq!(applied.direction(), None);
    }

    #[test]
    fn test_rejected_drive_leaves_outputs_untouched() {
        let mut motor = Recorder::default();
        let result = motor.drive(10, 10);

        assert!(matches!(
            result,
            Err(ActuatorError::Command(CommandError::BothChannelsDriven { .. }))
        ));
        assert!(motor.applied.is_empty(), "Nothing should reach the outputs");
    }
}
