use std::time::Duration;

use hal::MotorCommand;

use crate::error::ConfigError;

/// A fixed drive pulse: duty pair held for `duration`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pulse {
    pub duty_a: u8,
    pub duty_b: u8,
    pub duration: Duration,
}

impl Pulse {
    pub const fn new(duty_a: u8, duty_b: u8, duration_ms: u64) -> Self {
        Self {
            duty_a,
            duty_b,
            duration: Duration::from_millis(duration_ms),
        }
    }
}

/// Tunables for one axis controller.
///
/// Note: `proportional_gain` only decides the sign of the setpoint. The pulses
/// are fixed and do not scale with the setpoint, so the loop behaves as
/// bang-bang control despite the gain.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisConfig {
    /// Inert axes keep their motor braked and never run the state machine
    pub enabled: bool,
    /// Target angle, degrees
    pub home_angle: i16,
    /// Errors strictly below this (degrees) count as on target
    pub acceptance_threshold: i16,
    pub proportional_gain: i16,
    /// Issued when the setpoint is positive
    pub positive_pulse: Pulse,
    /// Issued when the setpoint is negative
    pub negative_pulse: Pulse,
    /// Brake hold after every pass
    pub settle_duration: Duration,
    /// Delay between passes once back in IDLE
    pub poll_period: Duration,
    /// Longest wait for a fresh estimate before failing safe
    pub estimate_timeout: Duration,
    /// Oldest estimate the controller will act on
    pub max_estimate_age: Duration,
}

impl Default for AxisConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            home_angle: 0,
            acceptance_threshold: 10,
            proportional_gain: 10,
            positive_pulse: Pulse::new(0, 50, 60),
            negative_pulse: Pulse::new(25, 0, 100),
            settle_duration: Duration::from_millis(100),
            poll_period: Duration::from_millis(300),
            estimate_timeout: Duration::from_secs(1),
            max_estimate_age: Duration::from_millis(300),
        }
    }
}

impl AxisConfig {
    /// Same tuning, but the axis is a stub
    pub fn inert() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.acceptance_threshold < 0 {
            return Err(ConfigError::InvalidThreshold(self.acceptance_threshold));
        }

        MotorCommand::drive(self.positive_pulse.duty_a, self.positive_pulse.duty_b)
            .map_err(|source| ConfigError::InvalidPulse {
                which: "positive",
                source,
            })?;
        MotorCommand::drive(self.negative_pulse.duty_a, self.negative_pulse.duty_b)
            .map_err(|source| ConfigError::InvalidPulse {
                which: "negative",
                source,
            })?;

        if self.poll_period.is_zero() {
            return Err(ConfigError::ZeroDuration("poll_period"));
        }
        if self.estimate_timeout.is_zero() {
            return Err(ConfigError::ZeroDuration("estimate_timeout"));
        }
        if self.max_estimate_age.is_zero() {
            return Err(ConfigError::ZeroDuration("max_estimate_age"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hal::CommandError;

    #[test]
    fn test_defaults_are_valid() {
        let config = AxisConfig::default();
        assert!(config.validate().is_ok());
        assert!(AxisConfig::inert().validate().is_ok());
        assert!(!AxisConfig::inert().enabled);
    }

    #[test]
    fn test_validation_errors() {
        let config = AxisConfig {
            acceptance_threshold: -1,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidThreshold(-1)));

        let config = AxisConfig {
            positive_pulse: Pulse::new(50, 50, 60),
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidPulse {
                which: "positive",
                source: CommandError::BothChannelsDriven {
                    duty_a: 50,
                    duty_b: 50
                },
            })
        );

        let config = AxisConfig {
            negative_pulse: Pulse::new(0, 0, 100),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidPulse { which: "negative", .. })
        ));

        let config = AxisConfig {
            max_estimate_age: Duration::ZERO,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroDuration("max_estimate_age"))
        );
    }
}
