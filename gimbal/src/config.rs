use std::time::Duration;

use ahrs::CalibrationConfig;
use control::AxisConfig;
use hal::Axis;

use crate::error::ConfigError;

/// Every tunable of the running gimbal. `Default` is the stock pitch-only setup.
#[derive(Debug, Clone)]
pub struct GimbalConfig {
    /// I2C address of the IMU
    pub imu_address: u8,
    /// Interval between sensor task passes
    pub sensor_period: Duration,
    /// Reads slower than this are discarded and counted as failures
    pub sensor_read_timeout: Duration,
    /// Consecutive failed passes before the sensor task escalates to error logs
    pub max_bus_failures: u32,
    /// Time given to put the platform down flat before calibrating
    pub calibration_delay: Duration,
    pub calibration: CalibrationConfig,
    pub pitch: AxisConfig,
    pub roll: AxisConfig,
    pub yaw: AxisConfig,
    /// Refresh interval expected by status consumers
    pub status_period: Duration,
}

impl Default for GimbalConfig {
    fn default() -> Self {
        Self {
            imu_address: 0x68,
            sensor_period: Duration::from_millis(100),
            sensor_read_timeout: Duration::from_millis(20),
            max_bus_failures: 10,
            calibration_delay: Duration::from_secs(1),
            calibration: CalibrationConfig::default(),
            pitch: AxisConfig::default(),
            roll: AxisConfig::inert(),
            yaw: AxisConfig::inert(),
            status_period: Duration::from_millis(600),
        }
    }
}

impl GimbalConfig {
    pub fn axis(&self, axis: Axis) -> &AxisConfig {
        match axis {
            Axis::Pitch => &self.pitch,
            Axis::Roll => &self.roll,
            Axis::Yaw => &self.yaw,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let cal = &self.calibration;
        for (name, count) in [
            ("acc_pitch_samples", cal.acc_pitch_samples),
            ("acc_roll_samples", cal.acc_roll_samples),
            ("gyro_samples", cal.gyro_samples),
        ] {
            if count == 0 {
                return Err(ConfigError::ZeroSamples(name));
            }
        }
        for (name, value) in [
            ("max_spread_deg", cal.max_spread_deg),
            ("max_spread_dps", cal.max_spread_dps),
        ] {
            // Also catches NaN
            if !(value > 0.0) {
                return Err(ConfigError::NonPositiveSpread { name, value });
            }
        }

        for (name, period) in [
            ("sensor_period", self.sensor_period),
            ("sensor_read_timeout", self.sensor_read_timeout),
            ("status_period", self.status_period),
        ] {
            if period.is_zero() {
                return Err(ConfigError::ZeroDuration(name));
            }
        }

        for axis in [Axis::Pitch, Axis::Roll, Axis::Yaw] {
            let config = self.axis(axis);
            config
                .validate()
                .map_err(|source| ConfigError::Axis { axis, source })?;
            if config.enabled && axis != Axis::Pitch {
                return Err(ConfigError::NoEstimate(axis));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid_pitch_only() {
        let config = GimbalConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert!(config.pitch.enabled);
        assert!(!config.roll.enabled && !config.yaw.enabled, "Roll and yaw are stubs");
        assert_eq!(config.imu_address, 0x68);
        assert_eq!(config.calibration.acc_roll_samples, 500);
    }

    #[test]
    fn test_zero_samples_rejected() {
        let mut config = GimbalConfig::default();
        config.calibration.gyro_samples = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroSamples("gyro_samples")));
    }

    #[test]
    fn test_bad_spread_rejected() {
        let mut config = GimbalConfig::default();
        config.calibration.max_spread_dps = f32::NAN;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositiveSpread { name: "max_spread_dps", .. })
        ));
    }

    #[test]
    fn test_zero_period_rejected() {
        let config = GimbalConfig {
            sensor_period: Duration::ZERO,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroDuration("sensor_period")));
    }

    #[test]
    fn test_axis_errors_name_the_axis() {
        let mut config = GimbalConfig::default();
        config.yaw.acceptance_threshold = -5;
        assert_eq!(
            config.validate(),
            Err(ConfigError::Axis {
                axis: Axis::Yaw,
                source: control::ConfigError::InvalidThreshold(-5),
            })
        );
    }

    #[test]
    fn test_roll_cannot_be_enabled() {
        let config = GimbalConfig {
            roll: AxisConfig::default(),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::NoEstimate(Axis::Roll)));
    }
}
