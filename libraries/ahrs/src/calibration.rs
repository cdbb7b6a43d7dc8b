//! Stationary averaging of projected sensor readings.
//!
//! The platform must be held still for the whole pass. Motion is only caught
//! indirectly: the spread (standard deviation) of the pass is reported with the
//! offset and callers reject offsets whose spread exceeds a configured limit.
//! Outliers are not filtered, so one corrupted read still biases the mean.

use hal::ImuBus;

use crate::error::CalibrationError;
use crate::projection::Projector;

/// Sample counts and spread limits for one full calibration
#[derive(Debug, Clone)]
pub struct CalibrationConfig {
    pub acc_pitch_samples: u32,
    pub acc_roll_samples: u32,
    /// Used for each of the three gyro axes
    pub gyro_samples: u32,
    /// Largest accepted spread of accelerometer angles, degrees
    pub max_spread_deg: f32,
    /// Largest accepted spread of gyro rates, °/s
    pub max_spread_dps: f32,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            acc_pitch_samples: 200,
            acc_roll_samples: 500,
            gyro_samples: 200,
            max_spread_deg: 2.0,
            max_spread_dps: 5.0,
        }
    }
}

/// Result of one calibration pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisOffset {
    value: i32,
    spread: f32,
    samples: u32,
}

impl AxisOffset {
    /// Integer-truncated mean of the projected samples
    pub fn value(&self) -> i32 {
        self.value
    }

    /// Saturating narrowing for the 16-bit accelerometer offsets
    pub fn as_i16(&self) -> i16 {
        self.value.clamp(i16::MIN as i32, i16::MAX as i32) as i16
    }

    /// Standard deviation of the projected samples
    pub fn spread(&self) -> f32 {
        self.spread
    }

    pub fn samples(&self) -> u32 {
        self.samples
    }

    /// Fail loudly when the pass was too noisy to be a stationary one
    pub fn check_spread(self, axis: &'static str, limit: f32) -> Result<Self, CalibrationError> {
        if self.spread > limit {
            log::error!(
                "{} calibration rejected: spread {:.2} > {:.2}",
                axis,
                self.spread,
                limit
            );
            return Err(CalibrationError::Invalid {
                axis,
                spread: self.spread,
                limit,
            });
        }
        Ok(self)
    }
}

/// Runs averaging passes against one device on a borrowed bus
pub struct Calibrator<'a, B: ?Sized> {
    bus: &'a mut B,
    address: u8,
}

impl<'a, B: ImuBus + ?Sized> Calibrator<'a, B> {
    pub fn new(bus: &'a mut B, address: u8) -> Self {
        Self { bus, address }
    }

    /// Average `sample_count` projected readings into an offset.
    ///
    /// Deterministic for a given sequence of raw samples. A bus failure aborts
    /// the pass and nothing accumulated so far is returned.
    pub fn calibrate_axis(
        &mut self,
        axis: &'static str,
        sample_count: u32,
        projector: Projector,
    ) -> Result<AxisOffset, CalibrationError> {
        if sample_count == 0 {
            return Err(CalibrationError::ZeroSamples { axis });
        }

        let mut sum: i64 = 0;
        let mut sum_squares: f64 = 0.0;

        for completed in 0..sample_count {
            let sample = self
                .bus
                .read_raw(self.address)
                .map_err(|source| CalibrationError::Bus {
                    axis,
                    completed,
                    source,
                })?;
            let reading = projector(&sample);
            sum += reading as i64;
            sum_squares += (reading as f64) * (reading as f64);
        }

        let n = sample_count as i64;
        let value = (sum / n) as i32;
        let mean = sum as f64 / n as f64;
        let variance = (sum_squares / n as f64 - mean * mean).max(0.0);
        let offset = AxisOffset {
            value,
            spread: variance.sqrt() as f32,
            samples: sample_count,
        };

        log::info!(
            "{} offset is {} (spread {:.2} over {} samples)",
            axis,
            offset.value,
            offset.spread,
            sample_count
        );
        Ok(offset)
    }
}
