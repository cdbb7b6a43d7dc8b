use std::sync::Arc;
use std::time::{Duration, Instant};

use hal::{AttitudeEstimate, Axis, BusError, ImuBus, RawSample, Share};
use nalgebra::Vector3;

use crate::calibration::{CalibrationConfig, Calibrator};
use crate::error::{EstimatorError, EstimatorResult};
use crate::projection;

/// Per-axis offsets learned during calibration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Offsets {
    /// Degrees
    pub acc_pitch: i16,
    /// Degrees
    pub acc_roll: i16,
    /// Roll (x), pitch (y), yaw (z) rates in whole °/s
    pub gyro: Vector3<i32>,
}

/// Rate integration over wall-clock time.
///
/// There is no correction from the accelerometer and no re-zeroing, so any
/// residual rate bias accumulates into the angle for as long as it runs.
#[derive(Debug, Default, Clone)]
pub struct GyroIntegrator {
    angle: f32,
    last: Option<Instant>,
}

impl GyroIntegrator {
    /// `angle += rate * elapsed`; zero elapsed adds nothing
    pub fn integrate(&mut self, rate_dps: f32, elapsed: Duration) -> f32 {
        self.angle += rate_dps * elapsed.as_secs_f32();
        self.angle
    }

    /// Integrate over the time since the previous update (zero on the first one)
    pub fn update(&mut self, rate_dps: f32, now: Instant) -> f32 {
        let elapsed = self
            .last
            .map(|last| now.saturating_duration_since(last))
            .unwrap_or(Duration::ZERO);
        self.last = Some(now);
        self.integrate(rate_dps, elapsed)
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }
}

/// Offset-corrected angle reads over an owned sensor bus.
///
/// Every successful pitch read is also a publish into the pitch share.
pub struct AttitudeEstimator<B> {
    bus: B,
    address: u8,
    offsets: Option<Offsets>,
    gyro: [GyroIntegrator; 3],
    last_valid: Option<RawSample>,
    read_timeout: Option<Duration>,
    pitch: Arc<Share<AttitudeEstimate>>,
}

impl<B: ImuBus> AttitudeEstimator<B> {
    pub fn new(bus: B, address: u8, pitch: Arc<Share<AttitudeEstimate>>) -> Self {
        Self {
            bus,
            address,
            offsets: None,
            gyro: Default::default(),
            last_valid: None,
            read_timeout: None,
            pitch,
        }
    }

    /// Discard reads that take longer than `timeout`.
    ///
    /// The check runs once the bus returns, so a late sample is reported as
    /// `BusError::Timeout` and never published. A read that never returns is
    /// not interrupted here; the consumer's estimate timeout brakes the axis
    /// in that case.
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    pub fn offsets(&self) -> Option<&Offsets> {
        self.offsets.as_ref()
    }

    /// Install offsets computed elsewhere
    pub fn set_offsets(&mut self, offsets: Offsets) {
        self.offsets = Some(offsets);
    }

    /// Take the sensor out of sleep; needed once after power-up
    pub fn wake(&mut self) -> EstimatorResult<()> {
        self.bus.wake(self.address).map_err(|source| EstimatorError::Bus {
            source,
            last_valid: self.last_valid,
        })
    }

    /// The most recent sample that was read successfully
    pub fn last_valid_sample(&self) -> Option<RawSample> {
        self.last_valid
    }

    /// Run every calibration pass with the platform held still.
    ///
    /// Offsets are committed only when all passes succeed; on failure the
    /// previous offsets (if any) are left untouched.
    pub fn calibrate(&mut self, config: &CalibrationConfig) -> EstimatorResult<Offsets> {
        let mut calibrator = Calibrator::new(&mut self.bus, self.address);

        let acc_pitch = calibrator
            .calibrate_axis("acc pitch", config.acc_pitch_samples, projection::acc_pitch)?
            .check_spread("acc pitch", config.max_spread_deg)?;
        let acc_roll = calibrator
            .calibrate_axis("acc roll", config.acc_roll_samples, projection::acc_roll)?
            .check_spread("acc roll", config.max_spread_deg)?;
        let gyro_roll = calibrator
            .calibrate_axis("gyro roll", config.gyro_samples, projection::gyro_roll)?
            .check_spread("gyro roll", config.max_spread_dps)?;
        let gyro_pitch = calibrator
            .calibrate_axis("gyro pitch", config.gyro_samples, projection::gyro_pitch)?
            .check_spread("gyro pitch", config.max_spread_dps)?;
        let gyro_yaw = calibrator
            .calibrate_axis("gyro yaw", config.gyro_samples, projection::gyro_yaw)?
            .check_spread("gyro yaw", config.max_spread_dps)?;

        let offsets = Offsets {
            acc_pitch: acc_pitch.as_i16(),
            acc_roll: acc_roll.as_i16(),
            gyro: Vector3::new(gyro_roll.value(), gyro_pitch.value(), gyro_yaw.value()),
        };
        self.offsets = Some(offsets);
        self.gyro = Default::default();
        Ok(offsets)
    }

    fn require_offsets(&self) -> EstimatorResult<Offsets> {
        self.offsets.ok_or(EstimatorError::NotCalibrated)
    }

    fn read_sample(&mut self) -> EstimatorResult<RawSample> {
        let address = self.address;
        let limit = self.read_timeout;
        let started = Instant::now();

        let result = self.bus.read_raw(address).and_then(|sample| match limit {
            Some(limit) if started.elapsed() > limit => Err(BusError::Timeout {
                address,
                elapsed: started.elapsed(),
                limit,
            }),
            _ => Ok(sample),
        });

        match result {
            Ok(sample) => {
                self.last_valid = Some(sample);
                Ok(sample)
            }
            Err(source) => {
                log::warn!("IMU read failed: {}", source);
                Err(EstimatorError::Bus {
                    source,
                    last_valid: self.last_valid,
                })
            }
        }
    }

    /// Offset-corrected accelerometer pitch; published into the pitch share
    pub fn read_acc_pitch(&mut self) -> EstimatorResult<AttitudeEstimate> {
        let offsets = self.require_offsets()?;
        let sample = self.read_sample()?;
        let pitch = corrected(projection::acc_pitch(&sample), offsets.acc_pitch as i32);

        log::debug!("pitch angle from accelerometer: {}", pitch);
        self.pitch.put(pitch);
        Ok(pitch)
    }

    /// Offset-corrected accelerometer roll; not published
    pub fn read_acc_roll(&mut self) -> EstimatorResult<AttitudeEstimate> {
        let offsets = self.require_offsets()?;
        let sample = self.read_sample()?;
        let roll = corrected(projection::acc_roll(&sample), offsets.acc_roll as i32);

        log::debug!("roll angle from accelerometer: {}", roll);
        Ok(roll)
    }

    pub fn read_gyro_roll(&mut self) -> EstimatorResult<AttitudeEstimate> {
        self.read_gyro_at(Axis::Roll, Instant::now())
    }

    pub fn read_gyro_pitch(&mut self) -> EstimatorResult<AttitudeEstimate> {
        self.read_gyro_at(Axis::Pitch, Instant::now())
    }

    pub fn read_gyro_yaw(&mut self) -> EstimatorResult<AttitudeEstimate> {
        self.read_gyro_at(Axis::Yaw, Instant::now())
    }

    /// Integrate one gyro axis up to `now` and return its accumulated angle
    pub fn read_gyro_at(&mut self, axis: Axis, now: Instant) -> EstimatorResult<AttitudeEstimate> {
        let offsets = self.require_offsets()?;
        let sample = self.read_sample()?;
        let rates = sample.angular_rate();

        let (index, rate, offset) = match axis {
            Axis::Roll => (0, rates.x, offsets.gyro.x),
            Axis::Pitch => (1, rates.y, offsets.gyro.y),
            Axis::Yaw => (2, rates.z, offsets.gyro.z),
        };
        let angle = self.gyro[index].update(rate - offset as f32, now);

        log::debug!("{} angle from gyroscope: {:.2}", axis, angle);
        Ok(saturate(angle))
    }

    /// Accumulated gyro angles (roll, pitch, yaw) without touching the bus
    pub fn gyro_angles(&self) -> Vector3<f32> {
        Vector3::new(self.gyro[0].angle(), self.gyro[1].angle(), self.gyro[2].angle())
    }
}

fn corrected(projected: i32, offset: i32) -> AttitudeEstimate {
    (projected - offset).clamp(i16::MIN as i32, i16::MAX as i32) as i16
}

fn saturate(angle: f32) -> AttitudeEstimate {
    // `as` saturates at the i16 bounds and truncates toward zero
    angle as i16
}
