use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use ahrs::AttitudeEstimator;
use control::{AxisController, ControlError, EstimateSource, ShareSource};
use hal::{AttitudeEstimate, Axis, MotorDriver, Share, ShareError};

use crate::board::{Board, Resources};
use crate::config::GimbalConfig;
use crate::error::GimbalError;
use crate::status::{StatusBoard, StatusSnapshot};
use crate::task::{AxisTask, SensorTask, Task, TaskCommand};

/// Source for axes that have no published estimate; only inert axes get one
struct Unpublished(Axis);

impl EstimateSource for Unpublished {
    fn sample(&mut self) -> Result<AttitudeEstimate, ControlError> {
        Err(ControlError::EstimateUnavailable(ShareError::Timeout {
            name: self.0.name(),
            waited: Duration::ZERO,
            ever_published: false,
        }))
    }
}

pub struct Gimbal;

impl Gimbal {
    /// Bring the gimbal up on `board`.
    ///
    /// Brakes every motor, wakes the IMU, waits `calibration_delay` for the
    /// platform to be put down flat, calibrates, then spawns the sensor task
    /// and one task per axis. Nothing is spawned if any step before that fails.
    pub fn start(board: impl Board, config: GimbalConfig) -> Result<GimbalHandle, GimbalError> {
        config.validate()?;
        log::info!("starting gimbal on {}", board.name());

        let Resources {
            imu,
            mut pitch_motor,
            mut roll_motor,
            mut yaw_motor,
        } = board.split_resources();

        for (axis, motor) in [
            (Axis::Pitch, &mut pitch_motor),
            (Axis::Roll, &mut roll_motor),
            (Axis::Yaw, &mut yaw_motor),
        ] {
            motor
                .brake()
                .map_err(|source| GimbalError::Actuator { axis, source })?;
        }

        let pitch_share = Arc::new(Share::new("pitch"));
        let mut estimator = AttitudeEstimator::new(imu, config.imu_address, pitch_share.clone())
            .with_read_timeout(config.sensor_read_timeout);

        estimator.wake().map_err(GimbalError::Wake)?;
        log::info!("hold IMU flat, calibrating in {:?}", config.calibration_delay);
        thread::sleep(config.calibration_delay);
        estimator
            .calibrate(&config.calibration)
            .map_err(GimbalError::Calibration)?;

        let status = StatusBoard::new();
        let mut handle = GimbalHandle {
            tasks: Vec::new(),
            status: status.clone(),
            pitch: pitch_share.clone(),
        };

        let sensor = SensorTask::new(
            estimator,
            config.sensor_period,
            config.max_bus_failures,
            status.clone(),
        );
        handle.spawn("sensor", move |rx| sensor.run(rx))?;

        let pitch_config = config.pitch.clone();
        let source = ShareSource::new(
            pitch_share,
            pitch_config.estimate_timeout,
            pitch_config.max_estimate_age,
        );
        let pitch = AxisTask::new(
            AxisController::new(Axis::Pitch, pitch_config),
            source,
            pitch_motor,
            Some(status),
        );
        handle.spawn("pitch", move |rx| pitch.run(rx))?;

        let roll = AxisTask::new(
            AxisController::new(Axis::Roll, config.roll.clone()),
            Unpublished(Axis::Roll),
            roll_motor,
            None,
        );
        handle.spawn("roll", move |rx| roll.run(rx))?;

        let yaw = AxisTask::new(
            AxisController::new(Axis::Yaw, config.yaw.clone()),
            Unpublished(Axis::Yaw),
            yaw_motor,
            None,
        );
        handle.spawn("yaw", move |rx| yaw.run(rx))?;

        Ok(handle)
    }
}

/// Running gimbal. Dropping it disconnects every task's channel, which also
/// stops them, but without waiting.
pub struct GimbalHandle {
    tasks: Vec<Task>,
    status: StatusBoard,
    pitch: Arc<Share<AttitudeEstimate>>,
}

impl GimbalHandle {
    fn spawn<F>(&mut self, name: &'static str, body: F) -> Result<(), GimbalError>
    where
        F: FnOnce(Receiver<TaskCommand>) + Send + 'static,
    {
        let task = Task::spawn(name, body)?;
        self.tasks.push(task);
        Ok(())
    }

    /// Current status; the pitch value is peeked so the controller still gets it
    pub fn status(&self) -> StatusSnapshot {
        let mut snapshot = self.status.snapshot();
        snapshot.pitch = self.pitch.peek().map(|stamped| stamped.value);
        snapshot
    }

    /// Stop every task, axis tasks first so motors are braked before the
    /// estimate goes away
    pub fn stop(mut self) -> Result<(), GimbalError> {
        let mut first_error = None;
        while let Some(task) = self.tasks.pop() {
            if let Err(e) = task.stop() {
                log::error!("{}", e);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
