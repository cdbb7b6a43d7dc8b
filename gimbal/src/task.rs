use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use ahrs::AttitudeEstimator;
use control::{AxisController, ControlState, EstimateSource};
use hal::{Axis, ImuBus, MotorDriver};

use crate::error::GimbalError;
use crate::status::StatusBoard;

/// Messages from the runtime to one of its worker threads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskCommand {
    Stop,
}

/// A spawned worker and the channel used to stop it
pub(crate) struct Task {
    name: &'static str,
    to_worker_tx: Sender<TaskCommand>,
    handle: JoinHandle<()>,
}

impl Task {
    pub fn spawn<F>(name: &'static str, body: F) -> Result<Self, GimbalError>
    where
        F: FnOnce(Receiver<TaskCommand>) + Send + 'static,
    {
        let (to_worker_tx, to_worker_rx) = mpsc::channel();
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || body(to_worker_rx))
            .map_err(|source| GimbalError::Spawn { task: name, source })?;
        log::info!("{} task started", name);
        Ok(Self {
            name,
            to_worker_tx,
            handle,
        })
    }

    pub fn stop(self) -> Result<(), GimbalError> {
        // The worker may already be gone; joining is what matters
        let _ = self.to_worker_tx.send(TaskCommand::Stop);
        self.handle
            .join()
            .map_err(|_| GimbalError::TaskPanicked(self.name))?;
        log::info!("{} task stopped", self.name);
        Ok(())
    }
}

/// Voluntary delay. Returns `true` once the task should exit.
fn pause(to_worker_rx: &Receiver<TaskCommand>, delay: Duration) -> bool {
    match to_worker_rx.recv_timeout(delay) {
        Ok(TaskCommand::Stop) | Err(RecvTimeoutError::Disconnected) => true,
        Err(RecvTimeoutError::Timeout) => false,
    }
}

/// Owns the estimator and therefore the IMU bus
pub(crate) struct SensorTask<B> {
    estimator: AttitudeEstimator<B>,
    period: Duration,
    max_bus_failures: u32,
    status: StatusBoard,
    consecutive_failures: u32,
}

impl<B: ImuBus> SensorTask<B> {
    pub fn new(
        estimator: AttitudeEstimator<B>,
        period: Duration,
        max_bus_failures: u32,
        status: StatusBoard,
    ) -> Self {
        Self {
            estimator,
            period,
            max_bus_failures,
            status,
            consecutive_failures: 0,
        }
    }

    pub fn run(mut self, to_worker_rx: Receiver<TaskCommand>) {
        loop {
            let started = Instant::now();
            self.poll(started);
            if pause(&to_worker_rx, self.period.saturating_sub(started.elapsed())) {
                return;
            }
        }
    }

    /// One pass: publish pitch, then refresh the unpublished estimates
    fn poll(&mut self, now: Instant) {
        let pitch = self.estimator.read_acc_pitch();
        let roll = self.estimator.read_acc_roll();
        let gyro_ok = [Axis::Roll, Axis::Pitch, Axis::Yaw]
            .into_iter()
            .map(|axis| self.estimator.read_gyro_at(axis, now))
            .fold(true, |ok, read| ok & read.is_ok());

        let failed = pitch.is_err() || roll.is_err() || !gyro_ok;
        if failed {
            self.consecutive_failures += 1;
            if self.consecutive_failures >= self.max_bus_failures {
                log::error!(
                    "IMU failing for {} consecutive passes; pitch estimate is going stale",
                    self.consecutive_failures
                );
            }
        } else {
            self.consecutive_failures = 0;
        }

        let gyro = self.estimator.gyro_angles();
        self.status.update(|s| {
            if let Ok(roll) = roll {
                s.roll = Some(roll);
            }
            s.gyro = gyro;
            if failed {
                s.bus_failures += 1;
            }
        });
    }
}

/// Owns one motor and its state machine
pub(crate) struct AxisTask<S, M> {
    controller: AxisController,
    source: S,
    motor: M,
    status: Option<StatusBoard>,
}

impl<S: EstimateSource, M: MotorDriver> AxisTask<S, M> {
    /// `status` is only given to the axis whose state is reported
    pub fn new(controller: AxisController, source: S, motor: M, status: Option<StatusBoard>) -> Self {
        Self {
            controller,
            source,
            motor,
            status,
        }
    }

    pub fn run(mut self, to_worker_rx: Receiver<TaskCommand>) {
        let axis = self.controller.axis();
        if self.controller.config().enabled {
            loop {
                self.pass();
                let delay = self.controller.next_wakeup(Instant::now());
                if pause(&to_worker_rx, delay) {
                    break;
                }
            }
        } else {
            log::info!("{} axis is inert, holding brake", axis);
            if let Err(e) = self.motor.brake() {
                log::error!("{} axis: brake failed: {}", axis, e);
            }
            while !pause(&to_worker_rx, self.controller.config().poll_period) {}
        }

        if let Err(e) = self.motor.brake() {
            log::error!("{} axis: brake on stop failed: {}", axis, e);
        }
    }

    fn pass(&mut self) {
        let result = self
            .controller
            .step(Instant::now, &mut self.source, &mut self.motor);

        if let Some(status) = &self.status {
            let state = self.controller.state();
            let error = self.controller.last_error();
            let setpoint = self.controller.last_setpoint();
            status.update(|s| {
                s.pitch_state = state;
                s.last_error_deg = error;
                s.last_setpoint = setpoint;
                if result.is_err() {
                    s.axis_faults += 1;
                }
            });
        }

        if let Ok(report) = result {
            if report.entered(ControlState::Idle) {
                log::debug!("{} axis pass complete", self.controller.axis());
            }
        }
    }
}
