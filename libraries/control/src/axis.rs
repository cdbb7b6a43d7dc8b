// Per-axis stabilisation state machine
//
// IDLE --|error| < threshold--> SETTLE
// IDLE --otherwise-----------> COMPUTE_DIRECTION
// COMPUTE_DIRECTION --setpoint < 0--> DRIVE_NEGATIVE
// COMPUTE_DIRECTION --setpoint > 0--> DRIVE_POSITIVE
// COMPUTE_DIRECTION --setpoint = 0--> SETTLE
// DRIVE_* --pulse elapsed--> SETTLE --settle elapsed--> IDLE
//
// DRIVE and SETTLE are timed sub-states: entering them issues the motor command
// and records a deadline; later calls to `step` leave them once the deadline has
// passed. Nothing in here sleeps.

use std::cmp::Ordering;
use std::time::{Duration, Instant};

use hal::{Axis, MotorDriver};
use heapless::Vec;

use crate::config::AxisConfig;
use crate::error::ControlError;
use crate::source::EstimateSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlState {
    Idle,
    ComputeDirection,
    DrivePositive,
    DriveNegative,
    Settle,
}

impl ControlState {
    pub fn name(&self) -> &'static str {
        match self {
            ControlState::Idle => "IDLE",
            ControlState::ComputeDirection => "COMPUTE_DIRECTION",
            ControlState::DrivePositive => "DRIVE_POSITIVE",
            ControlState::DriveNegative => "DRIVE_NEGATIVE",
            ControlState::Settle => "SETTLE",
        }
    }

    fn is_timed(&self) -> bool {
        matches!(
            self,
            ControlState::DrivePositive | ControlState::DriveNegative | ControlState::Settle
        )
    }
}

impl core::fmt::Display for ControlState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// What one call to [`AxisController::step`] did
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    /// States entered during the step, in order
    pub visited: Vec<ControlState, 8>,
    /// State after the step
    pub state: ControlState,
    /// Deadline of the current timed sub-state
    pub hold_until: Option<Instant>,
}

impl StepReport {
    pub fn entered(&self, state: ControlState) -> bool {
        self.visited.contains(&state)
    }
}

pub struct AxisController {
    axis: Axis,
    config: AxisConfig,
    state: ControlState,
    hold_until: Option<Instant>,
    last_error: i32,
    last_setpoint: i32,
}

impl AxisController {
    pub fn new(axis: Axis, config: AxisConfig) -> Self {
        Self {
            axis,
            config,
            state: ControlState::Idle,
            hold_until: None,
            last_error: 0,
            last_setpoint: 0,
        }
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn config(&self) -> &AxisConfig {
        &self.config
    }

    pub fn state(&self) -> ControlState {
        self.state
    }

    /// `home_angle - current_angle` from the most recent IDLE pass
    pub fn last_error(&self) -> i32 {
        self.last_error
    }

    pub fn last_setpoint(&self) -> i32 {
        self.last_setpoint
    }

    /// How long the owning task may sleep before the next `step`
    pub fn next_wakeup(&self, now: Instant) -> Duration {
        match self.hold_until {
            Some(until) if self.state.is_timed() => until.saturating_duration_since(now),
            _ => self.config.poll_period,
        }
    }

    /// Advance the machine as far as it can go.
    ///
    /// `clock` is read when the step starts and again once IDLE has its
    /// estimate, so DRIVE and SETTLE deadlines count from after any wait on
    /// the source. Runs instantaneous states back to back and stops on a timed
    /// sub-state that has not expired, or on returning to IDLE. On any error
    /// the motor is braked (best effort) and the machine resets to IDLE.
    pub fn step<C, S, M>(
        &mut self,
        clock: C,
        source: &mut S,
        motor: &mut M,
    ) -> Result<StepReport, ControlError>
    where
        C: Fn() -> Instant,
        S: EstimateSource + ?Sized,
        M: MotorDriver + ?Sized,
    {
        let mut visited = Vec::new();
        match self.run(&clock, source, motor, &mut visited) {
            Ok(()) => Ok(StepReport {
                visited,
                state: self.state,
                hold_until: self.hold_until,
            }),
            Err(e) => {
                self.fail_safe(motor, &e);
                Err(e)
            }
        }
    }

    fn run<C, S, M>(
        &mut self,
        clock: &C,
        source: &mut S,
        motor: &mut M,
        visited: &mut Vec<ControlState, 8>,
    ) -> Result<(), ControlError>
    where
        C: Fn() -> Instant,
        S: EstimateSource + ?Sized,
        M: MotorDriver + ?Sized,
    {
        let mut now = clock();
        loop {
            let next = match self.state {
                ControlState::Idle => {
                    motor.brake()?;
                    let current = source.sample()?;
                    now = now.max(clock());
                    self.last_error = self.config.home_angle as i32 - current as i32;
                    log::debug!("{}: angle {}, error {}", self.axis, current, self.last_error);

                    if self.last_error.abs() < self.config.acceptance_threshold as i32 {
                        ControlState::Settle
                    } else {
                        ControlState::ComputeDirection
                    }
                }
                ControlState::ComputeDirection => {
                    self.last_setpoint = self.last_error * self.config.proportional_gain as i32;
                    match self.last_setpoint.cmp(&0) {
                        Ordering::Less => ControlState::DriveNegative,
                        Ordering::Greater => ControlState::DrivePositive,
                        Ordering::Equal => ControlState::Settle,
                    }
                }
                ControlState::DrivePositive | ControlState::DriveNegative | ControlState::Settle => {
                    if let Some(until) = self.hold_until {
                        if now < until {
                            return Ok(());
                        }
                    }
                    if self.state == ControlState::Settle {
                        ControlState::Idle
                    } else {
                        ControlState::Settle
                    }
                }
            };

            self.enter(next, now, motor)?;
            let _ = visited.push(next);
            if next == ControlState::Idle {
                return Ok(());
            }
        }
    }

    fn enter<M: MotorDriver + ?Sized>(
        &mut self,
        next: ControlState,
        now: Instant,
        motor: &mut M,
    ) -> Result<(), ControlError> {
        log::debug!("{}: {} -> {}", self.axis, self.state, next);
        self.state = next;
        self.hold_until = None;

        match next {
            ControlState::Idle | ControlState::ComputeDirection => {}
            ControlState::DrivePositive => {
                let pulse = self.config.positive_pulse;
                motor.drive(pulse.duty_a, pulse.duty_b)?;
                self.hold_until = Some(now + pulse.duration);
            }
            ControlState::DriveNegative => {
                let pulse = self.config.negative_pulse;
                motor.drive(pulse.duty_a, pulse.duty_b)?;
                self.hold_until = Some(now + pulse.duration);
            }
            ControlState::Settle => {
                motor.brake()?;
                self.hold_until = Some(now + self.config.settle_duration);
            }
        }
        Ok(())
    }

    fn fail_safe<M: MotorDriver + ?Sized>(&mut self, motor: &mut M, cause: &ControlError) {
        log::error!("{}: {} in {}, braking", self.axis, cause, self.state);
        if let Err(e) = motor.brake() {
            log::error!("{}: brake failed: {}", self.axis, e);
        }
        self.state = ControlState::Idle;
        self.hold_until = None;
    }
}
