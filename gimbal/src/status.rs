use std::sync::{Arc, PoisonError, RwLock};

use control::ControlState;
use hal::{AttitudeEstimate, Vector3};

/// Read-mostly view of the running gimbal for status consumers
#[derive(Debug, Clone, PartialEq)]
pub struct StatusSnapshot {
    /// Latest published pitch estimate, degrees
    pub pitch: Option<AttitudeEstimate>,
    /// Latest accelerometer roll, degrees
    pub roll: Option<AttitudeEstimate>,
    /// Integrated gyro angles (roll, pitch, yaw), degrees; drifts
    pub gyro: Vector3<f32>,
    pub pitch_state: ControlState,
    pub last_error_deg: i32,
    pub last_setpoint: i32,
    /// Failed sensor passes since start
    pub bus_failures: u32,
    /// Pitch passes that ended in the fail-safe brake
    pub axis_faults: u32,
}

impl Default for StatusSnapshot {
    fn default() -> Self {
        Self {
            pitch: None,
            roll: None,
            gyro: Vector3::zeros(),
            pitch_state: ControlState::Idle,
            last_error_deg: 0,
            last_setpoint: 0,
            bus_failures: 0,
            axis_faults: 0,
        }
    }
}

/// Shared handle to the current [`StatusSnapshot`]
#[derive(Clone, Default)]
pub struct StatusBoard {
    inner: Arc<RwLock<StatusSnapshot>>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn update(&self, f: impl FnOnce(&mut StatusSnapshot)) {
        let mut snapshot = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut snapshot);
    }
}
