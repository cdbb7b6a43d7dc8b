use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use hal::{ACCEL_LSB_PER_G, GYRO_LSB_PER_DPS, MAX_DUTY};

/// Pitch rate at full duty on one channel, °/s
const FULL_DUTY_RATE_DPS: f32 = 200.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    A,
    B,
}

/// One-axis platform driven by a brushed motor through an H-bridge.
///
/// No inertia: the pitch rate follows the duty difference immediately and
/// both channels high (the brake) holds the platform still. Channel A tilts
/// nose-down, channel B nose-up.
#[derive(Debug)]
struct PlatformState {
    pitch_deg: f32,
    roll_deg: f32,
    rate_dps: f32,
    duty_a: u8,
    duty_b: u8,
    updated_at: Instant,
}

impl PlatformState {
    fn advance(&mut self, now: Instant) {
        let dt = now.saturating_duration_since(self.updated_at).as_secs_f32();
        self.updated_at = now;
        self.pitch_deg = (self.pitch_deg + self.rate_dps * dt).clamp(-90.0, 90.0);
    }

    fn rate_from_duties(&self) -> f32 {
        if self.duty_a > 0 && self.duty_b > 0 {
            return 0.0;
        }
        let a = self.duty_a as f32 / MAX_DUTY as f32;
        let b = self.duty_b as f32 / MAX_DUTY as f32;
        (b - a) * FULL_DUTY_RATE_DPS
    }
}

#[derive(Clone)]
pub struct Platform {
    state: Arc<Mutex<PlatformState>>,
}

impl Platform {
    pub fn new(pitch_deg: f32, roll_deg: f32) -> Self {
        Self {
            state: Arc::new(Mutex::new(PlatformState {
                pitch_deg,
                roll_deg,
                rate_dps: 0.0,
                duty_a: 0,
                duty_b: 0,
                updated_at: Instant::now(),
            })),
        }
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut PlatformState) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.advance(Instant::now());
        f(&mut state)
    }

    pub fn pitch_deg(&self) -> f32 {
        self.with_state(|s| s.pitch_deg)
    }

    /// Knock the platform to a new attitude, as an external disturbance would
    pub fn disturb(&self, pitch_deg: f32) {
        self.with_state(|s| s.pitch_deg = pitch_deg.clamp(-90.0, 90.0));
    }

    pub fn set_duty(&self, channel: Channel, duty: u8) {
        self.with_state(|s| {
            match channel {
                Channel::A => s.duty_a = duty,
                Channel::B => s.duty_b = duty,
            }
            s.rate_dps = s.rate_from_duties();
        });
    }

    /// Raw accelerometer and gyro counts as the IMU would measure them now
    pub fn measure(&self) -> ([i16; 3], [i16; 3]) {
        self.with_state(|s| {
            let (sp, cp) = s.pitch_deg.to_radians().sin_cos();
            let (sr, cr) = s.roll_deg.to_radians().sin_cos();
            let counts = |g: f32| (g * ACCEL_LSB_PER_G) as i16;
            let accel = [counts(-sp), counts(cp * sr), counts(cp * cr)];
            let gyro = [0, (s.rate_dps * GYRO_LSB_PER_DPS) as i16, 0];
            (accel, gyro)
        })
    }
}
