use hal::{RawSample, Vector3d};

/// Converts one raw sample into a scalar reading for a single axis
pub type Projector = fn(&RawSample) -> i32;

const MAX_TILT_DEG: f32 = 90.0;

/// Pitch from the gravity vector, in degrees within [-90, 90]
///
/// `atan2` against a non-negative denominator equals `atan(-x / sqrt(y² + z²))`
/// and stays defined when the denominator is zero. The clamp only absorbs
/// rounding in the degree conversion at exactly ±90°.
pub fn pitch_deg(accel: &Vector3d) -> f32 {
    let denominator = (accel.y * accel.y + accel.z * accel.z).sqrt();
    (-accel.x)
        .atan2(denominator)
        .to_degrees()
        .clamp(-MAX_TILT_DEG, MAX_TILT_DEG)
}

/// Roll from the gravity vector, in degrees within [-90, 90]
pub fn roll_deg(accel: &Vector3d) -> f32 {
    let denominator = (accel.x * accel.x + accel.z * accel.z).sqrt();
    accel
        .y
        .atan2(denominator)
        .to_degrees()
        .clamp(-MAX_TILT_DEG, MAX_TILT_DEG)
}

pub fn acc_pitch(sample: &RawSample) -> i32 {
    pitch_deg(&sample.acceleration()) as i32
}

pub fn acc_roll(sample: &RawSample) -> i32 {
    roll_deg(&sample.acceleration()) as i32
}

/// Roll rate (x axis), whole °/s
pub fn gyro_roll(sample: &RawSample) -> i32 {
    sample.angular_rate().x as i32
}

/// Pitch rate (y axis), whole °/s
pub fn gyro_pitch(sample: &RawSample) -> i32 {
    sample.angular_rate().y as i32
}

/// Yaw rate (z axis), whole °/s
pub fn gyro_yaw(sample: &RawSample) -> i32 {
    sample.angular_rate().z as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accel(x: f32, y: f32, z: f32) -> Vector3d {
        Vector3d::new(x, y, z)
    }

    #[test]
    fn test_level_platform_is_zero() {
        let level = accel(0.0, 0.0, 1.0);
        assert!(pitch_deg(&level).abs() < 1e-4);
        assert!(roll_deg(&level).abs() < 1e-4);
    }

    #[test]
    fn test_known_tilts() {
        let half = (0.5f32).sqrt();
        let pitch = pitch_deg(&accel(-half, 0.0, half));
        assert!((pitch - 45.0).abs() < 1e-3, "Expected 45°, got {}", pitch);

        let roll = roll_deg(&accel(0.0, -half, half));
        assert!((roll + 45.0).abs() < 1e-3, "Expected -45°, got {}", roll);
    }

    #[test]
    fn test_range_is_bounded() {
        let values = [-2.0f32, -1.0, -0.3, 0.0, 0.01, 0.7, 1.0, 2.0];
        for &x in &values {
            for &y in &values {
                for &z in &values {
                    let a = accel(x, y, z);
                    let pitch = pitch_deg(&a);
                    let roll = roll_deg(&a);
                    assert!(
                        (-90.0..=90.0).contains(&pitch),
                        "pitch {} out of range for ({}, {}, {})",
                        pitch, x, y, z
                    );
                    assert!(
                        (-90.0..=90.0).contains(&roll),
                        "roll {} out of range for ({}, {}, {})",
                        roll, x, y, z
                    );
                }
            }
        }
    }

    #[test]
    fn test_small_perturbations_are_continuous() {
        // Sweep through the vertical; neighbouring inputs must give neighbouring angles
        let mut previous = pitch_deg(&accel(-1.0, 0.0, 0.05));
        let mut x = -1.0f32;
        while x < 1.0 {
            x += 0.001;
            let current = pitch_deg(&accel(x, 0.0, 0.05));
            assert!(
                (current - previous).abs() < 2.0,
                "Jump from {} to {} at x = {}",
                previous, current, x
            );
            previous = current;
        }
    }

    #[test]
    fn test_degenerate_sample_is_finite() {
        assert_eq!(pitch_deg(&accel(0.0, 0.0, 0.0)), 0.0);
        assert!((pitch_deg(&accel(-1.0, 0.0, 0.0)) - 90.0).abs() < 1e-4);
    }

    #[test]
    fn test_raw_projectors_truncate() {
        // About 30.3° nose-up
        let sample = RawSample::new([-8192, 0, 14000], [-655, 262, 1310]);
        assert_eq!(acc_pitch(&sample), 30);
        assert_eq!(acc_roll(&sample), 0);
        assert_eq!(gyro_roll(&sample), -5);
        assert_eq!(gyro_pitch(&sample), 2);
        assert_eq!(gyro_yaw(&sample), 10);
    }
}
