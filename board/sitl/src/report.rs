use gimbal::StatusSnapshot;

pub const CSV_HEADER: &str =
    "elapsed_ms,platform_pitch,pitch,roll,gyro_roll,gyro_pitch,gyro_yaw,state,error,setpoint,bus_failures,axis_faults";

fn or_blank(value: Option<i16>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// One status row, matching [`CSV_HEADER`]
pub fn csv_row(elapsed_ms: u128, platform_pitch: f32, status: &StatusSnapshot) -> String {
    format!(
        "{},{:.1},{},{},{:.1},{:.1},{:.1},{},{},{},{},{}",
        elapsed_ms,
        platform_pitch,
        or_blank(status.pitch),
        or_blank(status.roll),
        status.gyro.x,
        status.gyro.y,
        status.gyro.z,
        status.pitch_state,
        status.last_error_deg,
        status.last_setpoint,
        status.bus_failures,
        status.axis_faults
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use control::ControlState;

    #[test]
    fn test_row_matches_header() {
        let status = StatusSnapshot {
            pitch: Some(30),
            pitch_state: ControlState::DriveNegative,
            last_error_deg: -30,
            last_setpoint: -300,
            ..Default::default()
        };
        let row = csv_row(1200, 29.6, &status);

        assert_eq!(row, "1200,29.6,30,,0.0,0.0,0.0,DRIVE_NEGATIVE,-30,-300,0,0");
        assert_eq!(row.split(',').count(), CSV_HEADER.split(',').count());
    }
}
