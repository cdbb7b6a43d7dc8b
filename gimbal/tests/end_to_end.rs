use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use ahrs::{CalibrationConfig, EstimatorError};
use control::{AxisConfig, ControlState};
use gimbal::{Board, Gimbal, GimbalConfig, GimbalError, Resources};
use hal::{ActuatorError, BusError, ImuBus, MotorCommand, MotorDriver, RawSample};

const LEVEL: RawSample = RawSample {
    accel_x: 0,
    accel_y: 0,
    accel_z: 16384,
    gyro_x: 0,
    gyro_y: 0,
    gyro_z: 0,
};

/// About 30° nose-up
const TILTED: RawSample = RawSample {
    accel_x: -8192,
    accel_y: 0,
    accel_z: 14000,
    gyro_x: 0,
    gyro_y: 0,
    gyro_z: 0,
};

#[derive(Clone)]
struct FakeImu {
    sample: Arc<Mutex<Result<RawSample, BusError>>>,
    woken: Arc<Mutex<bool>>,
}

impl FakeImu {
    fn new(sample: Result<RawSample, BusError>) -> Self {
        Self {
            sample: Arc::new(Mutex::new(sample)),
            woken: Arc::new(Mutex::new(false)),
        }
    }

    fn set(&self, sample: Result<RawSample, BusError>) {
        *self.sample.lock().unwrap() = sample;
    }
}

impl ImuBus for FakeImu {
    fn read_raw(&mut self, _address: u8) -> Result<RawSample, BusError> {
        self.sample.lock().unwrap().clone()
    }

    fn wake(&mut self, _address: u8) -> Result<(), BusError> {
        *self.woken.lock().unwrap() = true;
        Ok(())
    }
}

#[derive(Clone, Default)]
struct RecordingMotor {
    commands: Arc<Mutex<Vec<MotorCommand>>>,
}

impl RecordingMotor {
    fn commands(&self) -> Vec<MotorCommand> {
        self.commands.lock().unwrap().clone()
    }
}

impl MotorDriver for RecordingMotor {
    fn apply(&mut self, command: MotorCommand) -> Result<(), ActuatorError> {
        self.commands.lock().unwrap().push(command);
        Ok(())
    }
}

struct TestBoard {
    imu: FakeImu,
    pitch: RecordingMotor,
    roll: RecordingMotor,
    yaw: RecordingMotor,
}

impl TestBoard {
    fn new(imu: FakeImu) -> Self {
        Self {
            imu,
            pitch: RecordingMotor::default(),
            roll: RecordingMotor::default(),
            yaw: RecordingMotor::default(),
        }
    }
}

impl Board for TestBoard {
    fn name(&self) -> &str {
        "test"
    }

    fn split_resources(self) -> Resources {
        Resources {
            imu: Box::new(self.imu),
            pitch_motor: Box::new(self.pitch),
            roll_motor: Box::new(self.roll),
            yaw_motor: Box::new(self.yaw),
        }
    }
}

fn fast_config() -> GimbalConfig {
    GimbalConfig {
        sensor_period: Duration::from_millis(10),
        sensor_read_timeout: Duration::from_millis(200),
        calibration_delay: Duration::ZERO,
        calibration: CalibrationConfig {
            acc_pitch_samples: 4,
            acc_roll_samples: 4,
            gyro_samples: 4,
            ..Default::default()
        },
        pitch: AxisConfig {
            poll_period: Duration::from_millis(20),
            estimate_timeout: Duration::from_millis(100),
            max_estimate_age: Duration::from_millis(200),
            ..Default::default()
        },
        ..Default::default()
    }
}

fn wait_for(limit: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + limit;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

#[test]
fn test_tilted_platform_is_driven_back() {
    let imu = FakeImu::new(Ok(LEVEL));
    let board = TestBoard::new(imu.clone());
    let pitch = board.pitch.clone();
    let roll = board.roll.clone();

    let handle = Gimbal::start(board, fast_config()).expect("gimbal starts");
    assert!(*imu.woken.lock().unwrap(), "IMU must be woken before calibrating");

    imu.set(Ok(TILTED));
    let negative = MotorCommand::drive(25, 0).expect("valid pulse");
    assert!(
        wait_for(Duration::from_secs(2), || pitch.commands().contains(&negative)),
        "Pitch motor never driven negative: {:?}",
        pitch.commands()
    );

    assert!(
        wait_for(Duration::from_secs(1), || handle.status().pitch == Some(30)),
        "Status should show the tilt, got {:?}",
        handle.status()
    );
    assert!(
        wait_for(Duration::from_secs(1), || handle.status().last_error_deg == -30),
        "Status should show the pitch error, got {:?}",
        handle.status()
    );

    handle.stop().expect("clean stop");

    let commands = pitch.commands();
    assert!(commands.last().map(|c| c.is_brake()).unwrap_or(false), "Stop must leave the motor braked");
    assert!(
        commands.iter().all(|c| c.is_brake() || *c == negative),
        "Only the negative pulse and brakes expected: {:?}",
        commands
    );
    assert!(roll.commands().iter().all(|c| c.is_brake()), "Roll is inert");
}

#[test]
fn test_level_platform_only_brakes() {
    let imu = FakeImu::new(Ok(LEVEL));
    let board = TestBoard::new(imu);
    let pitch = board.pitch.clone();

    let handle = Gimbal::start(board, fast_config()).expect("gimbal starts");
    assert!(wait_for(Duration::from_secs(1), || {
        handle.status().pitch_state == ControlState::Settle || pitch.commands().len() > 3
    }));
    thread::sleep(Duration::from_millis(100));
    handle.stop().expect("clean stop");

    let commands = pitch.commands();
    assert!(!commands.is_empty());
    assert!(commands.iter().all(|c| c.is_brake()), "No drive on target: {:?}", commands);
}

#[test]
fn test_sensor_failure_fails_safe() {
    let imu = FakeImu::new(Ok(LEVEL));
    let board = TestBoard::new(imu.clone());
    let pitch = board.pitch.clone();

    let handle = Gimbal::start(board, fast_config()).expect("gimbal starts");
    imu.set(Err(BusError::NoData { address: 0x68 }));

    assert!(
        wait_for(Duration::from_secs(2), || handle.status().axis_faults > 0),
        "Pitch axis should time out waiting for an estimate"
    );
    assert!(handle.status().bus_failures > 0);
    handle.stop().expect("clean stop");

    assert!(pitch.commands().iter().all(|c| c.is_brake()));
}

#[test]
fn test_failed_calibration_spawns_nothing() {
    let imu = FakeImu::new(Err(BusError::NoData { address: 0x68 }));
    let board = TestBoard::new(imu);
    let pitch = board.pitch.clone();

    match Gimbal::start(board, fast_config()) {
        Err(GimbalError::Calibration(EstimatorError::Calibration(_))) => {}
        Err(other) => panic!("Expected a calibration error, got {}", other),
        Ok(_) => panic!("Calibration cannot succeed without samples"),
    }
    assert_eq!(pitch.commands(), vec![MotorCommand::BRAKE], "Motors braked before calibrating");
}

#[test]
fn test_invalid_config_touches_nothing() {
    let imu = FakeImu::new(Ok(LEVEL));
    let board = TestBoard::new(imu.clone());
    let pitch = board.pitch.clone();
    let config = GimbalConfig {
        roll: AxisConfig::default(),
        ..fast_config()
    };

    assert!(matches!(Gimbal::start(board, config), Err(GimbalError::Config(_))));
    assert!(pitch.commands().is_empty());
    assert!(!*imu.woken.lock().unwrap());
}
