use hal::{ImuBus, MotorDriver};

/// A concrete target: hands its peripherals to the runtime exactly once
pub trait Board
where
    Self: Sized,
{
    fn name(&self) -> &str;

    fn split_resources(self) -> Resources;
}

/// Everything the runtime needs from a board, already initialised
pub struct Resources {
    pub imu: Box<dyn ImuBus + Send>,
    pub pitch_motor: Box<dyn MotorDriver + Send>,
    pub roll_motor: Box<dyn MotorDriver + Send>,
    pub yaw_motor: Box<dyn MotorDriver + Send>,
}
