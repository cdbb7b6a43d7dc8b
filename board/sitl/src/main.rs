use std::time::{Duration, Instant};

use anyhow::Context;
use gimbal::{Gimbal, GimbalConfig, GimbalHandle};

mod board;
mod platform;
mod report;
mod sim_i2c;
mod sim_pwm;

use board::SitlBoard;
use platform::Platform;

/// Platform tilt applied once the gimbal is running, degrees
const DISTURBANCE_DEG: f32 = 30.0;

enum State {
    Initializing,
    Running,
    Stopping,
}

/// Usage: `sitl [run_seconds]` (default 20)
fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let run_for = match std::env::args().nth(1) {
        Some(arg) => Duration::from_secs(
            arg.parse()
                .with_context(|| format!("invalid run time '{}', expected seconds", arg))?,
        ),
        None => Duration::from_secs(20),
    };

    let config = GimbalConfig::default();
    let platform = Platform::new(0.0, 0.0);
    let mut state = State::Initializing;
    let mut gimbal: Option<GimbalHandle> = None;
    let mut started = Instant::now();

    loop {
        match state {
            State::Initializing => {
                let board = SitlBoard::new(config.imu_address, platform.clone());
                gimbal = Some(Gimbal::start(board, config.clone()).context("failed to start gimbal")?);

                log::info!("gimbal running, tilting platform to {} degrees", DISTURBANCE_DEG);
                platform.disturb(DISTURBANCE_DEG);
                println!("{}", report::CSV_HEADER);
                started = Instant::now();
                state = State::Running;
            }
            State::Running => {
                let elapsed = started.elapsed();
                if let Some(handle) = &gimbal {
                    let status = handle.status();
                    println!("{}", report::csv_row(elapsed.as_millis(), platform.pitch_deg(), &status));
                }
                if elapsed >= run_for {
                    state = State::Stopping;
                    continue;
                }
                std::thread::sleep(config.status_period);
            }
            State::Stopping => {
                if let Some(handle) = gimbal.take() {
                    handle.stop().context("failed to stop gimbal")?;
                }
                log::info!("final platform pitch {:.1} degrees", platform.pitch_deg());
                break;
            }
        }
    }
    Ok(())
}
