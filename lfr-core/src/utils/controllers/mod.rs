//! Module Exports
//!
//! This file exports the hardware-facing controllers and hosts the
//! `LineFollower` control loop that ties them together.
//!
//! - `sensors`: digital line sensor bar input
//! - `drive`: correction-to-duty mapping and the motor output stage
//! - `indicator`: status LED and the start-trigger arming wait

pub mod drive;
pub mod indicator;
pub mod sensors;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::Timer;
use embedded_hal::{digital::InputPin, pwm::SetDutyCycle};
use serde::{Deserialize, Serialize};

use crate::utils::math::error::lateral_error;
use crate::utils::math::pid::{ErrorHistory, PidController, PidGains};
use drive::{DriveMotors, MotorMapper};
use sensors::LineSensorArray;

/// Cooperative stop handoff: signal once to make [`LineFollower::run`]
/// zero the motors and return after the current cycle.
pub static STOP_SIGNAL: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Rejected configuration values, caught once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The sensor pin table is empty.
    NoSensors,
    /// A PID gain is negative.
    NegativeGain,
    /// The average speed exceeds the PWM duty ceiling.
    BaseSpeedOutOfRange,
    /// A motor mismatch coefficient is negative.
    InvalidMismatch,
    /// The cycle delay is zero; the derivative term needs a fixed
    /// nonzero sampling interval.
    ZeroCycleDelay,
}

/// Errors surfaced by one control cycle.
#[derive(Debug)]
pub enum FollowerError<SE, ME> {
    Sensor(SE),
    Motor(ME),
}

/// Fixed deployment configuration, validated once at startup.
///
/// Defaults: base speed 155 over an 8-bit duty range, pure-P gains,
/// 1.0/1.07 motor mismatch, 2 ms cycle delay.
///
/// `max_duty` is the clamp ceiling, not the channel maximum: mismatch
/// compensation is applied after the clamp without re-clamping, so the
/// PWM channels must accept `max_duty` scaled by the largest mismatch
/// coefficient (273 with the defaults).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FollowerConfig {
    pub gains: PidGains,
    pub base_speed: u16,
    pub max_duty: u16,
    pub left_mismatch: f32,
    pub right_mismatch: f32,
    pub cycle_delay_ms: u64,
}

impl Default for FollowerConfig {
    fn default() -> Self {
        Self {
            gains: PidGains::default(),
            base_speed: 155,
            max_duty: 255,
            left_mismatch: 1.0,
            right_mismatch: 1.07,
            cycle_delay_ms: 2,
        }
    }
}

impl FollowerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gains.kp < 0.0 || self.gains.ki < 0.0 || self.gains.kd < 0.0 {
            return Err(ConfigError::NegativeGain);
        }
        if self.base_speed > self.max_duty {
            return Err(ConfigError::BaseSpeedOutOfRange);
        }
        if self.left_mismatch < 0.0 || self.right_mismatch < 0.0 {
            return Err(ConfigError::InvalidMismatch);
        }
        if self.cycle_delay_ms == 0 {
            return Err(ConfigError::ZeroCycleDelay);
        }
        Ok(())
    }
}

/// One cycle's telemetry snapshot; consumed by logging only.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CycleReport {
    pub error: f32,
    pub correction: f32,
    pub left: u16,
    pub right: u16,
}

/// The closed control loop: sensor bar in, motor duties out.
///
/// Owns the error history across cycles; everything else is recomputed
/// from scratch each iteration.
pub struct LineFollower<P, PWM, const H: usize = 10> {
    sensors: LineSensorArray<P>,
    motors: DriveMotors<PWM>,
    history: ErrorHistory<H>,
    pid: PidController,
    mapper: MotorMapper,
    cycle_delay_ms: u64,
}

impl<P, PWM, const H: usize> LineFollower<P, PWM, H>
where
    P: InputPin,
    PWM: SetDutyCycle,
{
    /// Validate the configuration and assemble the pipeline.
    ///
    /// Rejection here is fatal by design: the caller has no retry path
    /// and the motors have not been driven yet.
    pub fn new(
        config: FollowerConfig,
        sensors: LineSensorArray<P>,
        motors: DriveMotors<PWM>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        tracing::info!(
            "follower configured: {} sensors, base speed {}/{}",
            sensors.len(),
            config.base_speed,
            config.max_duty
        );
        Ok(Self {
            sensors,
            motors,
            history: ErrorHistory::new(),
            pid: PidController::new(config.gains),
            mapper: MotorMapper::new(
                config.base_speed,
                config.max_duty,
                config.left_mismatch,
                config.right_mismatch,
            ),
            cycle_delay_ms: config.cycle_delay_ms,
        })
    }

    /// Run one synchronous control cycle: read the bar, estimate the
    /// error, slide the history, regulate, and write the motor duties.
    pub fn step(&mut self) -> Result<CycleReport, FollowerError<P::Error, PWM::Error>> {
        let reading = self.sensors.read_all().map_err(FollowerError::Sensor)?;
        let error = lateral_error(&reading);
        self.history.push(error);
        let correction = self.pid.correction(&self.history);
        let command = self.mapper.map(correction);
        self.motors.apply(command).map_err(FollowerError::Motor)?;
        Ok(CycleReport {
            error,
            correction,
            left: command.left,
            right: command.right,
        })
    }

    /// Drive the loop at the fixed cycle period until [`STOP_SIGNAL`].
    ///
    /// The end-of-cycle delay pins the derivative sampling interval, so
    /// it is a correctness requirement rather than pacing. On stop the
    /// motors are zeroed before returning.
    pub async fn run(&mut self) -> Result<(), FollowerError<P::Error, PWM::Error>> {
        tracing::info!("control loop running");
        loop {
            if STOP_SIGNAL.try_take().is_some() {
                self.motors.stop().map_err(FollowerError::Motor)?;
                tracing::info!("stop signalled, motors zeroed");
                return Ok(());
            }
            let report = self.step()?;
            tracing::trace!(?report, "cycle");
            Timer::after_millis(self.cycle_delay_ms).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(FollowerConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_negative_gain() {
        let config = FollowerConfig {
            gains: PidGains {
                kp: 1.0,
                ki: -0.1,
                kd: 0.0,
            },
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::NegativeGain));
    }

    #[test]
    fn rejects_base_speed_above_duty_ceiling() {
        let config = FollowerConfig {
            base_speed: 300,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::BaseSpeedOutOfRange));
    }

    #[test]
    fn rejects_negative_mismatch() {
        let config = FollowerConfig {
            right_mismatch: -1.07,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidMismatch));
    }

    #[test]
    fn rejects_zero_cycle_delay() {
        let config = FollowerConfig {
            cycle_delay_ms: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroCycleDelay));
    }
}
