//! Differential drive output stage.
//!
//! `MotorMapper` turns the average speed and the PID correction into a
//! pair of duty values; `DriveMotors` writes those duties to the PWM
//! channels. Each physical motor runs forward on one channel while its
//! paired reverse channel is held at zero every cycle.

use embedded_hal::pwm::SetDutyCycle;
use libm::roundf;
use serde::{Deserialize, Serialize};

/// One cycle's duty command for the two drive motors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrivePair {
    pub left: u16,
    pub right: u16,
}

/// Maps average speed plus/minus the steering correction onto the two
/// motors, with per-motor mismatch compensation.
///
/// Numeric policy: both the correction and the mismatch-scaled duties
/// are rounded half away from zero (`libm::roundf`). The raw duties are
/// clamped to `[0, max_duty]` before mismatch scaling, so compensation
/// for the weaker motor may push its final duty past `max_duty`; the
/// output stage does not re-clamp. The physical PWM channel must
/// therefore leave headroom: its real maximum has to cover `max_duty`
/// times the largest mismatch coefficient.
pub struct MotorMapper {
    base_speed: i32,
    max_duty: i32,
    left_mismatch: f32,
    right_mismatch: f32,
}

impl MotorMapper {
    pub fn new(base_speed: u16, max_duty: u16, left_mismatch: f32, right_mismatch: f32) -> Self {
        Self {
            base_speed: i32::from(base_speed),
            max_duty: i32::from(max_duty),
            left_mismatch,
            right_mismatch,
        }
    }

    /// Convert a steering correction into the per-motor duty pair.
    ///
    /// A positive correction slows the left motor and speeds up the
    /// right one.
    pub fn map(&self, correction: f32) -> DrivePair {
        let c = roundf(correction) as i32;
        let left = (self.base_speed - c).clamp(0, self.max_duty);
        let right = (self.base_speed + c).clamp(0, self.max_duty);
        DrivePair {
            left: roundf(left as f32 * self.left_mismatch) as u16,
            right: roundf(right as f32 * self.right_mismatch) as u16,
        }
    }
}

/// Two-motor PWM output stage over four `SetDutyCycle` channels.
pub struct DriveMotors<PWM> {
    left_fwd: PWM,
    left_rev: PWM,
    right_fwd: PWM,
    right_rev: PWM,
}

impl<PWM> DriveMotors<PWM>
where
    PWM: SetDutyCycle,
{
    pub fn new(left_fwd: PWM, left_rev: PWM, right_fwd: PWM, right_rev: PWM) -> Self {
        Self {
            left_fwd,
            left_rev,
            right_fwd,
            right_rev,
        }
    }

    /// Write one duty pair to the motors, holding the reverse channels
    /// at zero.
    pub fn apply(&mut self, command: DrivePair) -> Result<(), PWM::Error> {
        self.left_rev.set_duty_cycle(0)?;
        self.left_fwd.set_duty_cycle(command.left)?;
        self.right_rev.set_duty_cycle(0)?;
        self.right_fwd.set_duty_cycle(command.right)?;
        Ok(())
    }

    /// Drop every channel to zero duty; the motors-off safe state.
    pub fn stop(&mut self) -> Result<(), PWM::Error> {
        self.apply(DrivePair { left: 0, right: 0 })
    }
}
