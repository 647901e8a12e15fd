use embedded_hal_mock::eh1::digital::{Mock as PinMock, State, Transaction as PinTransaction};
use embedded_hal_mock::eh1::pwm::{Mock as PwmMock, Transaction as PwmTransaction};
use heapless::Vec;
use lfr_core::utils::controllers::drive::DriveMotors;
use lfr_core::utils::controllers::sensors::LineSensorArray;
use lfr_core::utils::controllers::{FollowerConfig, LineFollower};
use lfr_core::utils::math::error::MAX_SENSORS;
use lfr_core::utils::math::pid::PidGains;

/// Build one mock sensor bar whose pins replay the scripted snapshots.
///
/// `cycles[c]` is the off-line bitmask for cycle `c` over `count`
/// sensors (bit set = pin reads high = sensor off the line). Returns the
/// bar plus handles for `done()` verification.
fn scripted_bar(
    cycles: &[u16],
    count: usize,
) -> (LineSensorArray<PinMock>, std::vec::Vec<PinMock>) {
    let mut pins: Vec<PinMock, MAX_SENSORS> = Vec::new();
    let mut handles = std::vec::Vec::new();
    for i in 0..count {
        let expectations: std::vec::Vec<PinTransaction> = cycles
            .iter()
            .map(|bits| {
                PinTransaction::get(if bits & (1 << i) != 0 {
                    State::High
                } else {
                    State::Low
                })
            })
            .collect();
        let pin = PinMock::new(&expectations);
        handles.push(pin.clone());
        let _ = pins.push(pin);
    }
    (LineSensorArray::new(pins).unwrap(), handles)
}

/// Build the four-channel output stage with per-channel duty scripts.
fn scripted_motors(
    left_fwd: &[u16],
    right_fwd: &[u16],
    cycles: usize,
) -> (DriveMotors<PwmMock>, std::vec::Vec<PwmMock>) {
    let zeros: std::vec::Vec<PwmTransaction> = (0..cycles)
        .map(|_| PwmTransaction::set_duty_cycle(0))
        .collect();
    let lf: std::vec::Vec<PwmTransaction> = left_fwd
        .iter()
        .map(|&d| PwmTransaction::set_duty_cycle(d))
        .collect();
    let rf: std::vec::Vec<PwmTransaction> = right_fwd
        .iter()
        .map(|&d| PwmTransaction::set_duty_cycle(d))
        .collect();

    let left_fwd = PwmMock::new(&lf);
    let left_rev = PwmMock::new(&zeros);
    let right_fwd = PwmMock::new(&rf);
    let right_rev = PwmMock::new(&zeros);
    let handles = vec![
        left_fwd.clone(),
        left_rev.clone(),
        right_fwd.clone(),
        right_rev.clone(),
    ];
    (
        DriveMotors::new(left_fwd, left_rev, right_fwd, right_rev),
        handles,
    )
}

fn verify(pin_handles: std::vec::Vec<PinMock>, pwm_handles: std::vec::Vec<PwmMock>) {
    for mut handle in pin_handles {
        handle.done();
    }
    for mut handle in pwm_handles {
        handle.done();
    }
}

/// A centered line produces zero error and an even duty split.
#[test]
fn centered_line_single_step() {
    // Sensors 3 and 4 sit on the line; the outer six are off.
    let (bar, pin_handles) = scripted_bar(&[0b1110_0111], 8);
    let (motors, pwm_handles) = scripted_motors(&[155], &[155], 1);

    let config = FollowerConfig {
        right_mismatch: 1.0,
        ..Default::default()
    };
    let mut follower: LineFollower<PinMock, PwmMock> =
        LineFollower::new(config, bar, motors).unwrap();

    let report = follower.step().unwrap();
    assert_eq!(report.error, 0.0);
    assert_eq!(report.correction, 0.0);
    assert_eq!((report.left, report.right), (155, 155));

    verify(pin_handles, pwm_handles);
}

/// Scripted drift left, recenter, drift right: the correction sign
/// flips with the drift direction and every duty stays within the
/// 8-bit range.
#[test]
fn drift_and_recenter_scenario() {
    let script = [
        0b1110_0111, // centered
        0b1111_1100, // line under sensors 0-1 (drifted left)
        0b1110_0111, // recentered
        0b0011_1111, // line under sensors 6-7 (drifted right)
    ];
    let (bar, pin_handles) = scripted_bar(&script, 8);
    // kP = 1: correction equals the newest error; round(±58.5) = ±59.
    let (motors, pwm_handles) = scripted_motors(&[155, 214, 155, 96], &[155, 96, 155, 214], 4);

    let config = FollowerConfig {
        right_mismatch: 1.0,
        ..Default::default()
    };
    let mut follower: LineFollower<PinMock, PwmMock> =
        LineFollower::new(config, bar, motors).unwrap();

    let mut corrections = std::vec::Vec::new();
    for _ in 0..script.len() {
        let report = follower.step().unwrap();
        assert!(report.left <= 255 && report.right <= 255);
        corrections.push(report.correction);
    }

    assert_eq!(corrections[0], 0.0);
    assert!(corrections[1] < 0.0, "left drift must steer one way");
    assert_eq!(corrections[2], 0.0);
    assert!(corrections[3] > 0.0, "right drift must steer the other");

    verify(pin_handles, pwm_handles);
}

/// A hard correction saturates the raw duties before mismatch scaling,
/// and the compensated motor is allowed past the duty ceiling.
#[test]
fn saturation_with_mismatch_compensation() {
    // Sensors 0-2 off the line: error 61.875; kP = 3 pushes the
    // correction to 185.625, well past the duty range.
    let (bar, pin_handles) = scripted_bar(&[0b0000_0111], 8);
    // left clamps to 0; right clamps to 255 then scales to round(255 * 1.07) = 273.
    let (motors, pwm_handles) = scripted_motors(&[0], &[273], 1);

    let config = FollowerConfig {
        gains: PidGains {
            kp: 3.0,
            ki: 0.0,
            kd: 0.0,
        },
        ..Default::default()
    };
    let mut follower: LineFollower<PinMock, PwmMock> =
        LineFollower::new(config, bar, motors).unwrap();

    let report = follower.step().unwrap();
    assert_eq!(report.error, 61.875);
    assert_eq!((report.left, report.right), (0, 273));

    verify(pin_handles, pwm_handles);
}

/// A four-sensor bar works through the same uniform code path.
#[test]
fn narrow_bar_single_step() {
    // Leftmost of four sensors off the line: offset 1.5 cubed = 3.375.
    let (bar, pin_handles) = scripted_bar(&[0b0001], 4);
    let (motors, pwm_handles) = scripted_motors(&[152], &[158], 1);

    let config = FollowerConfig {
        right_mismatch: 1.0,
        ..Default::default()
    };
    let mut follower: LineFollower<PinMock, PwmMock> =
        LineFollower::new(config, bar, motors).unwrap();

    let report = follower.step().unwrap();
    assert_eq!(report.error, 3.375);
    assert_eq!((report.left, report.right), (152, 158));

    verify(pin_handles, pwm_handles);
}

/// `stop` drops every channel to zero duty.
#[test]
fn stop_zeroes_all_channels() {
    let (mut motors, pwm_handles) = scripted_motors(&[0], &[0], 1);
    motors.stop().unwrap();
    verify(std::vec::Vec::new(), pwm_handles);
}
