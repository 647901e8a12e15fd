//! Host-side closed-loop simulation of the line follower.
//!
//! The real robot's GPIO and PWM hardware is replaced by a small track
//! model: simulated sensor pins read the line position out of the model
//! and simulated PWM channels write the commanded duties back into it,
//! so the control core steers against its own output. World state is
//! logged as one JSON line per cycle.

use core::cell::RefCell;
use core::convert::Infallible;

use clap::Parser;
use embassy_executor::{Executor, Spawner};
use embassy_time::Timer;
use embedded_hal::digital::InputPin;
use embedded_hal::pwm::SetDutyCycle;
use heapless::Vec;
use lfr_core::mk_static;
use lfr_core::utils::controllers::drive::DriveMotors;
use lfr_core::utils::controllers::indicator::{wait_for_start, Indicator};
use lfr_core::utils::controllers::sensors::LineSensorArray;
use lfr_core::utils::controllers::{FollowerConfig, LineFollower, STOP_SIGNAL};
use lfr_core::utils::math::error::MAX_SENSORS;
use lfr_core::utils::math::pid::PidGains;
use serde::Serialize;
use smart_leds_trait::{SmartLedsWrite, RGB8};
use static_cell::StaticCell;
use tracing::{error, info};

/// Lateral line shift per unit duty difference per cycle, folding the
/// steering geometry into one constant.
const STEER_GAIN: f32 = 0.01;
/// Half-width of the line in sensor-pitch units.
const LINE_HALF_WIDTH: f32 = 0.8;

#[derive(Parser)]
#[clap(version = "1.0")]
struct Opts {
    /// number of sensors on the bar (1..=16)
    #[clap(long, default_value_t = 8)]
    sensors: usize,
    /// simulated cycles before the stop signal
    #[clap(long, default_value_t = 600)]
    cycles: u64,
    /// average motor speed in duty counts
    #[clap(long, default_value_t = 155)]
    base_speed: u16,
    /// proportional gain
    #[clap(long, default_value_t = 1.0)]
    kp: f32,
    /// integral gain
    #[clap(long, default_value_t = 0.0)]
    ki: f32,
    /// derivative gain
    #[clap(long, default_value_t = 0.0)]
    kd: f32,
    /// hold at a simulated start gate before launching
    #[clap(long)]
    arm: bool,
}

/// Shared world model: where the line sits relative to the bar center
/// (in sensor-pitch units) and the duties the follower last commanded.
#[derive(Default)]
struct Track {
    line_pos: f32,
    left_duty: u16,
    right_duty: u16,
}

/// Per-cycle world telemetry, logged as one JSON line.
#[derive(Serialize)]
struct TrackSnapshot {
    cycle: u64,
    line_pos: f32,
    left_duty: u16,
    right_duty: u16,
}

/// Simulated reflectance sensor pin; reads high when off the line.
struct SimPin {
    index: usize,
    count: usize,
    track: &'static RefCell<Track>,
}

impl embedded_hal::digital::ErrorType for SimPin {
    type Error = Infallible;
}

impl InputPin for SimPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        let offset = self.count as f32 / 2.0 - 0.5 - self.index as f32;
        let track = self.track.borrow();
        Ok((offset - track.line_pos).abs() > LINE_HALF_WIDTH)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.is_high()?)
    }
}

#[derive(Clone, Copy)]
enum Channel {
    LeftFwd,
    LeftRev,
    RightFwd,
    RightRev,
}

/// Simulated PWM channel writing duties back into the track model.
struct SimPwm {
    channel: Channel,
    track: &'static RefCell<Track>,
}

impl embedded_hal::pwm::ErrorType for SimPwm {
    type Error = Infallible;
}

impl SetDutyCycle for SimPwm {
    fn max_duty_cycle(&self) -> u16 {
        255
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        let mut track = self.track.borrow_mut();
        match self.channel {
            Channel::LeftFwd => track.left_duty = duty,
            Channel::RightFwd => track.right_duty = duty,
            // The output stage pins the reverse channels at zero.
            Channel::LeftRev | Channel::RightRev => {}
        }
        Ok(())
    }
}

/// Start gate that drops after a fixed number of polls.
struct SimTrigger {
    polls_remaining: u32,
}

impl embedded_hal::digital::ErrorType for SimTrigger {
    type Error = Infallible;
}

impl InputPin for SimTrigger {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        if self.polls_remaining > 0 {
            self.polls_remaining -= 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.is_high()?)
    }
}

/// Indicator LED driver that logs to the console.
struct ConsoleLed;

impl SmartLedsWrite for ConsoleLed {
    type Color = RGB8;
    type Error = Infallible;

    fn write<T, I>(&mut self, iterator: T) -> Result<(), Self::Error>
    where
        T: IntoIterator<Item = I>,
        I: Into<Self::Color>,
    {
        for color in iterator {
            let c: RGB8 = color.into();
            info!("LED: {:?}", c);
        }
        Ok(())
    }
}

#[embassy_executor::task]
async fn follower_task(mut follower: LineFollower<SimPin, SimPwm>) {
    match follower.run().await {
        Ok(()) => {
            info!("follower stopped cleanly");
            std::process::exit(0);
        }
        Err(e) => {
            error!("follower failed: {:?}", e);
            std::process::exit(1);
        }
    }
}

#[embassy_executor::task]
async fn world_task(track: &'static RefCell<Track>, cycles: u64, cycle_delay_ms: u64) {
    for cycle in 0..cycles {
        Timer::after_millis(cycle_delay_ms).await;
        let snapshot = {
            let mut t = track.borrow_mut();
            // Scripted disturbance: drift left for a third of the run,
            // drift right for another third, then hold.
            let drift = if cycle < cycles / 3 {
                0.02
            } else if cycle < 2 * cycles / 3 {
                -0.02
            } else {
                0.0
            };
            t.line_pos = (t.line_pos
                + drift
                + STEER_GAIN * (f32::from(t.right_duty) - f32::from(t.left_duty)))
            .clamp(-4.0, 4.0);
            TrackSnapshot {
                cycle,
                line_pos: t.line_pos,
                left_duty: t.left_duty,
                right_duty: t.right_duty,
            }
        };
        info!("{}", serde_json::to_string(&snapshot).unwrap());
    }
    info!("simulation complete, signalling stop");
    STOP_SIGNAL.signal(());
}

#[embassy_executor::task]
async fn main_task(spawner: Spawner) {
    let opts: Opts = Opts::parse();

    let track: &'static RefCell<Track> =
        mk_static!(RefCell<Track>, RefCell::new(Track::default()));

    assert!(
        opts.sensors >= 1 && opts.sensors <= MAX_SENSORS,
        "sensor count must be 1..=16"
    );
    let mut pins: Vec<SimPin, MAX_SENSORS> = Vec::new();
    for index in 0..opts.sensors {
        let _ = pins.push(SimPin {
            index,
            count: opts.sensors,
            track,
        });
    }
    let bar = LineSensorArray::new(pins).unwrap();

    let motors = DriveMotors::new(
        SimPwm {
            channel: Channel::LeftFwd,
            track,
        },
        SimPwm {
            channel: Channel::LeftRev,
            track,
        },
        SimPwm {
            channel: Channel::RightFwd,
            track,
        },
        SimPwm {
            channel: Channel::RightRev,
            track,
        },
    );

    let config = FollowerConfig {
        gains: PidGains {
            kp: opts.kp,
            ki: opts.ki,
            kd: opts.kd,
        },
        base_speed: opts.base_speed,
        ..Default::default()
    };
    info!("config: {}", serde_json::to_string(&config).unwrap());

    let follower: LineFollower<SimPin, SimPwm> =
        LineFollower::new(config, bar, motors).expect("invalid configuration");

    if opts.arm {
        let mut trigger = SimTrigger {
            polls_remaining: 40,
        };
        let mut indicator = Indicator::new(ConsoleLed);
        wait_for_start(&mut trigger, &mut indicator).await.unwrap();
    }

    spawner
        .spawn(world_task(track, opts.cycles, config.cycle_delay_ms))
        .unwrap();
    spawner.spawn(follower_task(follower)).unwrap();
}

static EXECUTOR: StaticCell<Executor> = StaticCell::new();

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let executor = EXECUTOR.init(Executor::new());
    executor.run(|spawner| {
        spawner.spawn(main_task(spawner)).unwrap();
    });
}
