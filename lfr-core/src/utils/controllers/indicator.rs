//! Status indicator LED and the start-trigger arming wait.
//!
//! Drives a single addressable LED via `SmartLedsWrite`. While a start
//! trigger is wired, the robot holds position at the gate, toggling the
//! indicator every 25 ms, and launches the moment the trigger drops.

use embassy_time::Timer;
use embedded_hal::digital::InputPin;
use smart_leds_trait::{SmartLedsWrite, RGB8};

/// Half-period of the arming blink.
const BLINK_INTERVAL_MS: u64 = 25;

/// Single status LED with on/off state tracking.
pub struct Indicator<Driver> {
    driver: Driver,
    lit: bool,
}

impl<Driver, E> Indicator<Driver>
where
    Driver: SmartLedsWrite<Color = RGB8, Error = E>,
{
    /// Wrap an LED driver; the indicator starts dark.
    pub fn new(driver: Driver) -> Self {
        Self { driver, lit: false }
    }

    /// Switch the LED on (white) or off (black).
    pub fn set(&mut self, lit: bool) -> Result<(), E> {
        self.lit = lit;
        let color = if lit {
            RGB8 {
                r: 255,
                g: 255,
                b: 255,
            }
        } else {
            RGB8 { r: 0, g: 0, b: 0 }
        };
        self.driver.write(core::iter::once(color))
    }

    /// Flip the LED state.
    pub fn toggle(&mut self) -> Result<(), E> {
        self.set(!self.lit)
    }
}

/// Block until the start trigger reads low, blinking the indicator.
///
/// Indicator write failures are logged and do not stall arming; a
/// trigger read failure aborts the wait.
pub async fn wait_for_start<T, Driver, E>(
    trigger: &mut T,
    indicator: &mut Indicator<Driver>,
) -> Result<(), T::Error>
where
    T: InputPin,
    Driver: SmartLedsWrite<Color = RGB8, Error = E>,
    E: core::fmt::Debug,
{
    tracing::info!("holding at start gate");
    while trigger.is_high()? {
        if let Err(e) = indicator.toggle() {
            tracing::warn!("indicator write failed: {:?}", e);
        }
        Timer::after_millis(BLINK_INTERVAL_MS).await;
    }
    if let Err(e) = indicator.set(false) {
        tracing::warn!("indicator write failed: {:?}", e);
    }
    tracing::info!("start trigger released");
    Ok(())
}
