//! Lateral line-offset estimation from a discrete sensor bar.
//!
//! A `LineReading` is one snapshot of the sensor bar: up to 16 digital
//! sensors indexed left-to-right, where a set bit means the sensor sits
//! off the line (the dark line reads low in the reflectance hardware).
//! [`lateral_error`] folds a snapshot into a single signed offset value.
//!
//! # Example
//! ```rust
//! use lfr_core::utils::math::error::{lateral_error, LineReading};
//! // Only the leftmost of 8 sensors has left the line.
//! let reading = LineReading::from_bits(0b0000_0001, 8);
//! assert_eq!(lateral_error(&reading), 42.875);
//! ```

/// Maximum number of sensors the bar supports.
pub const MAX_SENSORS: usize = 16;

/// One snapshot of the sensor bar, taken fresh each control cycle.
///
/// Bit `i` is set when sensor `i` (0 = leftmost) reads off the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineReading {
    states: u16,
    count: usize,
}

impl LineReading {
    /// Build a reading from a raw bitmask over `count` sensors.
    ///
    /// Bits at or above `count` are masked out, so a snapshot never
    /// reports sensors that are not wired.
    pub fn from_bits(states: u16, count: usize) -> Self {
        debug_assert!(count >= 1 && count <= MAX_SENSORS);
        let mask = if count >= MAX_SENSORS {
            u16::MAX
        } else {
            (1u16 << count) - 1
        };
        Self {
            states: states & mask,
            count,
        }
    }

    /// Number of sensors in this snapshot.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// `true` when sensor `i` (0 = leftmost) reads off the line.
    pub fn is_off_line(&self, i: usize) -> bool {
        self.states & (1 << i) != 0
    }

    /// Every sensor sits directly over the line.
    pub fn all_on_line(&self) -> bool {
        self.states == 0
    }
}

/// Fold a sensor snapshot into a signed lateral error.
///
/// Sensor `i` among `N` has the nominal offset `N/2 - 0.5 - i` from the
/// bar's midpoint; every off-line sensor contributes `offset^3` to the
/// total. The odd power keeps the sign of the deviation while weighting
/// the outer sensors super-linearly, so the regulator reacts harder the
/// further the line departs toward the edge of the bar.
///
/// A reading with every sensor on the line yields exactly `0.0`. A fully
/// lost line (every sensor off) also sums to near zero by symmetric
/// cancellation; that ambiguity is inherent to the weighting and is fed
/// into the regulator as-is.
pub fn lateral_error(reading: &LineReading) -> f32 {
    let n = reading.len();
    let mut error = 0.0f32;
    for i in 0..n {
        if reading.is_off_line(i) {
            let offset = n as f32 / 2.0 - 0.5 - i as f32;
            error += offset * offset * offset;
        }
    }
    error
}
