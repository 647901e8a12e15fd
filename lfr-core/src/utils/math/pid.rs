//! Bounded-window PID regulation over the recent error history.
//!
//! The regulator is a pure function of a fixed-size sliding window of
//! error samples: P reads the newest sample, I the window sum, and D the
//! difference between the newest and oldest samples. Bounding the window
//! bounds the time span the integral term can accumulate over, which is
//! what prevents integral windup on long runs.
//!
//! # Example
//! ```rust
//! use lfr_core::utils::math::pid::{ErrorHistory, PidController, PidGains};
//! let mut history: ErrorHistory = ErrorHistory::new();
//! history.push(2.5);
//! let pid = PidController::new(PidGains::default());
//! assert_eq!(pid.correction(&history), 2.5);
//! ```

use serde::{Deserialize, Serialize};

/// Fixed-capacity sliding window of recent error samples.
///
/// The window always holds exactly `H` samples, oldest first. It starts
/// zero-filled so the first integral and derivative terms see a neutral
/// history instead of garbage. Push, newest, oldest, and sum are all
/// O(1); the sum is maintained incrementally as samples are exchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErrorHistory<const H: usize = 10> {
    buf: [f32; H],
    // Index of the oldest sample; the newest sits just behind it.
    head: usize,
    sum: f32,
}

impl<const H: usize> ErrorHistory<H> {
    /// Create a zero-filled history.
    ///
    /// The window must hold at least one sample; a zero-length window
    /// is rejected at compile time:
    ///
    /// ```compile_fail
    /// use lfr_core::utils::math::pid::ErrorHistory;
    /// let history: ErrorHistory<0> = ErrorHistory::new();
    /// ```
    pub const fn new() -> Self {
        const {
            assert!(H > 0, "history window must hold at least one sample");
        }
        Self {
            buf: [0.0; H],
            head: 0,
            sum: 0.0,
        }
    }

    /// Window length; constant for the lifetime of the history.
    pub const fn len(&self) -> usize {
        H
    }

    pub const fn is_empty(&self) -> bool {
        H == 0
    }

    /// Evict the oldest sample and append `error` as the newest.
    pub fn push(&mut self, error: f32) {
        self.sum += error - self.buf[self.head];
        self.buf[self.head] = error;
        self.head = (self.head + 1) % H;
    }

    /// Most recently pushed sample.
    pub fn newest(&self) -> f32 {
        self.buf[(self.head + H - 1) % H]
    }

    /// Sample about to be evicted by the next push.
    pub fn oldest(&self) -> f32 {
        self.buf[self.head]
    }

    /// Sum of all `H` samples in the window.
    pub fn sum(&self) -> f32 {
        self.sum
    }
}

impl<const H: usize> Default for ErrorHistory<H> {
    fn default() -> Self {
        Self::new()
    }
}

/// PID feedback gains, fixed at configuration time.
///
/// The usual tuning order: pick `kp` with `ki = kd = 0` until the robot
/// holds the line through the sharpest turns at low speed, then raise the
/// speed and add `kd`, and only then add `ki` (useful on looping tracks
/// where accumulated offset picks the wrong branch).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
}

impl Default for PidGains {
    /// Pure proportional regulator; the starting point of the tuning
    /// procedure.
    fn default() -> Self {
        Self {
            kp: 1.0,
            ki: 0.0,
            kd: 0.0,
        }
    }
}

/// Stateless PID regulator over an [`ErrorHistory`] window.
pub struct PidController {
    gains: PidGains,
}

impl PidController {
    pub fn new(gains: PidGains) -> Self {
        Self { gains }
    }

    /// Combine the P, I, and D terms into a single steering correction.
    pub fn correction<const H: usize>(&self, history: &ErrorHistory<H>) -> f32 {
        let p = history.newest() * self.gains.kp;
        let i = history.sum() * self.gains.ki;
        let d = (history.newest() - history.oldest()) * self.gains.kd;
        p + i + d
    }
}
