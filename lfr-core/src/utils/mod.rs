//! Utility re-exports and helper macros for the line-follower core.
//!
//! This module re-exports the control-loop components, timing, and the
//! regulator math:
//!
//! - `controllers`: sensor bar input, drive output stage, status indicator,
//!   and the `LineFollower` control loop
//! - `math`: lateral error estimation and the bounded-window PID regulator
//!
//! The `mk_static!` macro simplifies static initialization in no-std contexts.

pub mod controllers;
pub mod math;

pub use controllers::{FollowerConfig, LineFollower};
pub use embassy_time::*;
pub use math::pid::PidController;

#[macro_export]
/// Initialize a no-std static cell and write the given value into it.
///
/// This macro creates a `static_cell::StaticCell` for type `$t` and initializes
/// it with `$val`, returning a mutable reference to the stored value.
macro_rules! mk_static {
    ($t:ty, $val:expr) => {{
        static STATIC_CELL: static_cell::StaticCell<$t> = static_cell::StaticCell::new();
        STATIC_CELL.uninit().write($val)
    }};
}
