//! Closed-loop control core for a PID line-following robot on no-std
//! embedded platforms.
//!
//! For a runnable host simulation, see the `mock-mcu` member crate.
#![no_std]

pub mod utils;
