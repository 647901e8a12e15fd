//! Control math: lateral line-offset estimation and PID regulation.

pub mod error;
pub mod pid;
