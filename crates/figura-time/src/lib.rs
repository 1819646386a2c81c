//! Figura Time - Countdown scheduling for time-limited effects
//!
//! This crate implements:
//! - The countdown schedule: explicit start/stop with generation guarding
//! - Remaining-time display derivation (permanent / days / HH:MM:SS)

pub mod countdown;
pub mod display;

pub use countdown::*;
pub use display::*;
