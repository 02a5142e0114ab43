//! Day boundaries, quiet hours and free-time detection.
//!
//! This module provides:
//! - The day context a planning pass works on
//! - Recurring quiet hours resolved to concrete intervals
//! - Gap detection between committed blocks

mod day;
mod gap;
mod quiet_hours;

pub use day::DayContext;
pub use gap::{free_minutes, GapCalculator, DEFAULT_MIN_GAP_MINUTES};
pub use quiet_hours::{QuietHoursPolicy, QuietWindow};
