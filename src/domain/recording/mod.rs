//! Recording time values

mod duration;

pub use duration::{format_clock, Duration};
