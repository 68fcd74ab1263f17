//! Core engine for a breadboard 8-bit computer.
//!
//! Every chip sits on one shared 8-bit bus and is gated by named control
//! lines. The clock drives a rising-edge phase and then a falling-edge phase
//! over every connected chip, in the order the chips were connected. Nothing
//! happens between ticks except control-line changes made by the control
//! unit.

mod bus;
mod clock;
mod component;
mod control;
mod error;
mod latch;
mod observable;
mod ticks;

#[cfg(feature = "test-utils")]
pub mod test_utils;

pub use bus::{Bus, BusConfig, BusPort, ContentionPolicy};
pub use clock::Clock;
pub use component::{Component, ComponentId};
pub use control::{ControlLine, ControlLineId, ControlLines, ControlUnit};
pub use error::{ConfigurationError, Error, InvariantViolation, RangeError, Result};
pub use latch::Latch;
pub use observable::{Observable, Value};
pub use ticks::Ticks;
