//! A complete breadboard 8-bit computer.
//!
//! [`Machine`] owns one bus, one bank of control lines and one clock, and
//! wires every chip to them. The control unit that sequences the lines is
//! not part of the machine: callers assert lines through [`Machine::line`]
//! or [`Machine::step`] and then tick.

mod config;
mod machine;

pub use config::MachineConfig;
pub use machine::{Machine, MachineSnapshot};
