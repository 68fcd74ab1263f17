//! The chips of a breadboard 8-bit computer.
//!
//! | Chip | Width | Lines |
//! |------|-------|-------|
//! | `Register` (A, B, MAR, IR, IR_PARAM, OUT) | 8 | per wiring table |
//! | `FlagsRegister` | 4 | `UPDATE_FLAGS` |
//! | `ProgramCounter` | 8 | `PC_OUT`, `PC_ENABLE`, `PC_IN` |
//! | `Ram` | 8 | `RAM_OUT` (address from MAR) |

mod flags;
mod program_counter;
mod ram;
mod register;
pub mod render;

pub use flags::{Alu, AluOutputs, FlagLayout, FlagsRegister};
pub use program_counter::ProgramCounter;
pub use ram::{ADDRESSABLE_LEN, DEFAULT_RAM_CAPACITY, Ram};
pub use register::{REGISTER_WIRING, Register, RegisterWiring, SystemRegister, wiring_for};
pub use render::{ComponentStatus, ValueFormat, render, render_all};
