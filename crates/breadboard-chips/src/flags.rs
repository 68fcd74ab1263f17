//! 4-bit flags register fed by the ALU.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use breadboard_core::{
    Clock, Component, ComponentId, ControlLine, ControlLineId, ControlUnit, InvariantViolation,
    Latch, Observable, Result, Value,
};

/// Flag outputs of the ALU. The arithmetic itself lives elsewhere.
pub trait Alu {
    fn carry(&self) -> bool;
    fn zero(&self) -> bool;
}

/// ALU outputs held in cells, for machines (and tests) that set the flags
/// directly.
#[derive(Debug, Default)]
pub struct AluOutputs {
    carry: Cell<bool>,
    zero: Cell<bool>,
}

impl AluOutputs {
    #[must_use]
    pub fn new(carry: bool, zero: bool) -> Self {
        Self {
            carry: Cell::new(carry),
            zero: Cell::new(zero),
        }
    }

    pub fn set_carry(&self, carry: bool) {
        self.carry.set(carry);
    }

    pub fn set_zero(&self, zero: bool) {
        self.zero.set(zero);
    }
}

impl Alu for AluOutputs {
    fn carry(&self) -> bool {
        self.carry.get()
    }

    fn zero(&self) -> bool {
        self.zero.get()
    }
}

/// Bit masks for each flag inside the 4-bit register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FlagLayout {
    pub carry: u8,
    pub zero: u8,
}

impl FlagLayout {
    /// Carry in bit 0, zero in bit 1.
    pub const STANDARD: Self = Self {
        carry: 0b0001,
        zero: 0b0010,
    };
}

impl Default for FlagLayout {
    fn default() -> Self {
        Self::STANDARD
    }
}

const WIDTH: u8 = 4;

/// The flags register. It never touches the bus.
pub struct FlagsRegister {
    id: ComponentId,
    latch: Latch,
    layout: FlagLayout,
    update: Rc<ControlLine>,
    alu: Rc<dyn Alu>,
}

impl FlagsRegister {
    pub fn new(
        clock: &mut Clock,
        control: &dyn ControlUnit,
        alu: Rc<dyn Alu>,
        layout: FlagLayout,
    ) -> Rc<Self> {
        let flags = Rc::new(Self {
            id: ComponentId::next(),
            latch: Latch::new(WIDTH),
            layout,
            update: control.control_line(ControlLineId::UpdateFlags),
            alu,
        });
        clock.connect(flags.clone());
        flags
    }

    #[must_use]
    pub fn layout(&self) -> FlagLayout {
        self.layout
    }

    #[must_use]
    pub fn carry(&self) -> bool {
        self.latch.get() & self.layout.carry != 0
    }

    #[must_use]
    pub fn zero(&self) -> bool {
        self.latch.get() & self.layout.zero != 0
    }

    /// Set or clear one bit. Bits run 0-3.
    pub fn set_bit(&self, bit: u8, value: bool) -> Result<()> {
        self.latch.set_bit(bit, value)
    }

    pub fn get_bit(&self, bit: u8) -> Result<bool> {
        self.latch.get_bit(bit)
    }

    /// Value as four binary digits.
    #[must_use]
    pub fn binary_value(&self) -> String {
        self.latch.binary()
    }

    fn sample_alu(&self) -> Result<u8> {
        let mut value = 0;
        if self.alu.carry() {
            value |= self.layout.carry;
        }
        if self.alu.zero() {
            value |= self.layout.zero;
        }
        if value > self.latch.max_value() {
            return Err(InvariantViolation::FlagsOverflow { value }.into());
        }
        Ok(value)
    }
}

impl Observable for FlagsRegister {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "name" => Some(self.name().into()),
            "value" => Some(self.latch.get().into()),
            "loading" => Some(self.update.state().into()),
            "flags.c" => Some(self.carry().into()),
            "flags.z" => Some(self.zero().into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &["name", "value", "loading", "flags.c", "flags.z"]
    }
}

impl Component for FlagsRegister {
    fn id(&self) -> ComponentId {
        self.id
    }

    fn name(&self) -> &str {
        "FLAGS"
    }

    fn value(&self) -> u8 {
        self.latch.get()
    }

    fn bit_width(&self) -> u8 {
        WIDTH
    }

    fn on_rising_edge(&self) -> Result<()> {
        if self.update.state() {
            let value = self.sample_alu()?;
            log::debug!("FLAGS <- {value:#06b}");
            self.latch.set(value);
        }
        Ok(())
    }

    fn reset(&self) {
        self.latch.clear();
    }

    fn input_line(&self) -> Option<&ControlLine> {
        Some(&self.update)
    }
}

impl fmt::Debug for FlagsRegister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlagsRegister")
            .field("value", &self.latch.get())
            .field("layout", &self.layout)
            .finish_non_exhaustive()
    }
}
