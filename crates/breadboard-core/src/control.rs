//! Control lines asserted by the control unit.
//!
//! A control line is a single named wire. The control unit raises and lowers
//! lines between ticks; chips sample them on the rising edge. A chip that
//! must react the moment a line changes (claiming the bus as soon as its
//! output enable goes high) registers a transition callback.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use crate::{ConfigurationError, Error, Result};

/// Every control line on the breadboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ControlLineId {
    PcOut,
    PcEnable,
    PcIn,
    ARegOut,
    ARegIn,
    BRegOut,
    BRegIn,
    MarIn,
    IrIn,
    IrParamOut,
    IrParamIn,
    OutRegIn,
    RamOut,
    UpdateFlags,
}

impl ControlLineId {
    pub const ALL: [Self; 14] = [
        Self::PcOut,
        Self::PcEnable,
        Self::PcIn,
        Self::ARegOut,
        Self::ARegIn,
        Self::BRegOut,
        Self::BRegIn,
        Self::MarIn,
        Self::IrIn,
        Self::IrParamOut,
        Self::IrParamIn,
        Self::OutRegIn,
        Self::RamOut,
        Self::UpdateFlags,
    ];

    /// Label printed on the breadboard schematic.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::PcOut => "PC_OUT",
            Self::PcEnable => "PC_ENABLE",
            Self::PcIn => "PC_IN",
            Self::ARegOut => "A_REG_OUT",
            Self::ARegIn => "A_REG_IN",
            Self::BRegOut => "B_REG_OUT",
            Self::BRegIn => "B_REG_IN",
            Self::MarIn => "MAR_IN",
            Self::IrIn => "IR_IN",
            Self::IrParamOut => "IR_PARAM_OUT",
            Self::IrParamIn => "IR_PARAM_IN",
            Self::OutRegIn => "OUT_REG_IN",
            Self::RamOut => "RAM_OUT",
            Self::UpdateFlags => "UPDATE_FLAGS",
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for ControlLineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ControlLineId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|id| id.name() == s)
            .ok_or_else(|| ConfigurationError::UnknownControlLine(s.to_string()).into())
    }
}

type TransitionCallback = Box<dyn Fn(bool) -> Result<()>>;

/// A single control wire.
pub struct ControlLine {
    id: ControlLineId,
    state: Cell<bool>,
    on_transition: RefCell<Option<TransitionCallback>>,
}

impl ControlLine {
    #[must_use]
    pub fn new(id: ControlLineId) -> Self {
        Self {
            id,
            state: Cell::new(false),
            on_transition: RefCell::new(None),
        }
    }

    #[must_use]
    pub fn id(&self) -> ControlLineId {
        self.id
    }

    /// Whether the line is currently asserted.
    #[must_use]
    pub fn state(&self) -> bool {
        self.state.get()
    }

    /// Drive the line high or low.
    ///
    /// The transition callback runs synchronously, once, and only when the
    /// state actually changes. The new state is kept even if the callback
    /// fails; the error reports what the chip could not do about it.
    pub fn set_state(&self, state: bool) -> Result<()> {
        if self.state.replace(state) == state {
            return Ok(());
        }
        log::trace!("{} -> {}", self.id, u8::from(state));
        match self.on_transition.borrow().as_ref() {
            Some(callback) => callback(state),
            None => Ok(()),
        }
    }

    /// Shorthand for `set_state(true)`.
    pub fn assert(&self) -> Result<()> {
        self.set_state(true)
    }

    /// Shorthand for `set_state(false)`.
    pub fn deassert(&self) -> Result<()> {
        self.set_state(false)
    }

    /// Register the transition callback. A line carries at most one.
    pub fn on_transition(&self, callback: impl Fn(bool) -> Result<()> + 'static) -> Result<()> {
        let mut slot = self.on_transition.borrow_mut();
        if slot.is_some() {
            return Err(ConfigurationError::DuplicateCallback(self.id).into());
        }
        *slot = Some(Box::new(callback));
        Ok(())
    }

    /// Whether a transition callback is registered.
    #[must_use]
    pub fn has_callback(&self) -> bool {
        self.on_transition.borrow().is_some()
    }
}

impl fmt::Debug for ControlLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlLine")
            .field("id", &self.id)
            .field("state", &self.state.get())
            .field("has_callback", &self.has_callback())
            .finish()
    }
}

/// Source of control lines, implemented by the control unit.
///
/// Microcode sequencing lives outside this crate; chips only need to look up
/// the lines they were wired to.
pub trait ControlUnit {
    fn control_line(&self, id: ControlLineId) -> Rc<ControlLine>;
}

/// One line per [`ControlLineId`], all initially deasserted.
#[derive(Debug)]
pub struct ControlLines {
    lines: Vec<Rc<ControlLine>>,
}

impl ControlLines {
    #[must_use]
    pub fn new() -> Self {
        Self {
            lines: ControlLineId::ALL
                .into_iter()
                .map(|id| Rc::new(ControlLine::new(id)))
                .collect(),
        }
    }

    /// Borrow a line without taking a reference count.
    #[must_use]
    pub fn line(&self, id: ControlLineId) -> &ControlLine {
        &self.lines[id.index()]
    }

    /// Assert or deassert a line by id.
    pub fn set(&self, id: ControlLineId, state: bool) -> Result<()> {
        self.line(id).set_state(state)
    }

    /// Deassert every line. Stops at the first callback error.
    pub fn clear_all(&self) -> Result<()> {
        self.lines.iter().try_for_each(|line| line.deassert())
    }

    /// Lines that are currently asserted, in declaration order.
    pub fn asserted(&self) -> impl Iterator<Item = ControlLineId> + '_ {
        self.lines
            .iter()
            .filter(|line| line.state())
            .map(|line| line.id())
    }
}

impl Default for ControlLines {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlUnit for ControlLines {
    fn control_line(&self, id: ControlLineId) -> Rc<ControlLine> {
        Rc::clone(&self.lines[id.index()])
    }
}
