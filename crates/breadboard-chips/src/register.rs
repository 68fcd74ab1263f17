//! General-purpose 8-bit registers.
//!
//! Six registers share one implementation and differ only in which control
//! lines they are wired to. The wiring lives in a table rather than in each
//! constructor.

use std::fmt;
use std::rc::{Rc, Weak};
use std::str::FromStr;

use breadboard_core::{
    Bus, BusPort, Clock, Component, ComponentId, ConfigurationError, ControlLine, ControlLineId,
    ControlUnit, Error, Latch, Observable, Result, Value,
};

/// The registers on the breadboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemRegister {
    A,
    B,
    /// Memory address register.
    Mar,
    /// Instruction register.
    Ir,
    /// Instruction parameter register.
    IrParam,
    /// Output display register.
    Out,
}

impl SystemRegister {
    pub const ALL: [Self; 6] = [
        Self::A,
        Self::B,
        Self::Mar,
        Self::Ir,
        Self::IrParam,
        Self::Out,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::Mar => "MAR",
            Self::Ir => "IR",
            Self::IrParam => "IR_PARAM",
            Self::Out => "OUT",
        }
    }
}

impl fmt::Display for SystemRegister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SystemRegister {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|r| r.name() == s)
            .ok_or_else(|| ConfigurationError::UnknownRegister(s.to_string()).into())
    }
}

/// Control lines a register is wired to. Every register loads from the bus;
/// only some can drive it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterWiring {
    pub register: SystemRegister,
    pub output: Option<ControlLineId>,
    pub input: ControlLineId,
}

impl RegisterWiring {
    /// Find the wiring for `register` in `table`.
    pub fn lookup(table: &[Self], register: SystemRegister) -> Result<Self> {
        table
            .iter()
            .find(|w| w.register == register)
            .copied()
            .ok_or_else(|| ConfigurationError::MissingWiring(register.to_string()).into())
    }
}

pub const REGISTER_WIRING: &[RegisterWiring] = &[
    RegisterWiring {
        register: SystemRegister::A,
        output: Some(ControlLineId::ARegOut),
        input: ControlLineId::ARegIn,
    },
    RegisterWiring {
        register: SystemRegister::B,
        output: Some(ControlLineId::BRegOut),
        input: ControlLineId::BRegIn,
    },
    RegisterWiring {
        register: SystemRegister::Mar,
        output: None,
        input: ControlLineId::MarIn,
    },
    RegisterWiring {
        register: SystemRegister::Ir,
        output: None,
        input: ControlLineId::IrIn,
    },
    RegisterWiring {
        register: SystemRegister::IrParam,
        output: Some(ControlLineId::IrParamOut),
        input: ControlLineId::IrParamIn,
    },
    RegisterWiring {
        register: SystemRegister::Out,
        output: None,
        input: ControlLineId::OutRegIn,
    },
];

/// Wiring of `register` on the standard breadboard.
pub fn wiring_for(register: SystemRegister) -> Result<RegisterWiring> {
    RegisterWiring::lookup(REGISTER_WIRING, register)
}

/// An 8-bit register with a bus input and an optional bus output.
pub struct Register {
    id: ComponentId,
    register: SystemRegister,
    latch: Latch,
    bus: Rc<Bus>,
    input: Rc<ControlLine>,
    output: Option<BusPort>,
}

impl Register {
    /// Build `register` with its standard wiring and connect it to `clock`.
    pub fn new(
        register: SystemRegister,
        clock: &mut Clock,
        bus: &Rc<Bus>,
        control: &dyn ControlUnit,
    ) -> Result<Rc<Self>> {
        Self::with_wiring(wiring_for(register)?, clock, bus, control)
    }

    /// Build a register with explicit wiring.
    pub fn with_wiring(
        wiring: RegisterWiring,
        clock: &mut Clock,
        bus: &Rc<Bus>,
        control: &dyn ControlUnit,
    ) -> Result<Rc<Self>> {
        let id = ComponentId::next();
        let register = Rc::new_cyclic(|this: &Weak<Self>| {
            let owner: Weak<dyn Component> = this.clone();
            Self {
                id,
                register: wiring.register,
                latch: Latch::new(8),
                bus: Rc::clone(bus),
                input: control.control_line(wiring.input),
                output: wiring
                    .output
                    .map(|line| BusPort::new(bus, control.control_line(line), id, owner.clone())),
            }
        });
        if let Some(port) = &register.output {
            port.attach()?;
        }
        clock.connect(register.clone());
        Ok(register)
    }

    #[must_use]
    pub fn register(&self) -> SystemRegister {
        self.register
    }

    /// Load a value directly, bypassing the bus (front-panel switches).
    pub fn set_value(&self, value: u8) {
        self.latch.set(value);
    }

    /// Set or clear one bit. Bits run 0-7.
    pub fn set_bit(&self, bit: u8, value: bool) -> Result<()> {
        self.latch.set_bit(bit, value)
    }

    pub fn get_bit(&self, bit: u8) -> Result<bool> {
        self.latch.get_bit(bit)
    }

    /// Value as eight binary digits.
    #[must_use]
    pub fn binary_value(&self) -> String {
        self.latch.binary()
    }

    /// Whether this register currently drives the bus.
    #[must_use]
    pub fn is_driving(&self) -> bool {
        self.output.as_ref().is_some_and(BusPort::is_driving)
    }
}

impl Observable for Register {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "name" => Some(self.register.name().into()),
            "value" => Some(self.latch.get().into()),
            "driving" => Some(self.is_driving().into()),
            "loading" => Some(self.input.state().into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &["name", "value", "driving", "loading"]
    }
}

impl Component for Register {
    fn id(&self) -> ComponentId {
        self.id
    }

    fn name(&self) -> &str {
        self.register.name()
    }

    fn value(&self) -> u8 {
        self.latch.get()
    }

    fn on_rising_edge(&self) -> Result<()> {
        // Load wins; the driver claim is not re-affirmed on a load edge.
        if self.input.state() {
            let value = self.bus.read();
            log::debug!("{} <- {value:#04X}", self.register);
            self.latch.set(value);
            return Ok(());
        }
        match &self.output {
            Some(port) => port.reaffirm(),
            None => Ok(()),
        }
    }

    fn reset(&self) {
        self.latch.clear();
        if let Some(port) = &self.output {
            port.release();
        }
    }

    fn output_line(&self) -> Option<&ControlLine> {
        self.output.as_ref().map(BusPort::line)
    }

    fn input_line(&self) -> Option<&ControlLine> {
        Some(&self.input)
    }
}

impl fmt::Debug for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Register")
            .field("register", &self.register)
            .field("value", &self.latch.get())
            .field("driving", &self.is_driving())
            .finish_non_exhaustive()
    }
}
