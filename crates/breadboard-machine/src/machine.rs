//! Top-level breadboard system.
//!
//! Chips are connected to the clock in a fixed order, which is also the
//! order they see each clock edge and the order they are drawn:
//!
//! PC, A, B, MAR, IR, IR_PARAM, OUT, FLAGS, RAM
//!
//! Loads happen on the rising edge. The bus is read live, so a chip that
//! loads later in the order sees a driver that has already updated itself
//! during the same edge (the counter driving and counting at once).

use std::fmt;
use std::rc::Rc;

use breadboard_chips::{
    Alu, FlagsRegister, ProgramCounter, Ram, Register, SystemRegister, ValueFormat, render_all,
};
use breadboard_core::{
    Bus, Clock, Component, ControlLine, ControlLineId, ControlLines, InvariantViolation,
    Observable, Result, Ticks, Value,
};

use crate::config::MachineConfig;

/// Values of every chip at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineSnapshot {
    pub ticks: Ticks,
    /// Byte on the bus.
    pub bus: u8,
    /// Name of the chip driving the bus, if any.
    pub driver: Option<String>,
    /// `(name, value)` for each chip in clock order.
    pub values: Vec<(String, u8)>,
    pub asserted: Vec<ControlLineId>,
}

impl MachineSnapshot {
    /// Value of the chip called `name`.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<u8> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|&(_, v)| v)
    }
}

/// The breadboard computer.
pub struct Machine {
    config: MachineConfig,
    bus: Rc<Bus>,
    lines: ControlLines,
    clock: Clock,
    pc: Rc<ProgramCounter>,
    a: Rc<Register>,
    b: Rc<Register>,
    mar: Rc<Register>,
    ir: Rc<Register>,
    ir_param: Rc<Register>,
    out: Rc<Register>,
    flags: Rc<FlagsRegister>,
    ram: Rc<Ram>,
}

impl Machine {
    /// Assemble a machine from `config`, with flags fed by `alu`.
    pub fn new(config: &MachineConfig, alu: Rc<dyn Alu>) -> Result<Self> {
        let bus = Rc::new(Bus::new(config.bus));
        let lines = ControlLines::new();
        let mut clock = Clock::new();

        let pc = ProgramCounter::new(&mut clock, &bus, &lines)?;
        let mut register = |id| Register::new(id, &mut clock, &bus, &lines);
        let a = register(SystemRegister::A)?;
        let b = register(SystemRegister::B)?;
        let mar = register(SystemRegister::Mar)?;
        let ir = register(SystemRegister::Ir)?;
        let ir_param = register(SystemRegister::IrParam)?;
        let out = register(SystemRegister::Out)?;
        let flags = FlagsRegister::new(&mut clock, &lines, alu, config.flag_layout);
        let ram = Ram::new(&mut clock, &bus, &lines, mar.clone(), config.ram_capacity)?;

        log::info!(
            "machine assembled: {} chips, {} bytes RAM, {:?} contention",
            clock.components().len(),
            ram.capacity(),
            bus.config().contention
        );

        Ok(Self {
            config: *config,
            bus,
            lines,
            clock,
            pc,
            a,
            b,
            mar,
            ir,
            ir_param,
            out,
            flags,
            ram,
        })
    }

    #[must_use]
    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    #[must_use]
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    #[must_use]
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    #[must_use]
    pub fn pc(&self) -> &ProgramCounter {
        &self.pc
    }

    #[must_use]
    pub fn register(&self, id: SystemRegister) -> &Register {
        match id {
            SystemRegister::A => &self.a,
            SystemRegister::B => &self.b,
            SystemRegister::Mar => &self.mar,
            SystemRegister::Ir => &self.ir,
            SystemRegister::IrParam => &self.ir_param,
            SystemRegister::Out => &self.out,
        }
    }

    #[must_use]
    pub fn flags(&self) -> &FlagsRegister {
        &self.flags
    }

    #[must_use]
    pub fn ram(&self) -> &Ram {
        &self.ram
    }

    #[must_use]
    pub fn line(&self, id: ControlLineId) -> &ControlLine {
        self.lines.line(id)
    }

    #[must_use]
    pub fn lines(&self) -> &ControlLines {
        &self.lines
    }

    #[must_use]
    pub fn ticks(&self) -> Ticks {
        self.clock.ticks()
    }

    /// Current bus value.
    #[must_use]
    pub fn bus_value(&self) -> u8 {
        self.bus.read()
    }

    /// Run one clock tick.
    pub fn tick(&mut self) -> Result<()> {
        self.clock.tick()
    }

    pub fn tick_n(&mut self, count: u64) -> Result<()> {
        self.clock.tick_n(count)
    }

    /// One microcode step: drop every line, raise `asserted`, tick.
    pub fn step(&mut self, asserted: &[ControlLineId]) -> Result<()> {
        self.lines.clear_all()?;
        for &id in asserted {
            self.lines.set(id, true)?;
        }
        self.clock.tick()
    }

    /// Program RAM from address 0.
    pub fn program(&self, bytes: &[u8]) -> Result<()> {
        self.ram.load(0, bytes)?;
        log::info!("programmed {} bytes", bytes.len());
        Ok(())
    }

    /// Return to power-on state.
    ///
    /// Every line is lowered, every chip is zeroed (RAM included) and the
    /// tick counter restarts.
    pub fn reset(&mut self) -> Result<()> {
        self.lines.clear_all()?;
        self.clock.reset_components();
        self.clock.reset_counter();
        log::info!("machine reset");
        Ok(())
    }

    /// Check that the bus driver is one of this machine's chips and that
    /// its output line is raised.
    pub fn check_driver_exclusivity(&self) -> Result<()> {
        let Some(driver) = self.bus.driver() else {
            return Ok(());
        };
        let Some(component) = self.clock.components().iter().find(|c| c.id() == driver) else {
            return Err(InvariantViolation::UnknownDriver {
                driver: driver.to_string(),
            }
            .into());
        };
        if component.output_line().is_some_and(ControlLine::state) {
            Ok(())
        } else {
            Err(InvariantViolation::DriverNotAsserted {
                driver: component.name().to_string(),
            }
            .into())
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> MachineSnapshot {
        MachineSnapshot {
            ticks: self.clock.ticks(),
            bus: self.bus.read(),
            driver: self.bus.driver_component().map(|c| c.name().to_string()),
            values: self
                .clock
                .components()
                .iter()
                .map(|c| (c.name().to_string(), c.value()))
                .collect(),
            asserted: self.lines.asserted().collect(),
        }
    }

    /// Draw the front panel.
    pub fn render(&self, format: ValueFormat, out: &mut impl fmt::Write) -> fmt::Result {
        render_all(&self.clock, &self.bus, format, out)
    }

    fn chip(&self, prefix: &str) -> Option<&dyn Component> {
        let chip: &dyn Component = match prefix {
            "pc" => &*self.pc,
            "a" => &*self.a,
            "b" => &*self.b,
            "mar" => &*self.mar,
            "ir" => &*self.ir,
            "ir_param" => &*self.ir_param,
            "out" => &*self.out,
            "flags" => &*self.flags,
            "ram" => &*self.ram,
            _ => return None,
        };
        Some(chip)
    }
}

impl Observable for Machine {
    fn query(&self, path: &str) -> Option<Value> {
        if let Some((prefix, rest)) = path.split_once('.') {
            if prefix == "bus" {
                return match rest {
                    "value" => Some(self.bus.read().into()),
                    "driver" => Some(
                        self.bus
                            .driver_component()
                            .map_or_else(|| "-".to_string(), |c| c.name().to_string())
                            .into(),
                    ),
                    _ => None,
                };
            }
            if prefix == "line" {
                let id: ControlLineId = rest.parse().ok()?;
                return Some(self.lines.line(id).state().into());
            }
            // Flags answers its own "flags.c" and "flags.z".
            let chip = self.chip(prefix)?;
            return chip.query(rest).or_else(|| chip.query(path));
        }
        match path {
            "ticks" => Some(self.clock.ticks().get().into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "pc.<chip_paths>",
            "a.<chip_paths>",
            "b.<chip_paths>",
            "mar.<chip_paths>",
            "ir.<chip_paths>",
            "ir_param.<chip_paths>",
            "out.<chip_paths>",
            "flags.<chip_paths>",
            "ram.<chip_paths>",
            "bus.value",
            "bus.driver",
            "line.<LABEL>",
            "ticks",
        ]
    }
}

impl fmt::Debug for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Machine")
            .field("config", &self.config)
            .field("bus", &self.bus)
            .field("ticks", &self.clock.ticks())
            .finish_non_exhaustive()
    }
}
