//! 8-bit program counter.

use std::fmt;
use std::rc::{Rc, Weak};

use breadboard_core::{
    Bus, BusPort, Clock, Component, ComponentId, ControlLine, ControlLineId, ControlUnit, Latch,
    Observable, Result, Value,
};

/// Counts through program memory one address per enabled tick.
///
/// Wired to `PC_OUT` (drive the bus), `PC_ENABLE` (count) and `PC_IN`
/// (jump: load from the bus).
pub struct ProgramCounter {
    id: ComponentId,
    latch: Latch,
    bus: Rc<Bus>,
    output: BusPort,
    count_enable: Rc<ControlLine>,
    input: Rc<ControlLine>,
}

impl ProgramCounter {
    pub const MAX_VALUE: u8 = u8::MAX;

    pub fn new(clock: &mut Clock, bus: &Rc<Bus>, control: &dyn ControlUnit) -> Result<Rc<Self>> {
        let id = ComponentId::next();
        let pc = Rc::new_cyclic(|this: &Weak<Self>| {
            let owner: Weak<dyn Component> = this.clone();
            Self {
                id,
                latch: Latch::new(8),
                bus: Rc::clone(bus),
                output: BusPort::new(bus, control.control_line(ControlLineId::PcOut), id, owner),
                count_enable: control.control_line(ControlLineId::PcEnable),
                input: control.control_line(ControlLineId::PcIn),
            }
        });
        pc.output.attach()?;
        clock.connect(pc.clone());
        Ok(pc)
    }

    #[must_use]
    pub fn count_enabled(&self) -> bool {
        self.count_enable.state()
    }

    /// Load a value directly, bypassing the bus.
    pub fn set_value(&self, value: u8) {
        self.latch.set(value);
    }

    #[must_use]
    pub fn binary_value(&self) -> String {
        self.latch.binary()
    }

    #[must_use]
    pub fn is_driving(&self) -> bool {
        self.output.is_driving()
    }
}

impl Observable for ProgramCounter {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "name" => Some(self.name().into()),
            "value" => Some(self.latch.get().into()),
            "driving" => Some(self.is_driving().into()),
            "loading" => Some(self.input.state().into()),
            "count_enabled" => Some(self.count_enabled().into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &["name", "value", "driving", "loading", "count_enabled"]
    }
}

impl Component for ProgramCounter {
    fn id(&self) -> ComponentId {
        self.id
    }

    fn name(&self) -> &str {
        "PC"
    }

    fn value(&self) -> u8 {
        self.latch.get()
    }

    fn on_rising_edge(&self) -> Result<()> {
        // A jump loads the new address and suppresses counting.
        if self.input.state() {
            let value = self.bus.read();
            log::debug!("PC <- {value:#04X}");
            self.latch.set(value);
            return Ok(());
        }
        self.output.reaffirm()?;
        if self.count_enabled() {
            self.latch.set(self.latch.get().wrapping_add(1));
        }
        Ok(())
    }

    fn reset(&self) {
        self.latch.clear();
        self.output.release();
    }

    fn output_line(&self) -> Option<&ControlLine> {
        Some(self.output.line())
    }

    fn input_line(&self) -> Option<&ControlLine> {
        Some(&self.input)
    }
}

impl fmt::Debug for ProgramCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgramCounter")
            .field("value", &self.latch.get())
            .field("driving", &self.is_driving())
            .field("count_enabled", &self.count_enabled())
            .finish_non_exhaustive()
    }
}
