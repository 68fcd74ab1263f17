//! Byte-addressable RAM addressed through the MAR.
//!
//! The chip on the breadboard is 1K, but the MAR is a single byte, so only
//! the first 256 bytes can ever be reached. Reads go through the bus like
//! any other chip; writes are immediate calls with no control line or clock
//! edge behind them.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use breadboard_core::{
    Bus, BusPort, Clock, Component, ComponentId, ConfigurationError, ControlLine, ControlLineId,
    ControlUnit, Observable, RangeError, Result, Value,
};

use crate::Register;

/// Size of the RAM chip fitted to the breadboard.
pub const DEFAULT_RAM_CAPACITY: usize = 1024;

/// Addresses reachable through an 8-bit MAR.
pub const ADDRESSABLE_LEN: usize = 1 << u8::BITS;

pub struct Ram {
    id: ComponentId,
    store: RefCell<Vec<u8>>,
    mar: Rc<Register>,
    output: BusPort,
}

impl Ram {
    /// Build a zeroed RAM of `capacity` bytes addressed by `mar`.
    ///
    /// `capacity` must cover every MAR value.
    pub fn new(
        clock: &mut Clock,
        bus: &Rc<Bus>,
        control: &dyn ControlUnit,
        mar: Rc<Register>,
        capacity: usize,
    ) -> Result<Rc<Self>> {
        if capacity < ADDRESSABLE_LEN {
            return Err(ConfigurationError::RamTooSmall {
                capacity,
                required: ADDRESSABLE_LEN,
            }
            .into());
        }
        let id = ComponentId::next();
        let ram = Rc::new_cyclic(|this: &Weak<Self>| {
            let owner: Weak<dyn Component> = this.clone();
            Self {
                id,
                store: RefCell::new(vec![0; capacity]),
                mar,
                output: BusPort::new(bus, control.control_line(ControlLineId::RamOut), id, owner),
            }
        });
        ram.output.attach()?;
        clock.connect(ram.clone());
        Ok(ram)
    }

    /// Allocated size in bytes.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.store.borrow().len()
    }

    /// Addresses the MAR can reach.
    #[must_use]
    pub fn addressable_len(&self) -> usize {
        ADDRESSABLE_LEN
    }

    /// Current address, taken from the MAR.
    #[must_use]
    pub fn address(&self) -> u8 {
        self.mar.value()
    }

    /// Byte at the MAR address.
    #[must_use]
    pub fn read(&self) -> u8 {
        self.read_at(self.address())
    }

    /// Store `value` at the MAR address, immediately.
    pub fn write(&self, value: u8) {
        self.write_at(self.address(), value);
    }

    #[must_use]
    pub fn read_at(&self, address: u8) -> u8 {
        self.store.borrow()[usize::from(address)]
    }

    pub fn write_at(&self, address: u8, value: u8) {
        log::debug!("RAM[{address:#04X}] <- {value:#04X}");
        self.store.borrow_mut()[usize::from(address)] = value;
    }

    /// Program `bytes` starting at `start`.
    ///
    /// Fails without writing anything if the image runs past the last
    /// addressable byte.
    pub fn load(&self, start: u8, bytes: &[u8]) -> Result<()> {
        let start = usize::from(start);
        let end = start + bytes.len();
        if end > ADDRESSABLE_LEN {
            return Err(RangeError::Address {
                address: end - 1,
                len: ADDRESSABLE_LEN,
            }
            .into());
        }
        self.store.borrow_mut()[start..end].copy_from_slice(bytes);
        Ok(())
    }

    #[must_use]
    pub fn is_driving(&self) -> bool {
        self.output.is_driving()
    }
}

impl Observable for Ram {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "name" => Some(self.name().into()),
            "value" => Some(self.read().into()),
            "address" => Some(self.address().into()),
            "driving" => Some(self.is_driving().into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &["name", "value", "address", "driving"]
    }
}

impl Component for Ram {
    fn id(&self) -> ComponentId {
        self.id
    }

    fn name(&self) -> &str {
        "RAM"
    }

    fn value(&self) -> u8 {
        self.read()
    }

    fn on_rising_edge(&self) -> Result<()> {
        self.output.reaffirm()
    }

    /// Zeroes the whole store, not just the MAR address, and releases the
    /// bus.
    fn reset(&self) {
        self.store.borrow_mut().fill(0);
        self.output.release();
    }

    fn output_line(&self) -> Option<&ControlLine> {
        Some(self.output.line())
    }
}

impl fmt::Debug for Ram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ram")
            .field("capacity", &self.capacity())
            .field("address", &self.address())
            .field("driving", &self.is_driving())
            .finish_non_exhaustive()
    }
}
