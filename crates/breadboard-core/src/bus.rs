//! The shared 8-bit data bus.
//!
//! The bus carries exactly one byte, supplied by whichever chip currently
//! drives it. Chips claim the bus when their output line goes high and
//! release it when the line goes low; [`BusPort`] is the one place that
//! wiring lives.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::{Component, ComponentId, ControlLine, InvariantViolation, Result};

/// What the bus does when a second chip asserts it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ContentionPolicy {
    /// Refuse the claim and report `InvariantViolation::BusContention`.
    #[default]
    Error,
    /// The newest claimant takes the bus. Real hardware would short two
    /// outputs together; this mode mirrors what a sloppy simulator shows.
    LastWins,
}

/// Bus configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BusConfig {
    pub contention: ContentionPolicy,
}

struct Driver {
    id: ComponentId,
    component: Weak<dyn Component>,
}

/// The data bus.
///
/// Reads return the driver's current value. With no driver the bus keeps
/// the last value it carried (zero at power-on), like a bus with weak
/// holding resistors.
pub struct Bus {
    config: BusConfig,
    latched: Cell<u8>,
    driver: RefCell<Option<Driver>>,
}

impl Bus {
    #[must_use]
    pub fn new(config: BusConfig) -> Self {
        Self {
            config,
            latched: Cell::new(0),
            driver: RefCell::new(None),
        }
    }

    #[must_use]
    pub fn config(&self) -> BusConfig {
        self.config
    }

    /// Current bus value.
    #[must_use]
    pub fn read(&self) -> u8 {
        if let Some(driver) = self.driver_component() {
            self.latched.set(driver.value());
        }
        self.latched.get()
    }

    /// Identity of the current driver, if any.
    #[must_use]
    pub fn driver(&self) -> Option<ComponentId> {
        self.driver_component().map(|c| c.id())
    }

    /// The chip currently driving the bus.
    ///
    /// A driver that has since been dropped counts as no driver.
    #[must_use]
    pub fn driver_component(&self) -> Option<Rc<dyn Component>> {
        self.driver
            .borrow()
            .as_ref()
            .and_then(|driver| driver.component.upgrade())
    }

    #[must_use]
    pub fn is_driven_by(&self, id: ComponentId) -> bool {
        self.driver() == Some(id)
    }

    /// Make `component` the driver, or clear the driver with `None`.
    pub fn set_driver(&self, component: Option<&Rc<dyn Component>>) -> Result<()> {
        match component {
            Some(component) => self.claim(component.id(), &Rc::downgrade(component)),
            None => {
                self.clear_driver();
                Ok(())
            }
        }
    }

    /// Claim the bus for `id`. Re-claiming by the current driver is a no-op.
    pub fn claim(&self, id: ComponentId, component: &Weak<dyn Component>) -> Result<()> {
        if let Some(current) = self.driver_component() {
            if current.id() == id {
                return Ok(());
            }
            let claimant = component
                .upgrade()
                .map_or_else(|| id.to_string(), |c| c.name().to_string());
            match self.config.contention {
                ContentionPolicy::Error => {
                    return Err(InvariantViolation::BusContention {
                        current: current.name().to_string(),
                        claimant,
                    }
                    .into());
                }
                ContentionPolicy::LastWins => {
                    log::warn!(
                        "bus contention: {claimant} takes the bus from {}",
                        current.name()
                    );
                }
            }
        }
        log::debug!("bus driver -> {id}");
        *self.driver.borrow_mut() = Some(Driver {
            id,
            component: component.clone(),
        });
        Ok(())
    }

    /// Release the bus if `id` currently drives it. Returns whether it did.
    ///
    /// The driver's value stays on the bus after release.
    pub fn release(&self, id: ComponentId) -> bool {
        if !self.is_driven_by(id) {
            return false;
        }
        self.clear_driver();
        true
    }

    /// Drop whatever driver is recorded, keeping its last value latched.
    pub fn clear_driver(&self) {
        let _ = self.read();
        if let Some(driver) = self.driver.borrow_mut().take() {
            log::debug!("bus driver {} released", driver.id);
        }
    }
}

impl std::fmt::Debug for Bus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bus")
            .field("value", &self.latched.get())
            .field("driver", &self.driver())
            .field("config", &self.config)
            .finish()
    }
}

/// Connects a chip's output line to the bus.
///
/// Attaching registers the line's transition callback: the line going high
/// claims the bus for the chip, the line going low releases it if the chip
/// still holds it. Chips also call [`BusPort::reaffirm`] on every rising
/// edge so a chip whose line stays high keeps (or retakes) the bus.
pub struct BusPort {
    bus: Rc<Bus>,
    line: Rc<ControlLine>,
    id: ComponentId,
    owner: Weak<dyn Component>,
}

impl BusPort {
    /// Build a port without touching the line. Call [`BusPort::attach`]
    /// once the owning chip is fully constructed.
    #[must_use]
    pub fn new(
        bus: &Rc<Bus>,
        line: Rc<ControlLine>,
        id: ComponentId,
        owner: Weak<dyn Component>,
    ) -> Self {
        Self {
            bus: Rc::clone(bus),
            line,
            id,
            owner,
        }
    }

    /// Register the claim/release callback on the output line.
    pub fn attach(&self) -> Result<()> {
        let bus = Rc::downgrade(&self.bus);
        let id = self.id;
        let owner = self.owner.clone();
        self.line.on_transition(move |asserted| {
            let Some(bus) = bus.upgrade() else {
                return Ok(());
            };
            if asserted {
                bus.claim(id, &owner)
            } else {
                bus.release(id);
                Ok(())
            }
        })
    }

    /// Claim the bus again if the output line is still high.
    pub fn reaffirm(&self) -> Result<()> {
        if self.line.state() {
            self.bus.claim(self.id, &self.owner)
        } else {
            Ok(())
        }
    }

    /// Give up the bus if held.
    pub fn release(&self) -> bool {
        self.bus.release(self.id)
    }

    #[must_use]
    pub fn is_driving(&self) -> bool {
        self.bus.is_driven_by(self.id)
    }

    #[must_use]
    pub fn line(&self) -> &ControlLine {
        &self.line
    }

    #[must_use]
    pub fn bus(&self) -> &Bus {
        &self.bus
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ControlLineId, Error, Observable, Value};

    /// Minimal chip holding a fixed byte.
    struct Fixed {
        id: ComponentId,
        name: &'static str,
        value: Cell<u8>,
    }

    impl Fixed {
        fn new(name: &'static str, value: u8) -> Rc<dyn Component> {
            Rc::new(Self {
                id: ComponentId::next(),
                name,
                value: Cell::new(value),
            })
        }
    }

    impl Observable for Fixed {
        fn query(&self, path: &str) -> Option<Value> {
            (path == "value").then(|| self.value.get().into())
        }

        fn query_paths(&self) -> &'static [&'static str] {
            &["value"]
        }
    }

    impl Component for Fixed {
        fn id(&self) -> ComponentId {
            self.id
        }

        fn name(&self) -> &str {
            self.name
        }

        fn value(&self) -> u8 {
            self.value.get()
        }

        fn on_rising_edge(&self) -> Result<()> {
            Ok(())
        }

        fn reset(&self) {
            self.value.set(0);
        }
    }

    #[test]
    fn read_echoes_driver_value() {
        let bus = Bus::new(BusConfig::default());
        let a = Fixed::new("A", 0x10);
        bus.set_driver(Some(&a)).unwrap();
        assert_eq!(bus.driver(), Some(a.id()));
        assert_eq!(bus.read(), 0x10);
    }

    #[test]
    fn released_bus_keeps_last_value() {
        let bus = Bus::new(BusConfig::default());
        assert_eq!(bus.read(), 0);

        let a = Fixed::new("A", 0x5A);
        bus.set_driver(Some(&a)).unwrap();
        assert!(bus.release(a.id()));
        assert_eq!(bus.driver(), None);
        assert_eq!(bus.read(), 0x5A);
    }

    #[test]
    fn release_by_non_driver_is_ignored() {
        let bus = Bus::new(BusConfig::default());
        let a = Fixed::new("A", 1);
        let b = Fixed::new("B", 2);
        bus.set_driver(Some(&a)).unwrap();
        assert!(!bus.release(b.id()));
        assert_eq!(bus.driver(), Some(a.id()));
    }

    #[test]
    fn second_driver_is_contention_by_default() {
        let bus = Bus::new(BusConfig::default());
        let a = Fixed::new("A", 1);
        let b = Fixed::new("B", 2);
        bus.set_driver(Some(&a)).unwrap();
        let err = bus.set_driver(Some(&b)).unwrap_err();
        assert_eq!(
            err,
            Error::Invariant(InvariantViolation::BusContention {
                current: "A".into(),
                claimant: "B".into(),
            })
        );
        assert_eq!(bus.driver(), Some(a.id()));
    }

    #[test]
    fn last_wins_policy_replaces_driver() {
        let bus = Bus::new(BusConfig {
            contention: ContentionPolicy::LastWins,
        });
        let a = Fixed::new("A", 1);
        let b = Fixed::new("B", 2);
        bus.set_driver(Some(&a)).unwrap();
        bus.set_driver(Some(&b)).unwrap();
        assert_eq!(bus.driver(), Some(b.id()));
        assert_eq!(bus.read(), 2);
    }

    #[test]
    fn dropped_driver_reads_as_none() {
        let bus = Bus::new(BusConfig::default());
        {
            let a = Fixed::new("A", 7);
            bus.set_driver(Some(&a)).unwrap();
            assert_eq!(bus.read(), 7);
        }
        assert_eq!(bus.driver(), None);
        assert_eq!(bus.read(), 7);
    }

    #[test]
    fn port_follows_output_line() {
        let bus = Rc::new(Bus::new(BusConfig::default()));
        let line = Rc::new(ControlLine::new(ControlLineId::ARegOut));
        let a = Fixed::new("A", 0x33);
        let port = BusPort::new(&bus, Rc::clone(&line), a.id(), Rc::downgrade(&a));
        port.attach().unwrap();

        line.assert().unwrap();
        assert!(port.is_driving());
        assert_eq!(bus.read(), 0x33);

        line.deassert().unwrap();
        assert!(!port.is_driving());
        assert_eq!(bus.driver(), None);
    }

    #[test]
    fn port_reaffirm_retakes_bus_after_reset() {
        let bus = Rc::new(Bus::new(BusConfig::default()));
        let line = Rc::new(ControlLine::new(ControlLineId::BRegOut));
        let b = Fixed::new("B", 9);
        let port = BusPort::new(&bus, Rc::clone(&line), b.id(), Rc::downgrade(&b));
        port.attach().unwrap();

        line.assert().unwrap();
        assert!(port.release());
        assert!(!port.is_driving());

        port.reaffirm().unwrap();
        assert!(port.is_driving());
    }

    #[test]
    fn asserting_second_output_line_reports_contention() {
        let bus = Rc::new(Bus::new(BusConfig::default()));
        let a_line = Rc::new(ControlLine::new(ControlLineId::ARegOut));
        let b_line = Rc::new(ControlLine::new(ControlLineId::BRegOut));
        let a = Fixed::new("A", 1);
        let b = Fixed::new("B", 2);
        let a_port = BusPort::new(&bus, Rc::clone(&a_line), a.id(), Rc::downgrade(&a));
        let b_port = BusPort::new(&bus, Rc::clone(&b_line), b.id(), Rc::downgrade(&b));
        a_port.attach().unwrap();
        b_port.attach().unwrap();

        a_line.assert().unwrap();
        assert!(matches!(
            b_line.assert(),
            Err(Error::Invariant(InvariantViolation::BusContention { .. }))
        ));
        assert!(a_port.is_driving());

        // Handing over cleanly works.
        a_line.deassert().unwrap();
        b_line.deassert().unwrap();
        b_line.assert().unwrap();
        assert!(b_port.is_driving());
    }
}
