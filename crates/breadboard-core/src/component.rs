//! The contract every clocked chip implements.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::{ControlLine, Observable, Result};

/// Process-unique identity of a chip.
///
/// The bus compares drivers by identity, never by value: two registers
/// holding the same byte are still different drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(u64);

impl ComponentId {
    /// Allocate a fresh identity. The 64-bit counter does not wrap in
    /// practice.
    #[must_use]
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A chip connected to the clock (and usually to the bus).
///
/// Chips are shared between the clock, the bus and their owner, so every
/// method takes `&self` and state lives in cells. The clock calls
/// `on_rising_edge()` on every chip, then `on_falling_edge()` on every chip,
/// in connection order.
pub trait Component: Observable {
    fn id(&self) -> ComponentId;

    /// Label shown on the front panel ("A", "PC", "RAM", ...).
    fn name(&self) -> &str;

    /// The byte the chip currently presents.
    fn value(&self) -> u8;

    /// Number of meaningful bits in `value()`.
    fn bit_width(&self) -> u8 {
        8
    }

    /// Sample control lines and latch new state.
    fn on_rising_edge(&self) -> Result<()>;

    /// Reserved. No chip on this breadboard acts on the falling edge.
    fn on_falling_edge(&self) -> Result<()> {
        Ok(())
    }

    /// Zero the chip and give up the bus if it holds it.
    fn reset(&self);

    /// Line that puts this chip on the bus, if wired.
    fn output_line(&self) -> Option<&ControlLine> {
        None
    }

    /// Line that makes this chip latch new state, if wired.
    fn input_line(&self) -> Option<&ControlLine> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::ComponentId;

    #[test]
    fn ids_are_unique() {
        let a = ComponentId::next();
        let b = ComponentId::next();
        assert_ne!(a, b);
        assert!(b.get() > a.get());
    }

    #[test]
    fn ids_stay_distinct_across_many_allocations() {
        let ids: std::collections::HashSet<_> = (0..10_000).map(|_| ComponentId::next()).collect();
        assert_eq!(ids.len(), 10_000);
        assert!(ids.iter().all(|id| id.get() != 0));
    }
}
