//! The system clock.

use std::rc::Rc;

use crate::{Component, Result, Ticks};

/// Drives every connected chip through one rising and one falling edge per
/// tick.
///
/// Dispatch is strictly sequential and follows connection order. Because
/// the bus is not buffered, a chip that loads from the bus during the
/// rising edge sees whatever has been driven so far in that phase.
#[derive(Default)]
pub struct Clock {
    components: Vec<Rc<dyn Component>>,
    ticks: Ticks,
}

impl Clock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a chip to the end of the dispatch order. Connections are
    /// permanent.
    pub fn connect(&mut self, component: Rc<dyn Component>) {
        log::debug!(
            "clock: connected {} ({}) at slot {}",
            component.name(),
            component.id(),
            self.components.len()
        );
        self.components.push(component);
    }

    /// Issue one full clock cycle.
    ///
    /// The first error aborts the tick; chips after the failing one are not
    /// visited and the tick is not counted.
    pub fn tick(&mut self) -> Result<()> {
        log::trace!("{} rising edge", self.ticks.next());
        for component in &self.components {
            component.on_rising_edge()?;
        }
        log::trace!("{} falling edge", self.ticks.next());
        for component in &self.components {
            component.on_falling_edge()?;
        }
        self.ticks = self.ticks.next();
        Ok(())
    }

    /// Issue `count` ticks, stopping at the first error.
    pub fn tick_n(&mut self, count: u64) -> Result<()> {
        for _ in 0..count {
            self.tick()?;
        }
        Ok(())
    }

    /// Completed ticks since construction or the last counter reset.
    #[must_use]
    pub fn ticks(&self) -> Ticks {
        self.ticks
    }

    pub fn reset_counter(&mut self) {
        self.ticks = Ticks::ZERO;
    }

    /// Reset every connected chip. Not part of any tick.
    pub fn reset_components(&self) {
        for component in &self.components {
            component.reset();
        }
    }

    /// Connected chips in dispatch order.
    #[must_use]
    pub fn components(&self) -> &[Rc<dyn Component>] {
        &self.components
    }
}

impl std::fmt::Debug for Clock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Clock")
            .field(
                "components",
                &self.components.iter().map(|c| c.name()).collect::<Vec<_>>(),
            )
            .field("ticks", &self.ticks)
            .finish()
    }
}
