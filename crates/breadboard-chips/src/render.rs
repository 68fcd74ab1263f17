//! Text panels for the front panel.
//!
//! Rendering is a pure function of chip state. The caller supplies the
//! target, so the same code feeds a terminal, a log line or a test string.

use std::fmt;

use breadboard_core::{Bus, Clock, Component};

const BORDER: &str = "|---------------------------|";
const INNER_WIDTH: usize = BORDER.len() - 2;

/// How to print a chip's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValueFormat {
    #[default]
    Hex,
    Decimal,
    Binary,
}

impl ValueFormat {
    /// Format `value` as a chip `width` bits wide.
    #[must_use]
    pub fn format(self, value: u8, width: u8) -> String {
        match self {
            Self::Hex => format!("0x{value:02X}"),
            Self::Decimal => format!("{value}"),
            Self::Binary => format!("{value:0width$b}", width = usize::from(width)),
        }
    }
}

/// Bus-facing status of a chip at the moment it is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ComponentStatus {
    /// The chip is the bus driver.
    pub driving: bool,
    /// The chip's input line is asserted.
    pub loading: bool,
}

impl ComponentStatus {
    #[must_use]
    pub fn of(component: &dyn Component, bus: &Bus) -> Self {
        Self {
            driving: bus.is_driven_by(component.id()),
            loading: component.input_line().is_some_and(|line| line.state()),
        }
    }

    fn marker(self) -> &'static str {
        if self.driving {
            "[DRIVE]"
        } else if self.loading {
            "[LOAD]"
        } else {
            ""
        }
    }
}

/// Draw one chip as a three-line panel.
pub fn render(
    component: &dyn Component,
    bus: &Bus,
    format: ValueFormat,
    out: &mut impl fmt::Write,
) -> fmt::Result {
    let status = ComponentStatus::of(component, bus);
    let label = format!(
        "{}: {}",
        component.name(),
        format.format(component.value(), component.bit_width())
    );
    let marker = status.marker();
    let pad = INNER_WIDTH.saturating_sub(marker.len());
    let label = clip(&label, pad);
    writeln!(out, "{BORDER}")?;
    writeln!(out, "|{label:<pad$}{marker}|")?;
    writeln!(out, "{BORDER}")
}

/// Draw every chip on `clock` in dispatch order, then the bus.
pub fn render_all(
    clock: &Clock,
    bus: &Bus,
    format: ValueFormat,
    out: &mut impl fmt::Write,
) -> fmt::Result {
    for component in clock.components() {
        render(component.as_ref(), bus, format, out)?;
    }
    let driver = bus
        .driver_component()
        .map_or_else(|| "-".to_string(), |c| c.name().to_string());
    let label = format!("BUS: {} <- {driver}", format.format(bus.read(), 8));
    writeln!(out, "|{:<INNER_WIDTH$}|", clip(&label, INNER_WIDTH))
}

/// At most `width` characters of `label`, so the border stays aligned.
fn clip(label: &str, width: usize) -> &str {
    label
        .char_indices()
        .nth(width)
        .map_or(label, |(end, _)| &label[..end])
}
