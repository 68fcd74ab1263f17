//! Machine configuration.

use breadboard_chips::{DEFAULT_RAM_CAPACITY, FlagLayout};
use breadboard_core::BusConfig;

/// Configuration for creating a [`Machine`](crate::Machine).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MachineConfig {
    pub bus: BusConfig,
    /// RAM size in bytes. Must be at least 256.
    pub ram_capacity: usize,
    pub flag_layout: FlagLayout,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            bus: BusConfig::default(),
            ram_capacity: DEFAULT_RAM_CAPACITY,
            flag_layout: FlagLayout::STANDARD,
        }
    }
}
