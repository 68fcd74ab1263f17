//! Error taxonomy.
//!
//! Every error here means the machine was wired or driven incorrectly. None
//! of them are transient, so callers propagate them instead of retrying.

use thiserror::Error;

use crate::ControlLineId;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Range(#[from] RangeError),
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
}

/// The machine was assembled incorrectly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("unknown register '{0}'")]
    UnknownRegister(String),
    #[error("unknown control line '{0}'")]
    UnknownControlLine(String),
    #[error("no wiring declared for register {0}")]
    MissingWiring(String),
    #[error("control line {0} already has a transition callback")]
    DuplicateCallback(ControlLineId),
    #[error("RAM capacity of {capacity} bytes cannot cover {required} addresses")]
    RamTooSmall { capacity: usize, required: usize },
}

/// An index fell outside the valid range of a component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("bit {bit} outside 0-{max}")]
    Bit { bit: u8, max: u8 },
    #[error("address {address:#X} outside addressable range of {len} bytes")]
    Address { address: usize, len: usize },
}

/// An internal invariant of the machine was broken.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("flags value {value:#06b} does not fit in 4 bits")]
    FlagsOverflow { value: u8 },
    #[error("bus contention: {claimant} asserted the bus while {current} drives it")]
    BusContention { current: String, claimant: String },
    #[error("{driver} drives the bus with its output line low")]
    DriverNotAsserted { driver: String },
    #[error("bus driver {driver} is not connected to the clock")]
    UnknownDriver { driver: String },
}

impl Error {
    /// Shorthand for a bit index error on a component `width` bits wide.
    #[must_use]
    pub const fn bit(bit: u8, width: u8) -> Self {
        Self::Range(RangeError::Bit {
            bit,
            max: width - 1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_error_names_valid_range() {
        let err = Error::bit(8, 8);
        assert_eq!(err.to_string(), "bit 8 outside 0-7");
        let err = Error::bit(4, 4);
        assert_eq!(err.to_string(), "bit 4 outside 0-3");
    }

    #[test]
    fn contention_message_names_both_chips() {
        let err: Error = InvariantViolation::BusContention {
            current: "A".into(),
            claimant: "B".into(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "bus contention: B asserted the bus while A drives it"
        );
    }

    #[test]
    fn duplicate_callback_uses_line_label() {
        let err = ConfigurationError::DuplicateCallback(ControlLineId::RamOut);
        assert_eq!(
            err.to_string(),
            "control line RAM_OUT already has a transition callback"
        );
    }
}
