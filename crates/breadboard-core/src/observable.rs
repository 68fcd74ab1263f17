//! Read-only inspection of chip state.
//!
//! A learner (or a front panel) can inspect any chip between ticks. Queries
//! never change machine state.

use std::fmt;

/// A dynamically-typed value returned by a state query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Bool(bool),
    U8(u8),
    U64(u64),
    String(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::U8(v) => write!(f, "{v:#04X}"),
            Value::U64(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "{v}"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Value::U8(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::U64(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

/// A chip whose state can be inspected by path.
///
/// Paths are flat or dotted:
/// - `value` - the byte the chip currently holds
/// - `driving` - whether the chip is the bus driver
/// - `flags.c` - carry bit of the flags register
pub trait Observable {
    /// Query a property. Returns `None` for unknown paths.
    fn query(&self, path: &str) -> Option<Value>;

    /// All paths accepted by `query()`.
    fn query_paths(&self) -> &'static [&'static str];
}
