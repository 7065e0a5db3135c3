//! Observability trait for inspecting component state.
//!
//! Queries never affect emulation state. Port handlers rely on this to read
//! CPU registers in the middle of an instruction.

use std::fmt;

/// A dynamically-typed value for state queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value {
    /// Boolean value (flags, latches).
    Bool(bool),
    /// 8-bit register.
    U8(u8),
    /// 16-bit register or register pair.
    U16(u16),
    /// Counters.
    U64(u64),
}

impl Value {
    /// The value as a byte, if it is one.
    #[must_use]
    pub const fn as_u8(self) -> Option<u8> {
        match self {
            Value::U8(v) => Some(v),
            _ => None,
        }
    }

    /// The value as a 16-bit word. Bytes are zero-extended.
    #[must_use]
    pub const fn as_u16(self) -> Option<u16> {
        match self {
            Value::U8(v) => Some(v as u16),
            Value::U16(v) => Some(v),
            _ => None,
        }
    }

    /// The value as a 64-bit counter. Narrower integers are zero-extended.
    #[must_use]
    pub const fn as_u64(self) -> Option<u64> {
        match self {
            Value::U8(v) => Some(v as u64),
            Value::U16(v) => Some(v as u64),
            Value::U64(v) => Some(v),
            Value::Bool(_) => None,
        }
    }

    #[must_use]
    pub const fn as_bool(self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::U8(v) => write!(f, "{v:#04X}"),
            Value::U16(v) => write!(f, "{v:#06X}"),
            Value::U64(v) => write!(f, "{v}"),
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

impl From<u16> for Value {
    fn from(v: u16) -> Self {
        Value::U16(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::U64(v)
    }
}

/// A component whose state can be inspected.
pub trait Observable {
    /// Query a specific property by path.
    ///
    /// Paths are flat register names (`a`, `de`, `pc`) or dotted for
    /// grouped state (`flags.z`). Returns `None` if the path is not
    /// recognised.
    fn query(&self, path: &str) -> Option<Value>;

    /// List all available query paths.
    fn query_paths(&self) -> &'static [&'static str];
}
