//! 8080 register set.

use crate::flags::{FIXED, MASK};

/// 8080 registers snapshot for observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registers {
    pub a: u8,
    /// Flag byte as pushed by `PUSH PSW`.
    pub f: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,

    pub sp: u16,
    pub pc: u16,

    /// Interrupt enable flip-flop (INTE).
    pub inte: bool,
    pub halted: bool,
}

impl Default for Registers {
    fn default() -> Self {
        Self {
            a: 0,
            f: FIXED,
            b: 0,
            c: 0,
            d: 0,
            e: 0,
            h: 0,
            l: 0,
            sp: 0,
            pc: 0,
            inte: false,
            halted: false,
        }
    }
}

impl Registers {
    /// Get the PSW pair (A and flags).
    #[must_use]
    pub const fn psw(&self) -> u16 {
        (self.a as u16) << 8 | self.f as u16
    }

    /// Get BC register pair.
    #[must_use]
    pub const fn bc(&self) -> u16 {
        (self.b as u16) << 8 | self.c as u16
    }

    /// Get DE register pair.
    #[must_use]
    pub const fn de(&self) -> u16 {
        (self.d as u16) << 8 | self.e as u16
    }

    /// Get HL register pair.
    #[must_use]
    pub const fn hl(&self) -> u16 {
        (self.h as u16) << 8 | self.l as u16
    }

    /// Set the PSW pair. Unused flag bits are forced to their fixed values.
    pub fn set_psw(&mut self, value: u16) {
        self.a = (value >> 8) as u8;
        self.f = (value as u8 & MASK) | FIXED;
    }

    /// Set BC register pair.
    pub fn set_bc(&mut self, value: u16) {
        self.b = (value >> 8) as u8;
        self.c = value as u8;
    }

    /// Set DE register pair.
    pub fn set_de(&mut self, value: u16) {
        self.d = (value >> 8) as u8;
        self.e = value as u8;
    }

    /// Set HL register pair.
    pub fn set_hl(&mut self, value: u16) {
        self.h = (value >> 8) as u8;
        self.l = value as u8;
    }
}
