//! 8080 flag register bits.

/// Sign flag (bit 7) - copy of bit 7 of the result.
pub const SF: u8 = 0b1000_0000;

/// Zero flag (bit 6) - set if the result is zero.
pub const ZF: u8 = 0b0100_0000;

/// Auxiliary carry flag (bit 4) - carry out of bit 3.
pub const HF: u8 = 0b0001_0000;

/// Parity flag (bit 2) - set if the result has even parity.
pub const PF: u8 = 0b0000_0100;

/// Bit 1 of the PSW flag byte always reads as 1. Bits 3 and 5 read as 0.
pub const FIXED: u8 = 0b0000_0010;

/// Carry flag (bit 0) - carry out of bit 7, or borrow.
pub const CF: u8 = 0b0000_0001;

/// Bits of the flag byte that hold state.
pub(crate) const MASK: u8 = SF | ZF | HF | PF | CF;

/// Compute parity of a byte (true if even number of 1 bits).
#[must_use]
pub const fn parity(value: u8) -> bool {
    value.count_ones().is_multiple_of(2)
}

/// Sign, zero and parity flags for a result byte.
#[must_use]
pub const fn szp(value: u8) -> u8 {
    let mut f = 0;
    if value == 0 {
        f |= ZF;
    }
    if value & 0x80 != 0 {
        f |= SF;
    }
    if parity(value) {
        f |= PF;
    }
    f
}
