//! ALU operations for the 8080.
//!
//! Every function returns the full S/Z/AC/P/CY flag set for its result.
//! Callers that must preserve carry (`INR`, `DCR`) mask it back in.

use crate::flags::{CF, HF, szp};

/// Result of an ALU operation with flags.
#[derive(Debug, Clone, Copy)]
pub struct AluResult {
    pub value: u8,
    pub flags: u8,
}

/// Add two bytes with optional carry in.
#[must_use]
pub fn add8(a: u8, b: u8, carry: bool) -> AluResult {
    let c = u8::from(carry);
    let result16 = u16::from(a) + u16::from(b) + u16::from(c);
    let result = result16 as u8;

    let mut flags = szp(result);
    if (a & 0x0F) + (b & 0x0F) + c > 0x0F {
        flags |= HF;
    }
    if result16 > 0xFF {
        flags |= CF;
    }

    AluResult { value: result, flags }
}

/// Subtract with optional borrow.
///
/// The 8080 subtracts by adding the one's complement with the borrow
/// inverted, so AC is the nibble carry of that addition and CY is its
/// inverted carry out.
#[must_use]
pub fn sub8(a: u8, b: u8, borrow: bool) -> AluResult {
    let sum = add8(a, !b, !borrow);
    AluResult {
        value: sum.value,
        flags: sum.flags ^ CF,
    }
}

/// Logical AND. AC reflects bit 3 of either operand.
#[must_use]
pub fn and8(a: u8, b: u8) -> AluResult {
    let result = a & b;
    let mut flags = szp(result);
    if (a | b) & 0x08 != 0 {
        flags |= HF;
    }
    AluResult { value: result, flags }
}

/// Logical XOR. Clears AC and CY.
#[must_use]
pub fn xor8(a: u8, b: u8) -> AluResult {
    let result = a ^ b;
    AluResult {
        value: result,
        flags: szp(result),
    }
}

/// Logical OR. Clears AC and CY.
#[must_use]
pub fn or8(a: u8, b: u8) -> AluResult {
    let result = a | b;
    AluResult {
        value: result,
        flags: szp(result),
    }
}

/// Increment. CY in the returned flags is always clear.
#[must_use]
pub fn inc8(value: u8) -> AluResult {
    let result = value.wrapping_add(1);
    let mut flags = szp(result);
    if result & 0x0F == 0 {
        flags |= HF;
    }
    AluResult { value: result, flags }
}

/// Decrement. CY in the returned flags is always clear.
#[must_use]
pub fn dec8(value: u8) -> AluResult {
    let result = value.wrapping_sub(1);
    let mut flags = szp(result);
    if result & 0x0F != 0x0F {
        flags |= HF;
    }
    AluResult { value: result, flags }
}

/// Decimal adjust the accumulator after a BCD addition.
#[must_use]
pub fn daa(a: u8, flags: u8) -> AluResult {
    let lsb = a & 0x0F;
    let msb = a >> 4;
    let mut carry = flags & CF != 0;
    let mut correction = 0;

    if flags & HF != 0 || lsb > 9 {
        correction += 0x06;
    }
    if carry || msb > 9 || (msb >= 9 && lsb > 9) {
        correction += 0x60;
        carry = true;
    }

    let sum = add8(a, correction, false);
    let mut f = sum.flags & !CF;
    if carry {
        f |= CF;
    }
    AluResult {
        value: sum.value,
        flags: f,
    }
}
