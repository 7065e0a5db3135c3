//! Intel 8080 CPU emulator.
//!
//! Each call to `step()` executes one whole instruction and accounts for
//! its documented clock cycles, including the extra cycles of taken
//! conditional calls and returns.

mod alu;
mod cpu;
mod flags;
mod registers;
mod timing;

pub use cpu::I8080;
pub use flags::{CF, FIXED, HF, PF, SF, ZF};
pub use registers::Registers;
