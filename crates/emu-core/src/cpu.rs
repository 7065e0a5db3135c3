//! CPU core trait.

use crate::{Bus, Observable, Ticks};

/// A CPU core stepped one instruction at a time.
///
/// The bus is passed in, not owned, so whoever drives the core keeps full
/// control over memory and devices between instructions. CPUs expose their
/// internal state for observation through the `Observable` supertrait.
pub trait Cpu: Observable {
    /// The type used for register inspection.
    type Registers;

    /// Execute exactly one instruction.
    ///
    /// Returns the number of clock cycles the instruction took. A halted
    /// CPU executes nothing and returns 0.
    fn step<B: Bus>(&mut self, bus: &mut B) -> u32;

    /// Returns the current program counter.
    fn pc(&self) -> u16;

    /// Set the program counter.
    fn set_pc(&mut self, value: u16);

    /// Returns a snapshot of all registers for inspection.
    fn registers(&self) -> Self::Registers;

    /// Total clock cycles consumed since the last reset.
    fn cycles(&self) -> Ticks;

    /// Returns true if the CPU is halted.
    fn is_halted(&self) -> bool;

    /// Request an interrupt, supplying the instruction the interrupting
    /// device places on the data bus. Returns true if accepted.
    fn interrupt(&mut self, opcode: u8) -> bool;

    /// Reset the CPU to its power-on state, including the cycle counter.
    fn reset(&mut self);
}
