//! Core traits and types for instruction-stepped CPU emulation.
//!
//! A CPU core never owns its memory. The bus is handed to `step()` for the
//! duration of one instruction, and port handlers get a read-only view of
//! the core's registers through `Observable`.

mod bus;
mod cpu;
mod observable;
mod ticks;

pub use bus::{Bus, SimpleBus};
pub use cpu::Cpu;
pub use observable::{Observable, Value};
pub use ticks::Ticks;
