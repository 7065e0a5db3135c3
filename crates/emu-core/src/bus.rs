//! Memory and I/O bus interface.

use crate::Observable;

/// Size of a 16-bit address space.
const ADDRESS_SPACE: usize = 0x1_0000;

/// Memory and I/O bus interface.
///
/// CPU cores access memory and ports exclusively through this trait. Port
/// handlers receive the core itself as an `Observable` so they can inspect
/// registers (e.g. a system-call trap reading a function selector) without
/// the bus holding a reference to the CPU.
pub trait Bus {
    /// Read a byte from the given address.
    fn read(&mut self, address: u16) -> u8;

    /// Write a byte to the given address.
    fn write(&mut self, address: u16, value: u8);

    /// Read a byte from an I/O port.
    fn io_read(&mut self, port: u8, cpu: &dyn Observable) -> u8;

    /// Write a byte to an I/O port.
    fn io_write(&mut self, port: u8, value: u8, cpu: &dyn Observable);
}

/// Flat 64K RAM with no devices attached.
///
/// Port reads float high (0xFF) and port writes are discarded. Useful for
/// instruction tests that only care about memory and registers.
pub struct SimpleBus {
    ram: Vec<u8>,
}

impl SimpleBus {
    #[must_use]
    pub fn new() -> Self {
        Self {
            ram: vec![0; ADDRESS_SPACE],
        }
    }

    /// Copy `data` into RAM starting at `address`, wrapping at the top of
    /// the address space.
    pub fn load(&mut self, address: u16, data: &[u8]) {
        let mut addr = address;
        for &byte in data {
            self.ram[addr as usize] = byte;
            addr = addr.wrapping_add(1);
        }
    }

    /// Read a byte without going through the bus interface.
    #[must_use]
    pub fn peek(&self, address: u16) -> u8 {
        self.ram[address as usize]
    }
}

impl Default for SimpleBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for SimpleBus {
    fn read(&mut self, address: u16) -> u8 {
        self.ram[address as usize]
    }

    fn write(&mut self, address: u16, value: u8) {
        self.ram[address as usize] = value;
    }

    fn io_read(&mut self, _port: u8, _cpu: &dyn Observable) -> u8 {
        0xFF
    }

    fn io_write(&mut self, _port: u8, _value: u8, _cpu: &dyn Observable) {}
}
