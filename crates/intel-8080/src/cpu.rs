//! 8080 CPU core with per-instruction execution.

use emu_core::{Bus, Cpu, Observable, Ticks, Value};

use crate::flags::{CF, FIXED, HF, MASK, PF, SF, ZF};
use crate::registers::Registers;
use crate::timing::CYCLES;

/// Intel 8080 CPU.
///
/// The CPU does not own the bus. Instead, the bus is passed to `step()` for
/// each instruction, so the caller keeps memory and devices between steps.
pub struct I8080 {
    /// Main register set.
    pub(crate) regs: Registers,

    /// Opcode of the instruction being executed.
    opcode: u8,
    /// Extra cycles incurred by the current instruction (taken conditional
    /// calls and returns).
    extra_cycles: u32,

    /// Interrupt latched by `interrupt()` and not yet serviced.
    int_pending: bool,
    /// Instruction supplied by the interrupting device.
    int_opcode: u8,
    /// Set by `EI`: interrupts stay blocked until the next instruction ends.
    ei_delay: bool,

    /// Total cycles since reset.
    total_cycles: Ticks,
}

impl I8080 {
    /// Create a new 8080 in its power-on state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            regs: Registers::default(),
            opcode: 0,
            extra_cycles: 0,
            int_pending: false,
            int_opcode: 0,
            ei_delay: false,
            total_cycles: Ticks::ZERO,
        }
    }

    /// Mutable access to the register file.
    ///
    /// Only available in test builds.
    #[cfg(feature = "test-utils")]
    pub fn registers_mut(&mut self) -> &mut Registers {
        &mut self.regs
    }

    /// Get the A register.
    #[must_use]
    pub fn a(&self) -> u8 {
        self.regs.a
    }

    /// Get the flag byte.
    #[must_use]
    pub fn f(&self) -> u8 {
        self.regs.f
    }

    /// Get the C register.
    #[must_use]
    pub fn c(&self) -> u8 {
        self.regs.c
    }

    /// Get the E register.
    #[must_use]
    pub fn e(&self) -> u8 {
        self.regs.e
    }

    /// Get the BC register pair.
    #[must_use]
    pub fn bc(&self) -> u16 {
        self.regs.bc()
    }

    /// Get the DE register pair.
    #[must_use]
    pub fn de(&self) -> u16 {
        self.regs.de()
    }

    /// Get the HL register pair.
    #[must_use]
    pub fn hl(&self) -> u16 {
        self.regs.hl()
    }

    /// Get the stack pointer.
    #[must_use]
    pub fn sp(&self) -> u16 {
        self.regs.sp
    }

    /// Set the stack pointer.
    pub fn set_sp(&mut self, value: u16) {
        self.regs.sp = value;
    }
}

impl Default for I8080 {
    fn default() -> Self {
        Self::new()
    }
}

impl I8080 {
    /// Read the byte at PC and advance PC.
    fn fetch_byte<B: Bus>(&mut self, bus: &mut B) -> u8 {
        let value = bus.read(self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        value
    }

    /// Read a little-endian word at PC and advance PC past it.
    fn fetch_word<B: Bus>(&mut self, bus: &mut B) -> u16 {
        let lo = self.fetch_byte(bus);
        let hi = self.fetch_byte(bus);
        u16::from(lo) | (u16::from(hi) << 8)
    }

    fn read_word<B: Bus>(bus: &mut B, addr: u16) -> u16 {
        let lo = bus.read(addr);
        let hi = bus.read(addr.wrapping_add(1));
        u16::from(lo) | (u16::from(hi) << 8)
    }

    fn write_word<B: Bus>(bus: &mut B, addr: u16, value: u16) {
        bus.write(addr, value as u8);
        bus.write(addr.wrapping_add(1), (value >> 8) as u8);
    }

    /// Push a word (high byte at SP-1, low byte at SP-2).
    fn push<B: Bus>(&mut self, bus: &mut B, value: u16) {
        self.regs.sp = self.regs.sp.wrapping_sub(2);
        Self::write_word(bus, self.regs.sp, value);
    }

    fn pop<B: Bus>(&mut self, bus: &mut B) -> u16 {
        let value = Self::read_word(bus, self.regs.sp);
        self.regs.sp = self.regs.sp.wrapping_add(2);
        value
    }

    /// Push PC and jump.
    fn call<B: Bus>(&mut self, bus: &mut B, addr: u16) {
        self.push(bus, self.regs.pc);
        self.regs.pc = addr;
    }

    /// Store flags, keeping the fixed bits fixed.
    fn set_f(&mut self, flags: u8) {
        self.regs.f = (flags & MASK) | FIXED;
    }

    fn set_carry(&mut self, carry: bool) {
        self.regs.f = (self.regs.f & !CF) | u8::from(carry);
    }

    /// Get register by 3-bit encoding (bits 5-3 or 2-0). Code 6 is M, the
    /// byte addressed by HL.
    fn load_operand<B: Bus>(&mut self, bus: &mut B, r: u8) -> u8 {
        match r & 7 {
            0 => self.regs.b,
            1 => self.regs.c,
            2 => self.regs.d,
            3 => self.regs.e,
            4 => self.regs.h,
            5 => self.regs.l,
            6 => bus.read(self.regs.hl()),
            7 => self.regs.a,
            _ => unreachable!(),
        }
    }

    /// Set register by 3-bit encoding. Code 6 writes memory at HL.
    fn store_operand<B: Bus>(&mut self, bus: &mut B, r: u8, value: u8) {
        match r & 7 {
            0 => self.regs.b = value,
            1 => self.regs.c = value,
            2 => self.regs.d = value,
            3 => self.regs.e = value,
            4 => self.regs.h = value,
            5 => self.regs.l = value,
            6 => bus.write(self.regs.hl(), value),
            7 => self.regs.a = value,
            _ => unreachable!(),
        }
    }

    /// Get register pair by 2-bit encoding (BC, DE, HL, SP).
    fn get_reg16(&self, rp: u8) -> u16 {
        match rp & 3 {
            0 => self.regs.bc(),
            1 => self.regs.de(),
            2 => self.regs.hl(),
            3 => self.regs.sp,
            _ => unreachable!(),
        }
    }

    /// Set register pair by 2-bit encoding.
    fn set_reg16(&mut self, rp: u8, value: u16) {
        match rp & 3 {
            0 => self.regs.set_bc(value),
            1 => self.regs.set_de(value),
            2 => self.regs.set_hl(value),
            3 => self.regs.sp = value,
            _ => unreachable!(),
        }
    }

    /// Get register pair for PUSH/POP (PSW instead of SP).
    fn get_reg16_psw(&self, rp: u8) -> u16 {
        match rp & 3 {
            0 => self.regs.bc(),
            1 => self.regs.de(),
            2 => self.regs.hl(),
            3 => self.regs.psw(),
            _ => unreachable!(),
        }
    }

    /// Set register pair for PUSH/POP.
    fn set_reg16_psw(&mut self, rp: u8, value: u16) {
        match rp & 3 {
            0 => self.regs.set_bc(value),
            1 => self.regs.set_de(value),
            2 => self.regs.set_hl(value),
            3 => self.regs.set_psw(value),
            _ => unreachable!(),
        }
    }

    /// Evaluate condition code.
    fn condition(&self, cc: u8) -> bool {
        match cc & 7 {
            0 => self.regs.f & ZF == 0, // NZ
            1 => self.regs.f & ZF != 0, // Z
            2 => self.regs.f & CF == 0, // NC
            3 => self.regs.f & CF != 0, // C
            4 => self.regs.f & PF == 0, // PO
            5 => self.regs.f & PF != 0, // PE
            6 => self.regs.f & SF == 0, // P
            7 => self.regs.f & SF != 0, // M
            _ => unreachable!(),
        }
    }
}

// Instruction execution split into separate file for readability
mod execute;

impl Cpu for I8080 {
    type Registers = Registers;

    fn step<B: Bus>(&mut self, bus: &mut B) -> u32 {
        let opcode = if self.int_pending && self.regs.inte && !self.ei_delay {
            // The device's instruction replaces the fetch; PC is not advanced.
            self.int_pending = false;
            self.regs.inte = false;
            self.regs.halted = false;
            self.int_opcode
        } else if self.regs.halted {
            return 0;
        } else {
            self.fetch_byte(bus)
        };

        self.opcode = opcode;
        self.extra_cycles = 0;
        self.ei_delay = false;
        self.execute(bus, opcode);

        let cycles = u32::from(CYCLES[opcode as usize]) + self.extra_cycles;
        self.total_cycles += cycles;
        cycles
    }

    fn pc(&self) -> u16 {
        self.regs.pc
    }

    fn set_pc(&mut self, value: u16) {
        self.regs.pc = value;
    }

    fn registers(&self) -> Self::Registers {
        self.regs
    }

    fn cycles(&self) -> Ticks {
        self.total_cycles
    }

    fn is_halted(&self) -> bool {
        self.regs.halted
    }

    fn interrupt(&mut self, opcode: u8) -> bool {
        if self.regs.inte {
            self.int_pending = true;
            self.int_opcode = opcode;
            true
        } else {
            false
        }
    }

    fn reset(&mut self) {
        self.regs = Registers::default();
        self.opcode = 0;
        self.extra_cycles = 0;
        self.int_pending = false;
        self.int_opcode = 0;
        self.ei_delay = false;
        self.total_cycles = Ticks::ZERO;
    }
}

/// All query paths supported by the 8080.
const I8080_QUERY_PATHS: &[&str] = &[
    // Registers
    "a", "f", "b", "c", "d", "e", "h", "l",
    // Register pairs
    "psw", "bc", "de", "hl", "sp", "pc",
    // Flags (individual)
    "flags.s", "flags.z", "flags.ac", "flags.p", "flags.cy",
    // CPU state
    "inte", "halted", "opcode", "cycles",
];

impl Observable for I8080 {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "a" => Some(self.regs.a.into()),
            "f" => Some(self.regs.f.into()),
            "b" => Some(self.regs.b.into()),
            "c" => Some(self.regs.c.into()),
            "d" => Some(self.regs.d.into()),
            "e" => Some(self.regs.e.into()),
            "h" => Some(self.regs.h.into()),
            "l" => Some(self.regs.l.into()),

            "psw" => Some(self.regs.psw().into()),
            "bc" => Some(self.regs.bc().into()),
            "de" => Some(self.regs.de().into()),
            "hl" => Some(self.regs.hl().into()),
            "sp" => Some(self.regs.sp.into()),
            "pc" => Some(self.regs.pc.into()),

            "flags.s" => Some((self.regs.f & SF != 0).into()),
            "flags.z" => Some((self.regs.f & ZF != 0).into()),
            "flags.ac" => Some((self.regs.f & HF != 0).into()),
            "flags.p" => Some((self.regs.f & PF != 0).into()),
            "flags.cy" => Some((self.regs.f & CF != 0).into()),

            "inte" => Some(self.regs.inte.into()),
            "halted" => Some(self.regs.halted.into()),
            "opcode" => Some(self.opcode.into()),
            "cycles" => Some(self.total_cycles.get().into()),

            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        I8080_QUERY_PATHS
    }
}
