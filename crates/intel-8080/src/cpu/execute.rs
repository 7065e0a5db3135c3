//! Instruction execution for the 8080.

use emu_core::Bus;

use crate::alu;
use crate::flags::CF;
use crate::timing::CONDITIONAL_PENALTY;

use super::I8080;

impl I8080 {
    /// Execute an opcode whose byte has already been fetched.
    pub(super) fn execute<B: Bus>(&mut self, bus: &mut B, op: u8) {
        match op {
            // NOP, plus the undocumented encodings that behave as NOP
            0x00 | 0x08 | 0x10 | 0x18 | 0x20 | 0x28 | 0x30 | 0x38 => {}

            // LXI rp, d16 (01=B, 11=D, 21=H, 31=SP)
            0x01 | 0x11 | 0x21 | 0x31 => {
                let value = self.fetch_word(bus);
                self.set_reg16((op >> 4) & 3, value);
            }

            // STAX B / STAX D
            0x02 | 0x12 => {
                let addr = self.get_reg16((op >> 4) & 3);
                bus.write(addr, self.regs.a);
            }

            // INX rp
            0x03 | 0x13 | 0x23 | 0x33 => {
                let rp = (op >> 4) & 3;
                let value = self.get_reg16(rp).wrapping_add(1);
                self.set_reg16(rp, value);
            }

            // INR r (34 = INR M)
            0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x34 | 0x3C => {
                let r = (op >> 3) & 7;
                let result = alu::inc8(self.load_operand(bus, r));
                self.store_operand(bus, r, result.value);
                self.set_f((self.regs.f & CF) | result.flags);
            }

            // DCR r (35 = DCR M)
            0x05 | 0x0D | 0x15 | 0x1D | 0x25 | 0x2D | 0x35 | 0x3D => {
                let r = (op >> 3) & 7;
                let result = alu::dec8(self.load_operand(bus, r));
                self.store_operand(bus, r, result.value);
                self.set_f((self.regs.f & CF) | result.flags);
            }

            // MVI r, d8 (36 = MVI M)
            0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x36 | 0x3E => {
                let value = self.fetch_byte(bus);
                self.store_operand(bus, (op >> 3) & 7, value);
            }

            // RLC
            0x07 => {
                let carry = self.regs.a & 0x80 != 0;
                self.regs.a = self.regs.a.rotate_left(1);
                self.set_carry(carry);
            }

            // DAD rp
            0x09 | 0x19 | 0x29 | 0x39 => {
                let rr = self.get_reg16((op >> 4) & 3);
                let (result, carry) = self.regs.hl().overflowing_add(rr);
                self.regs.set_hl(result);
                self.set_carry(carry);
            }

            // LDAX B / LDAX D
            0x0A | 0x1A => {
                let addr = self.get_reg16((op >> 4) & 3);
                self.regs.a = bus.read(addr);
            }

            // DCX rp
            0x0B | 0x1B | 0x2B | 0x3B => {
                let rp = (op >> 4) & 3;
                let value = self.get_reg16(rp).wrapping_sub(1);
                self.set_reg16(rp, value);
            }

            // RRC
            0x0F => {
                let carry = self.regs.a & 1 != 0;
                self.regs.a = self.regs.a.rotate_right(1);
                self.set_carry(carry);
            }

            // RAL
            0x17 => {
                let old_carry = self.regs.f & CF;
                let new_carry = self.regs.a & 0x80 != 0;
                self.regs.a = (self.regs.a << 1) | old_carry;
                self.set_carry(new_carry);
            }

            // RAR
            0x1F => {
                let old_carry = (self.regs.f & CF) << 7;
                let new_carry = self.regs.a & 1 != 0;
                self.regs.a = (self.regs.a >> 1) | old_carry;
                self.set_carry(new_carry);
            }

            // SHLD a16
            0x22 => {
                let addr = self.fetch_word(bus);
                Self::write_word(bus, addr, self.regs.hl());
            }

            // DAA
            0x27 => {
                let result = alu::daa(self.regs.a, self.regs.f);
                self.regs.a = result.value;
                self.set_f(result.flags);
            }

            // LHLD a16
            0x2A => {
                let addr = self.fetch_word(bus);
                let value = Self::read_word(bus, addr);
                self.regs.set_hl(value);
            }

            // CMA
            0x2F => self.regs.a = !self.regs.a,

            // STA a16
            0x32 => {
                let addr = self.fetch_word(bus);
                bus.write(addr, self.regs.a);
            }

            // STC
            0x37 => self.set_carry(true),

            // LDA a16
            0x3A => {
                let addr = self.fetch_word(bus);
                self.regs.a = bus.read(addr);
            }

            // CMC
            0x3F => self.set_carry(self.regs.f & CF == 0),

            // HLT (sits where MOV M, M would be)
            0x76 => self.regs.halted = true,

            // MOV r, r'
            0x40..=0x7F => {
                let value = self.load_operand(bus, op & 7);
                self.store_operand(bus, (op >> 3) & 7, value);
            }

            // ADD/ADC/SUB/SBB/ANA/XRA/ORA/CMP r
            0x80..=0xBF => {
                let value = self.load_operand(bus, op & 7);
                self.alu_op((op >> 3) & 7, value);
            }

            // Rcc
            0xC0 | 0xC8 | 0xD0 | 0xD8 | 0xE0 | 0xE8 | 0xF0 | 0xF8 => {
                if self.condition((op >> 3) & 7) {
                    self.regs.pc = self.pop(bus);
                    self.extra_cycles = CONDITIONAL_PENALTY;
                }
            }

            // POP rp (F1 = POP PSW)
            0xC1 | 0xD1 | 0xE1 | 0xF1 => {
                let value = self.pop(bus);
                self.set_reg16_psw((op >> 4) & 3, value);
            }

            // Jcc a16 (the address is always fetched)
            0xC2 | 0xCA | 0xD2 | 0xDA | 0xE2 | 0xEA | 0xF2 | 0xFA => {
                let addr = self.fetch_word(bus);
                if self.condition((op >> 3) & 7) {
                    self.regs.pc = addr;
                }
            }

            // JMP a16 (CB is an undocumented alias)
            0xC3 | 0xCB => self.regs.pc = self.fetch_word(bus),

            // Ccc a16
            0xC4 | 0xCC | 0xD4 | 0xDC | 0xE4 | 0xEC | 0xF4 | 0xFC => {
                let addr = self.fetch_word(bus);
                if self.condition((op >> 3) & 7) {
                    self.call(bus, addr);
                    self.extra_cycles = CONDITIONAL_PENALTY;
                }
            }

            // PUSH rp (F5 = PUSH PSW)
            0xC5 | 0xD5 | 0xE5 | 0xF5 => {
                let value = self.get_reg16_psw((op >> 4) & 3);
                self.push(bus, value);
            }

            // ADI/ACI/SUI/SBI/ANI/XRI/ORI/CPI d8
            0xC6 | 0xCE | 0xD6 | 0xDE | 0xE6 | 0xEE | 0xF6 | 0xFE => {
                let value = self.fetch_byte(bus);
                self.alu_op((op >> 3) & 7, value);
            }

            // RST n
            0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => {
                self.call(bus, u16::from(op & 0x38));
            }

            // RET (D9 is an undocumented alias)
            0xC9 | 0xD9 => self.regs.pc = self.pop(bus),

            // CALL a16 (DD, ED, FD are undocumented aliases)
            0xCD | 0xDD | 0xED | 0xFD => {
                let addr = self.fetch_word(bus);
                self.call(bus, addr);
            }

            // OUT d8
            0xD3 => {
                let port = self.fetch_byte(bus);
                let value = self.regs.a;
                bus.io_write(port, value, &*self);
            }

            // IN d8
            0xDB => {
                let port = self.fetch_byte(bus);
                self.regs.a = bus.io_read(port, &*self);
            }

            // XTHL
            0xE3 => {
                let sp = self.regs.sp;
                let value = Self::read_word(bus, sp);
                Self::write_word(bus, sp, self.regs.hl());
                self.regs.set_hl(value);
            }

            // PCHL
            0xE9 => self.regs.pc = self.regs.hl(),

            // XCHG
            0xEB => {
                let de = self.regs.de();
                self.regs.set_de(self.regs.hl());
                self.regs.set_hl(de);
            }

            // DI
            0xF3 => self.regs.inte = false,

            // SPHL
            0xF9 => self.regs.sp = self.regs.hl(),

            // EI
            0xFB => {
                self.regs.inte = true;
                self.ei_delay = true;
            }
        }
    }

    /// Accumulator ALU group selected by bits 5-3.
    fn alu_op(&mut self, group: u8, value: u8) {
        let a = self.regs.a;
        let carry = self.regs.f & CF != 0;
        let result = match group & 7 {
            0 => alu::add8(a, value, false),
            1 => alu::add8(a, value, carry),
            2 => alu::sub8(a, value, false),
            3 => alu::sub8(a, value, carry),
            4 => alu::and8(a, value),
            5 => alu::xor8(a, value),
            6 => alu::or8(a, value),
            7 => {
                // CMP: flags only
                let result = alu::sub8(a, value, false);
                self.set_f(result.flags);
                return;
            }
            _ => unreachable!(),
        };
        self.regs.a = result.value;
        self.set_f(result.flags);
    }
}
