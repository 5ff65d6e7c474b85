//! Opcode decoder: a 256-entry table mapping each opcode byte to its
//! mnemonic, addressing mode, length, and base cycle count.
//!
//! All 212 documented W65C02S opcodes are present; the remaining 44 byte
//! values decode to a 1-byte, 1-cycle, flag-inert `NOP` per the W65C02S
//! datasheet (no NMOS-style unofficial-opcode behavior is emulated).

use crate::addressing::AddrMode;

/// The operation an opcode performs, independent of its addressing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Op {
    Adc, And, Asl, Bcc, Bcs, Beq, Bit, Bmi, Bne, Bpl, Bra, Brk, Bvc, Bvs,
    Clc, Cld, Cli, Clv, Cmp, Cpx, Cpy, Dec, Dex, Dey, Eor, Inc, Inx, Iny,
    Jmp, Jsr, Lda, Ldx, Ldy, Lsr, Nop, Ora, Pha, Php, Phx, Phy, Pla, Plp,
    Plx, Ply, Rol, Ror, Rti, Rts, Sbc, Sec, Sed, Sei, Sta, Stx, Sty, Stz,
    Tax, Tay, Trb, Tsb, Tsx, Txa, Txs, Tya, Wai, Stp,
    /// `BBRn zp,rel`: branch if bit `n` of the zero-page operand is clear.
    Bbr(u8),
    /// `BBSn zp,rel`: branch if bit `n` of the zero-page operand is set.
    Bbs(u8),
    /// `RMBn zp`: clear bit `n` of the zero-page operand.
    Rmb(u8),
    /// `SMBn zp`: set bit `n` of the zero-page operand.
    Smb(u8),
}

/// A decoded opcode: operation, addressing mode, encoded length, and base
/// cycle count (before any page-cross/branch-taken adjustment).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstructionInfo {
    /// The operation to perform.
    pub op: Op,
    /// How the operand is addressed.
    pub mode: AddrMode,
    /// Total instruction length in bytes, including the opcode byte.
    pub len: u8,
    /// Base cycle count, before page-cross or branch-taken penalties.
    pub cycles: u8,
}

const fn i(op: Op, mode: AddrMode, len: u8, cycles: u8) -> InstructionInfo {
    InstructionInfo { op, mode, len, cycles }
}

const NOP1: InstructionInfo = i(Op::Nop, AddrMode::Implied, 1, 1);

use AddrMode::{
    Absolute as ABS, AbsoluteIndexedIndirectX as AIX, AbsoluteX as ABX, AbsoluteY as ABY,
    Accumulator as ACC, Immediate as IMM, Implied as IMP, IndexedIndirectX as IZX,
    Indirect as IND, IndirectIndexedY as IZY, IndirectZeroPage as IZP, Relative as REL,
    ZeroPage as ZP, ZeroPageX as ZPX, ZeroPageY as ZPY,
};

const OPCODES: [InstructionInfo; 256] = {
    let mut table = [NOP1; 256];

    table[0x00] = i(Op::Brk, IMP, 1, 7);
    table[0x01] = i(Op::Ora, IZX, 2, 6);
    table[0x04] = i(Op::Tsb, ZP, 2, 5);
    table[0x05] = i(Op::Ora, ZP, 2, 3);
    table[0x06] = i(Op::Asl, ZP, 2, 5);
    table[0x07] = i(Op::Rmb(0), ZP, 2, 5);
    table[0x08] = i(Op::Php, IMP, 1, 3);
    table[0x09] = i(Op::Ora, IMM, 2, 2);
    table[0x0A] = i(Op::Asl, ACC, 1, 2);
    table[0x0C] = i(Op::Tsb, ABS, 3, 6);
    table[0x0D] = i(Op::Ora, ABS, 3, 4);
    table[0x0E] = i(Op::Asl, ABS, 3, 6);
    table[0x0F] = i(Op::Bbr(0), ZP, 3, 5);

    table[0x10] = i(Op::Bpl, REL, 2, 2);
    table[0x11] = i(Op::Ora, IZY, 2, 5);
    table[0x12] = i(Op::Ora, IZP, 2, 5);
    table[0x14] = i(Op::Trb, ZP, 2, 5);
    table[0x15] = i(Op::Ora, ZPX, 2, 4);
    table[0x16] = i(Op::Asl, ZPX, 2, 6);
    table[0x17] = i(Op::Rmb(1), ZP, 2, 5);
    table[0x18] = i(Op::Clc, IMP, 1, 2);
    table[0x19] = i(Op::Ora, ABY, 3, 4);
    table[0x1A] = i(Op::Inc, ACC, 1, 2);
    table[0x1C] = i(Op::Trb, ABS, 3, 6);
    table[0x1D] = i(Op::Ora, ABX, 3, 4);
    table[0x1E] = i(Op::Asl, ABX, 3, 7);
    table[0x1F] = i(Op::Bbr(1), ZP, 3, 5);

    table[0x20] = i(Op::Jsr, ABS, 3, 6);
    table[0x21] = i(Op::And, IZX, 2, 6);
    table[0x24] = i(Op::Bit, ZP, 2, 3);
    table[0x25] = i(Op::And, ZP, 2, 3);
    table[0x26] = i(Op::Rol, ZP, 2, 5);
    table[0x27] = i(Op::Rmb(2), ZP, 2, 5);
    table[0x28] = i(Op::Plp, IMP, 1, 4);
    table[0x29] = i(Op::And, IMM, 2, 2);
    table[0x2A] = i(Op::Rol, ACC, 1, 2);
    table[0x2C] = i(Op::Bit, ABS, 3, 4);
    table[0x2D] = i(Op::And, ABS, 3, 4);
    table[0x2E] = i(Op::Rol, ABS, 3, 6);
    table[0x2F] = i(Op::Bbr(2), ZP, 3, 5);

    table[0x30] = i(Op::Bmi, REL, 2, 2);
    table[0x31] = i(Op::And, IZY, 2, 5);
    table[0x32] = i(Op::And, IZP, 2, 5);
    table[0x34] = i(Op::Bit, ZPX, 2, 4);
    table[0x35] = i(Op::And, ZPX, 2, 4);
    table[0x36] = i(Op::Rol, ZPX, 2, 6);
    table[0x37] = i(Op::Rmb(3), ZP, 2, 5);
    table[0x38] = i(Op::Sec, IMP, 1, 2);
    table[0x39] = i(Op::And, ABY, 3, 4);
    table[0x3A] = i(Op::Dec, ACC, 1, 2);
    table[0x3C] = i(Op::Bit, ABX, 3, 4);
    table[0x3D] = i(Op::And, ABX, 3, 4);
    table[0x3E] = i(Op::Rol, ABX, 3, 7);
    table[0x3F] = i(Op::Bbr(3), ZP, 3, 5);

    table[0x40] = i(Op::Rti, IMP, 1, 6);
    table[0x41] = i(Op::Eor, IZX, 2, 6);
    table[0x45] = i(Op::Eor, ZP, 2, 3);
    table[0x46] = i(Op::Lsr, ZP, 2, 5);
    table[0x47] = i(Op::Rmb(4), ZP, 2, 5);
    table[0x48] = i(Op::Pha, IMP, 1, 3);
    table[0x49] = i(Op::Eor, IMM, 2, 2);
    table[0x4A] = i(Op::Lsr, ACC, 1, 2);
    table[0x4C] = i(Op::Jmp, ABS, 3, 3);
    table[0x4D] = i(Op::Eor, ABS, 3, 4);
    table[0x4E] = i(Op::Lsr, ABS, 3, 6);
    table[0x4F] = i(Op::Bbr(4), ZP, 3, 5);

    table[0x50] = i(Op::Bvc, REL, 2, 2);
    table[0x51] = i(Op::Eor, IZY, 2, 5);
    table[0x52] = i(Op::Eor, IZP, 2, 5);
    table[0x55] = i(Op::Eor, ZPX, 2, 4);
    table[0x56] = i(Op::Lsr, ZPX, 2, 6);
    table[0x57] = i(Op::Rmb(5), ZP, 2, 5);
    table[0x58] = i(Op::Cli, IMP, 1, 2);
    table[0x59] = i(Op::Eor, ABY, 3, 4);
    table[0x5A] = i(Op::Phy, IMP, 1, 3);
    table[0x5D] = i(Op::Eor, ABX, 3, 4);
    table[0x5E] = i(Op::Lsr, ABX, 3, 7);
    table[0x5F] = i(Op::Bbr(5), ZP, 3, 5);

    table[0x60] = i(Op::Rts, IMP, 1, 6);
    table[0x61] = i(Op::Adc, IZX, 2, 6);
    table[0x64] = i(Op::Stz, ZP, 2, 3);
    table[0x65] = i(Op::Adc, ZP, 2, 3);
    table[0x66] = i(Op::Ror, ZP, 2, 5);
    table[0x67] = i(Op::Rmb(6), ZP, 2, 5);
    table[0x68] = i(Op::Pla, IMP, 1, 4);
    table[0x69] = i(Op::Adc, IMM, 2, 2);
    table[0x6A] = i(Op::Ror, ACC, 1, 2);
    table[0x6C] = i(Op::Jmp, IND, 3, 6);
    table[0x6D] = i(Op::Adc, ABS, 3, 4);
    table[0x6E] = i(Op::Ror, ABS, 3, 6);
    table[0x6F] = i(Op::Bbr(6), ZP, 3, 5);

    table[0x70] = i(Op::Bvs, REL, 2, 2);
    table[0x71] = i(Op::Adc, IZY, 2, 5);
    table[0x72] = i(Op::Adc, IZP, 2, 5);
    table[0x74] = i(Op::Stz, ZPX, 2, 4);
    table[0x75] = i(Op::Adc, ZPX, 2, 4);
    table[0x76] = i(Op::Ror, ZPX, 2, 6);
    table[0x77] = i(Op::Rmb(7), ZP, 2, 5);
    table[0x78] = i(Op::Sei, IMP, 1, 2);
    table[0x79] = i(Op::Adc, ABY, 3, 4);
    table[0x7A] = i(Op::Ply, IMP, 1, 4);
    table[0x7C] = i(Op::Jmp, AIX, 3, 6);
    table[0x7D] = i(Op::Adc, ABX, 3, 4);
    table[0x7E] = i(Op::Ror, ABX, 3, 7);
    table[0x7F] = i(Op::Bbr(7), ZP, 3, 5);

    table[0x80] = i(Op::Bra, REL, 2, 3);
    table[0x81] = i(Op::Sta, IZX, 2, 6);
    table[0x84] = i(Op::Sty, ZP, 2, 3);
    table[0x85] = i(Op::Sta, ZP, 2, 3);
    table[0x86] = i(Op::Stx, ZP, 2, 3);
    table[0x87] = i(Op::Smb(0), ZP, 2, 5);
    table[0x88] = i(Op::Dey, IMP, 1, 2);
    table[0x89] = i(Op::Bit, IMM, 2, 2);
    table[0x8A] = i(Op::Txa, IMP, 1, 2);
    table[0x8C] = i(Op::Sty, ABS, 3, 4);
    table[0x8D] = i(Op::Sta, ABS, 3, 4);
    table[0x8E] = i(Op::Stx, ABS, 3, 4);
    table[0x8F] = i(Op::Bbs(0), ZP, 3, 5);

    table[0x90] = i(Op::Bcc, REL, 2, 2);
    table[0x91] = i(Op::Sta, IZY, 2, 6);
    table[0x92] = i(Op::Sta, IZP, 2, 5);
    table[0x94] = i(Op::Sty, ZPX, 2, 4);
    table[0x95] = i(Op::Sta, ZPX, 2, 4);
    table[0x96] = i(Op::Stx, ZPY, 2, 4);
    table[0x97] = i(Op::Smb(1), ZP, 2, 5);
    table[0x98] = i(Op::Tya, IMP, 1, 2);
    table[0x99] = i(Op::Sta, ABY, 3, 5);
    table[0x9A] = i(Op::Txs, IMP, 1, 2);
    table[0x9C] = i(Op::Stz, ABS, 3, 4);
    table[0x9D] = i(Op::Sta, ABX, 3, 5);
    table[0x9E] = i(Op::Stz, ABX, 3, 5);
    table[0x9F] = i(Op::Bbs(1), ZP, 3, 5);

    table[0xA0] = i(Op::Ldy, IMM, 2, 2);
    table[0xA1] = i(Op::Lda, IZX, 2, 6);
    table[0xA2] = i(Op::Ldx, IMM, 2, 2);
    table[0xA4] = i(Op::Ldy, ZP, 2, 3);
    table[0xA5] = i(Op::Lda, ZP, 2, 3);
    table[0xA6] = i(Op::Ldx, ZP, 2, 3);
    table[0xA7] = i(Op::Smb(2), ZP, 2, 5);
    table[0xA8] = i(Op::Tay, IMP, 1, 2);
    table[0xA9] = i(Op::Lda, IMM, 2, 2);
    table[0xAA] = i(Op::Tax, IMP, 1, 2);
    table[0xAC] = i(Op::Ldy, ABS, 3, 4);
    table[0xAD] = i(Op::Lda, ABS, 3, 4);
    table[0xAE] = i(Op::Ldx, ABS, 3, 4);
    table[0xAF] = i(Op::Bbs(2), ZP, 3, 5);

    table[0xB0] = i(Op::Bcs, REL, 2, 2);
    table[0xB1] = i(Op::Lda, IZY, 2, 5);
    table[0xB2] = i(Op::Lda, IZP, 2, 5);
    table[0xB4] = i(Op::Ldy, ZPX, 2, 4);
    table[0xB5] = i(Op::Lda, ZPX, 2, 4);
    table[0xB6] = i(Op::Ldx, ZPY, 2, 4);
    table[0xB7] = i(Op::Smb(3), ZP, 2, 5);
    table[0xB8] = i(Op::Clv, IMP, 1, 2);
    table[0xB9] = i(Op::Lda, ABY, 3, 4);
    table[0xBA] = i(Op::Tsx, IMP, 1, 2);
    table[0xBC] = i(Op::Ldy, ABX, 3, 4);
    table[0xBD] = i(Op::Lda, ABX, 3, 4);
    table[0xBE] = i(Op::Ldx, ABY, 3, 4);
    table[0xBF] = i(Op::Bbs(3), ZP, 3, 5);

    table[0xC0] = i(Op::Cpy, IMM, 2, 2);
    table[0xC1] = i(Op::Cmp, IZX, 2, 6);
    table[0xC4] = i(Op::Cpy, ZP, 2, 3);
    table[0xC5] = i(Op::Cmp, ZP, 2, 3);
    table[0xC6] = i(Op::Dec, ZP, 2, 5);
    table[0xC7] = i(Op::Smb(4), ZP, 2, 5);
    table[0xC8] = i(Op::Iny, IMP, 1, 2);
    table[0xC9] = i(Op::Cmp, IMM, 2, 2);
    table[0xCA] = i(Op::Dex, IMP, 1, 2);
    table[0xCB] = i(Op::Wai, IMP, 1, 3);
    table[0xCC] = i(Op::Cpy, ABS, 3, 4);
    table[0xCD] = i(Op::Cmp, ABS, 3, 4);
    table[0xCE] = i(Op::Dec, ABS, 3, 6);
    table[0xCF] = i(Op::Bbs(4), ZP, 3, 5);

    table[0xD0] = i(Op::Bne, REL, 2, 2);
    table[0xD1] = i(Op::Cmp, IZY, 2, 5);
    table[0xD2] = i(Op::Cmp, IZP, 2, 5);
    table[0xD5] = i(Op::Cmp, ZPX, 2, 4);
    table[0xD6] = i(Op::Dec, ZPX, 2, 6);
    table[0xD7] = i(Op::Smb(5), ZP, 2, 5);
    table[0xD8] = i(Op::Cld, IMP, 1, 2);
    table[0xD9] = i(Op::Cmp, ABY, 3, 4);
    table[0xDA] = i(Op::Phx, IMP, 1, 3);
    table[0xDB] = i(Op::Stp, IMP, 1, 3);
    table[0xDD] = i(Op::Cmp, ABX, 3, 4);
    table[0xDE] = i(Op::Dec, ABX, 3, 7);
    table[0xDF] = i(Op::Bbs(5), ZP, 3, 5);

    table[0xE0] = i(Op::Cpx, IMM, 2, 2);
    table[0xE1] = i(Op::Sbc, IZX, 2, 6);
    table[0xE4] = i(Op::Cpx, ZP, 2, 3);
    table[0xE5] = i(Op::Sbc, ZP, 2, 3);
    table[0xE6] = i(Op::Inc, ZP, 2, 5);
    table[0xE7] = i(Op::Smb(6), ZP, 2, 5);
    table[0xE8] = i(Op::Inx, IMP, 1, 2);
    table[0xE9] = i(Op::Sbc, IMM, 2, 2);
    table[0xEA] = i(Op::Nop, IMP, 1, 2);
    table[0xEC] = i(Op::Cpx, ABS, 3, 4);
    table[0xED] = i(Op::Sbc, ABS, 3, 4);
    table[0xEE] = i(Op::Inc, ABS, 3, 6);
    table[0xEF] = i(Op::Bbs(6), ZP, 3, 5);

    table[0xF0] = i(Op::Beq, REL, 2, 2);
    table[0xF1] = i(Op::Sbc, IZY, 2, 5);
    table[0xF2] = i(Op::Sbc, IZP, 2, 5);
    table[0xF5] = i(Op::Sbc, ZPX, 2, 4);
    table[0xF6] = i(Op::Inc, ZPX, 2, 6);
    table[0xF7] = i(Op::Smb(7), ZP, 2, 5);
    table[0xF8] = i(Op::Sed, IMP, 1, 2);
    table[0xF9] = i(Op::Sbc, ABY, 3, 4);
    table[0xFA] = i(Op::Plx, IMP, 1, 4);
    table[0xFD] = i(Op::Sbc, ABX, 3, 4);
    table[0xFE] = i(Op::Inc, ABX, 3, 7);
    table[0xFF] = i(Op::Bbs(7), ZP, 3, 5);

    table
};

/// Decode `opcode` to its full instruction descriptor. Never fails: every
/// byte value, including reserved ones, yields a valid entry.
#[must_use]
pub fn decode(opcode: u8) -> &'static InstructionInfo {
    &OPCODES[opcode as usize]
}
