//! The W65C02S core: registers, the per-master-cycle tick loop, and the
//! full instruction executor.

use crate::addressing::{self, AddrMode, EffectiveAddress};
use crate::bus::{vectors, Bus};
use crate::decode::{self, InstructionInfo, Op};
use crate::interrupt::{InterruptController, InterruptKind, VectorInfo};
use crate::status::{self, Status};

/// High-level run state, driven by `WAI`/`STP` and interrupt/reset entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    /// Normal fetch/decode/execute.
    #[default]
    Running,
    /// Suspended by `WAI`; resumes on any pending interrupt.
    Waiting,
    /// Suspended by `STP`; resumes only on RESET.
    Stopped,
}

/// The W65C02S register file plus the countdown-cycle execution engine.
///
/// The CPU does not model individual bus phases of an instruction; it
/// executes an instruction's full semantics when the previous instruction's
/// cycle countdown reaches zero, then reports the new instruction's total
/// cycle cost as a countdown consumed one [`tick`](Cpu::tick) at a time.
/// This gives the Scheduler exact per-master-cycle alignment with
/// peripherals while keeping the executor itself a plain, testable
/// function from state to state.
#[derive(Debug, Clone)]
pub struct Cpu {
    /// Accumulator.
    pub a: u8,
    /// X index register.
    pub x: u8,
    /// Y index register.
    pub y: u8,
    /// Stack pointer; effective address is always `0x0100 | sp`.
    pub sp: u8,
    /// Program counter.
    pub pc: u16,
    /// Processor status register.
    pub status: Status,
    /// Total master cycles elapsed since the last RESET.
    pub cycles: u64,
    /// Run state (Running/Waiting/Stopped).
    pub state: RunState,
    remaining: u8,
}

impl Cpu {
    /// Construct a CPU with all registers zeroed and `P = 0x20` (unused bit
    /// only). Call [`reset`](Cpu::reset) or drive an `InterruptController`
    /// RESET before relying on `pc`/`sp`/`status`.
    #[must_use]
    pub fn new() -> Self {
        Cpu {
            a: 0,
            x: 0,
            y: 0,
            sp: 0,
            pc: 0,
            status: Status::new(),
            cycles: 0,
            state: RunState::Running,
            remaining: 0,
        }
    }

    /// Whether the CPU is still mid-instruction (still consuming the
    /// current countdown) as opposed to ready to decode at the next tick.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.remaining > 0
    }

    /// Convenience RESET entry that bypasses the `InterruptController`
    /// (useful for tests and for system power-on). Sets `S := 0xFD`,
    /// `P |= (I|U)`, `D := 0`, loads `PC` from the RESET vector, and
    /// accounts for the 7-cycle RESET entry cost.
    pub fn reset<B: Bus>(&mut self, bus: &mut B) {
        self.sp = 0xFD;
        self.status.insert(status::POWER_ON);
        self.status.remove(Status::D);
        self.pc = bus.read_word(vectors::RESET);
        self.cycles = 7;
        self.remaining = 0;
        self.state = RunState::Running;
        log::debug!("RESET complete, PC={:#06x}", self.pc);
    }

    /// Advance by exactly one master cycle. Intended to be called once per
    /// cycle by a Scheduler; see the crate-level docs for the countdown
    /// model.
    pub fn tick<B: Bus>(&mut self, bus: &mut B, interrupts: &mut InterruptController) {
        self.cycles += 1;

        if self.remaining > 0 {
            self.remaining -= 1;
            return;
        }

        let irq_enabled = !self.status.contains(Status::I);
        let pending = interrupts.highest_priority_pending(irq_enabled);
        let can_service = match self.state {
            RunState::Stopped => matches!(pending, Some(InterruptKind::Reset)),
            RunState::Running | RunState::Waiting => pending.is_some(),
        };

        if can_service {
            if let Some(info) = interrupts.acknowledge(irq_enabled) {
                self.enter_interrupt(bus, info);
                self.remaining = info.base_cycles.saturating_sub(1);
                self.state = RunState::Running;
            }
            return;
        }

        match self.state {
            RunState::Stopped | RunState::Waiting => {
                // Cycle already accounted for above; no PC change.
            }
            RunState::Running => {
                let opcode = bus.read(self.pc);
                self.pc = self.pc.wrapping_add(1);
                let info = decode::decode(opcode);
                let total = self.execute(bus, info, interrupts);
                self.remaining = total.saturating_sub(1);
            }
        }
    }

    /// Run ticks until the in-flight instruction (or interrupt entry)
    /// completes, returning the number of master cycles it consumed. A
    /// convenience wrapper over [`tick`](Cpu::tick) for tests and simple
    /// host loops; a full Scheduler drives `tick` directly instead.
    pub fn step<B: Bus>(&mut self, bus: &mut B, interrupts: &mut InterruptController) -> u64 {
        let start = self.cycles;
        loop {
            self.tick(bus, interrupts);
            if !self.is_busy() {
                break;
            }
        }
        self.cycles - start
    }

    fn enter_interrupt<B: Bus>(&mut self, bus: &mut B, info: VectorInfo) {
        match info.kind {
            InterruptKind::Reset => {
                self.sp = 0xFD;
                self.status.insert(status::POWER_ON);
                self.status.remove(Status::D);
                self.pc = bus.read_word(vectors::RESET);
            }
            InterruptKind::Nmi | InterruptKind::Irq => {
                let [lo, hi] = self.pc.to_le_bytes();
                self.push_u8(bus, hi);
                self.push_u8(bus, lo);
                self.push_u8(bus, self.status.to_stack_byte(false));
                self.status.insert(Status::I);
                self.status.remove(Status::D);
                self.pc = bus.read_word(info.vector_addr);
            }
        }
        log::trace!("entered {:?}, PC={:#06x}", info.kind, self.pc);
    }

    fn push_u8<B: Bus>(&mut self, bus: &mut B, value: u8) {
        bus.write(0x0100 | u16::from(self.sp), value);
        self.sp = self.sp.wrapping_sub(1);
    }

    fn pull_u8<B: Bus>(&mut self, bus: &mut B) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        bus.read(0x0100 | u16::from(self.sp))
    }

    fn compare(&mut self, reg: u8, operand: u8) {
        let result = reg.wrapping_sub(operand);
        self.status.set_flag(Status::C, reg >= operand);
        self.status.set_flag(Status::Z, reg == operand);
        self.status.set_flag(Status::N, result & 0x80 != 0);
    }

    fn adc(&mut self, operand: u8) {
        let a = self.a;
        let carry_in = u16::from(self.status.contains(Status::C));

        if self.status.contains(Status::D) {
            let mut al = u16::from(a & 0x0F) + u16::from(operand & 0x0F) + carry_in;
            if al >= 0x0A {
                al = ((al + 0x06) & 0x0F) + 0x10;
            }
            let mut sum = u16::from(a & 0xF0) + u16::from(operand & 0xF0) + al;
            if sum >= 0xA0 {
                sum += 0x60;
            }
            let carry_out = sum >= 0x100;
            let result = (sum & 0xFF) as u8;

            // V derives from the uncorrected binary sum, same as the W65C02S
            // datasheet describes; only N/Z reflect the BCD-corrected byte.
            let bin_sum = u16::from(a) + u16::from(operand) + carry_in;
            let bin_result = (bin_sum & 0xFF) as u8;
            let overflow = (a ^ bin_result) & (operand ^ bin_result) & 0x80 != 0;

            self.status.set_flag(Status::C, carry_out);
            self.status.set_flag(Status::V, overflow);
            self.status.set_zn(result);
            self.a = result;
        } else {
            let sum = u16::from(a) + u16::from(operand) + carry_in;
            let result = (sum & 0xFF) as u8;
            let overflow = (a ^ result) & (operand ^ result) & 0x80 != 0;
            self.status.set_flag(Status::C, sum > 0xFF);
            self.status.set_flag(Status::V, overflow);
            self.status.set_zn(result);
            self.a = result;
        }
    }

    fn sbc(&mut self, operand: u8) {
        let a = self.a;
        let carry_in = u16::from(self.status.contains(Status::C));
        let inverted = !operand;

        // C and V derive from ordinary two's-complement subtraction (the
        // "SBC is ADC of the complement" identity) in both binary and
        // decimal mode, per the W65C02S datasheet.
        let bin_sum = u16::from(a) + u16::from(inverted) + carry_in;
        let bin_result = (bin_sum & 0xFF) as u8;
        let carry_out = bin_sum > 0xFF;
        let overflow = (a ^ bin_result) & (inverted ^ bin_result) & 0x80 != 0;
        self.status.set_flag(Status::C, carry_out);
        self.status.set_flag(Status::V, overflow);

        if self.status.contains(Status::D) {
            // Naively feeding the one's complement through the ADC BCD
            // correction above does not reproduce real decimal-subtract
            // borrow behavior, so the dedicated per-nibble correction is
            // used for the stored result (and for N/Z, per the W65C02S
            // fixing them to the final BCD byte).
            let mut lo = i16::from(a & 0x0F) - i16::from(operand & 0x0F) - 1 + carry_in as i16;
            if lo < 0 {
                lo = ((lo - 0x06) & 0x0F) - 0x10;
            }
            let mut result = i16::from(a & 0xF0) - i16::from(operand & 0xF0) + lo;
            if result < 0 {
                result -= 0x60;
            }
            let result = (result & 0xFF) as u8;
            self.status.set_zn(result);
            self.a = result;
        } else {
            self.status.set_zn(bin_result);
            self.a = bin_result;
        }
    }

    fn read_rmw<B: Bus>(&self, bus: &mut B, mode: AddrMode, ea: &EffectiveAddress) -> u8 {
        if mode == AddrMode::Accumulator {
            self.a
        } else {
            bus.read(ea.address.expect("rmw mode must resolve an address"))
        }
    }

    fn write_rmw<B: Bus>(&mut self, bus: &mut B, mode: AddrMode, ea: &EffectiveAddress, value: u8) {
        if mode == AddrMode::Accumulator {
            self.a = value;
        } else {
            bus.write(ea.address.expect("rmw mode must resolve an address"), value);
        }
    }

    fn branch(&mut self, taken: bool, ea: &EffectiveAddress, cycles: &mut u8) {
        if taken {
            *cycles += 1;
            if ea.page_crossed {
                *cycles += 1;
            }
            self.pc = ea.address.expect("branch mode must resolve a target");
        }
    }

    fn branch_bit<B: Bus>(
        &mut self,
        bus: &mut B,
        ea: &EffectiveAddress,
        bit: u8,
        branch_if_set: bool,
        cycles: &mut u8,
        operand_pc: u16,
    ) {
        let addr = ea.address.expect("bbr/bbs must resolve a zero-page address");
        let value = bus.read(addr);
        let bit_is_set = value & (1 << bit) != 0;
        if bit_is_set == branch_if_set {
            let offset = bus.read(operand_pc.wrapping_add(1)) as i8;
            let base = self.pc;
            let target = base.wrapping_add(offset as u16);
            *cycles += 1;
            if (base & 0xFF00) != (target & 0xFF00) {
                *cycles += 1;
            }
            self.pc = target;
        }
    }

    const fn is_read_op(op: Op) -> bool {
        matches!(
            op,
            Op::Lda
                | Op::Ldx
                | Op::Ldy
                | Op::And
                | Op::Ora
                | Op::Eor
                | Op::Adc
                | Op::Sbc
                | Op::Cmp
                | Op::Cpx
                | Op::Cpy
                | Op::Bit
        )
    }

    fn execute<B: Bus>(
        &mut self,
        bus: &mut B,
        info: &InstructionInfo,
        interrupts: &mut InterruptController,
    ) -> u8 {
        let operand_pc = self.pc;
        let ea = addressing::resolve(bus, info.mode, operand_pc, self.x, self.y);
        let operand_len = u16::from(info.len - 1);
        self.pc = operand_pc.wrapping_add(operand_len);

        let mut cycles = info.cycles;
        if Self::is_read_op(info.op) && info.mode.can_page_cross() && ea.page_crossed {
            cycles += 1;
        }

        match info.op {
            Op::Lda => {
                let v = operand_value(bus, &ea);
                self.status.set_zn(v);
                self.a = v;
            }
            Op::Ldx => {
                let v = operand_value(bus, &ea);
                self.status.set_zn(v);
                self.x = v;
            }
            Op::Ldy => {
                let v = operand_value(bus, &ea);
                self.status.set_zn(v);
                self.y = v;
            }
            Op::Sta => bus.write(ea.address.expect("sta target"), self.a),
            Op::Stx => bus.write(ea.address.expect("stx target"), self.x),
            Op::Sty => bus.write(ea.address.expect("sty target"), self.y),
            Op::Stz => bus.write(ea.address.expect("stz target"), 0),

            Op::Tax => {
                self.x = self.a;
                self.status.set_zn(self.x);
            }
            Op::Tay => {
                self.y = self.a;
                self.status.set_zn(self.y);
            }
            Op::Txa => {
                self.a = self.x;
                self.status.set_zn(self.a);
            }
            Op::Tya => {
                self.a = self.y;
                self.status.set_zn(self.a);
            }
            Op::Tsx => {
                self.x = self.sp;
                self.status.set_zn(self.x);
            }
            Op::Txs => self.sp = self.x,

            Op::Pha => self.push_u8(bus, self.a),
            Op::Php => {
                let byte = self.status.to_stack_byte(true);
                self.push_u8(bus, byte);
            }
            Op::Phx => self.push_u8(bus, self.x),
            Op::Phy => self.push_u8(bus, self.y),
            Op::Pla => {
                let v = self.pull_u8(bus);
                self.status.set_zn(v);
                self.a = v;
            }
            Op::Plp => {
                let v = self.pull_u8(bus);
                self.status = Status::from_stack_byte(v);
            }
            Op::Plx => {
                let v = self.pull_u8(bus);
                self.status.set_zn(v);
                self.x = v;
            }
            Op::Ply => {
                let v = self.pull_u8(bus);
                self.status.set_zn(v);
                self.y = v;
            }

            Op::Adc => {
                let v = operand_value(bus, &ea);
                self.adc(v);
                if self.status.contains(Status::D) {
                    cycles += 1;
                }
            }
            Op::Sbc => {
                let v = operand_value(bus, &ea);
                self.sbc(v);
                if self.status.contains(Status::D) {
                    cycles += 1;
                }
            }

            Op::Inc => {
                let v = self.read_rmw(bus, info.mode, &ea).wrapping_add(1);
                self.write_rmw(bus, info.mode, &ea, v);
                self.status.set_zn(v);
            }
            Op::Dec => {
                let v = self.read_rmw(bus, info.mode, &ea).wrapping_sub(1);
                self.write_rmw(bus, info.mode, &ea, v);
                self.status.set_zn(v);
            }
            Op::Inx => {
                self.x = self.x.wrapping_add(1);
                self.status.set_zn(self.x);
            }
            Op::Iny => {
                self.y = self.y.wrapping_add(1);
                self.status.set_zn(self.y);
            }
            Op::Dex => {
                self.x = self.x.wrapping_sub(1);
                self.status.set_zn(self.x);
            }
            Op::Dey => {
                self.y = self.y.wrapping_sub(1);
                self.status.set_zn(self.y);
            }

            Op::And => {
                self.a &= operand_value(bus, &ea);
                self.status.set_zn(self.a);
            }
            Op::Ora => {
                self.a |= operand_value(bus, &ea);
                self.status.set_zn(self.a);
            }
            Op::Eor => {
                self.a ^= operand_value(bus, &ea);
                self.status.set_zn(self.a);
            }

            Op::Bit => {
                let v = operand_value(bus, &ea);
                self.status.set_flag(Status::Z, self.a & v == 0);
                if info.mode != AddrMode::Immediate {
                    self.status.set_flag(Status::N, v & 0x80 != 0);
                    self.status.set_flag(Status::V, v & 0x40 != 0);
                }
            }
            Op::Trb => {
                let addr = ea.address.expect("trb target");
                let v = bus.read(addr);
                self.status.set_flag(Status::Z, self.a & v == 0);
                bus.write(addr, v & !self.a);
            }
            Op::Tsb => {
                let addr = ea.address.expect("tsb target");
                let v = bus.read(addr);
                self.status.set_flag(Status::Z, self.a & v == 0);
                bus.write(addr, v | self.a);
            }

            Op::Asl => {
                let v = self.read_rmw(bus, info.mode, &ea);
                let carry = v & 0x80 != 0;
                let r = v << 1;
                self.write_rmw(bus, info.mode, &ea, r);
                self.status.set_flag(Status::C, carry);
                self.status.set_zn(r);
            }
            Op::Lsr => {
                let v = self.read_rmw(bus, info.mode, &ea);
                let carry = v & 0x01 != 0;
                let r = v >> 1;
                self.write_rmw(bus, info.mode, &ea, r);
                self.status.set_flag(Status::C, carry);
                self.status.set_zn(r);
            }
            Op::Rol => {
                let v = self.read_rmw(bus, info.mode, &ea);
                let carry_in = u8::from(self.status.contains(Status::C));
                let carry_out = v & 0x80 != 0;
                let r = (v << 1) | carry_in;
                self.write_rmw(bus, info.mode, &ea, r);
                self.status.set_flag(Status::C, carry_out);
                self.status.set_zn(r);
            }
            Op::Ror => {
                let v = self.read_rmw(bus, info.mode, &ea);
                let carry_in = u8::from(self.status.contains(Status::C));
                let carry_out = v & 0x01 != 0;
                let r = (v >> 1) | (carry_in << 7);
                self.write_rmw(bus, info.mode, &ea, r);
                self.status.set_flag(Status::C, carry_out);
                self.status.set_zn(r);
            }

            Op::Cmp => {
                let v = operand_value(bus, &ea);
                self.compare(self.a, v);
            }
            Op::Cpx => {
                let v = operand_value(bus, &ea);
                self.compare(self.x, v);
            }
            Op::Cpy => {
                let v = operand_value(bus, &ea);
                self.compare(self.y, v);
            }

            Op::Bcc => self.branch(!self.status.contains(Status::C), &ea, &mut cycles),
            Op::Bcs => self.branch(self.status.contains(Status::C), &ea, &mut cycles),
            Op::Beq => self.branch(self.status.contains(Status::Z), &ea, &mut cycles),
            Op::Bne => self.branch(!self.status.contains(Status::Z), &ea, &mut cycles),
            Op::Bmi => self.branch(self.status.contains(Status::N), &ea, &mut cycles),
            Op::Bpl => self.branch(!self.status.contains(Status::N), &ea, &mut cycles),
            Op::Bvc => self.branch(!self.status.contains(Status::V), &ea, &mut cycles),
            Op::Bvs => self.branch(self.status.contains(Status::V), &ea, &mut cycles),
            Op::Bra => self.branch(true, &ea, &mut cycles),

            Op::Jmp => self.pc = ea.address.expect("jmp target"),
            Op::Jsr => {
                let return_addr = operand_pc.wrapping_add(1);
                let [lo, hi] = return_addr.to_le_bytes();
                self.push_u8(bus, hi);
                self.push_u8(bus, lo);
                self.pc = ea.address.expect("jsr target");
            }
            Op::Rts => {
                let lo = self.pull_u8(bus);
                let hi = self.pull_u8(bus);
                self.pc = u16::from_le_bytes([lo, hi]).wrapping_add(1);
            }
            Op::Rti => {
                let p = self.pull_u8(bus);
                self.status = Status::from_stack_byte(p);
                let lo = self.pull_u8(bus);
                let hi = self.pull_u8(bus);
                self.pc = u16::from_le_bytes([lo, hi]);
                interrupts.complete_service();
            }
            Op::Brk => {
                let return_addr = operand_pc.wrapping_add(1);
                let [lo, hi] = return_addr.to_le_bytes();
                self.push_u8(bus, hi);
                self.push_u8(bus, lo);
                let byte = self.status.to_stack_byte(true);
                self.push_u8(bus, byte);
                self.status.insert(Status::I);
                self.status.remove(Status::D);
                self.pc = bus.read_word(vectors::IRQ);
            }

            Op::Clc => self.status.remove(Status::C),
            Op::Sec => self.status.insert(Status::C),
            Op::Cli => self.status.remove(Status::I),
            Op::Sei => self.status.insert(Status::I),
            Op::Cld => self.status.remove(Status::D),
            Op::Sed => self.status.insert(Status::D),
            Op::Clv => self.status.remove(Status::V),

            Op::Nop => {}
            Op::Wai => self.state = RunState::Waiting,
            Op::Stp => self.state = RunState::Stopped,

            Op::Bbr(bit) => self.branch_bit(bus, &ea, bit, false, &mut cycles, operand_pc),
            Op::Bbs(bit) => self.branch_bit(bus, &ea, bit, true, &mut cycles, operand_pc),
            Op::Rmb(bit) => {
                let addr = ea.address.expect("rmb target");
                let v = bus.read(addr);
                bus.write(addr, v & !(1 << bit));
            }
            Op::Smb(bit) => {
                let addr = ea.address.expect("smb target");
                let v = bus.read(addr);
                bus.write(addr, v | (1 << bit));
            }
        }

        cycles
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

fn operand_value<B: Bus>(bus: &mut B, ea: &EffectiveAddress) -> u8 {
    match ea.immediate {
        Some(v) => v,
        None => bus.read(ea.address.expect("addressing mode must yield operand or address")),
    }
}
