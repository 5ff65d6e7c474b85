//! Cycle-accurate W65C02S CPU core.
//!
//! This crate implements the register file, the full documented instruction
//! set (including the W65C02S extensions over NMOS 6502: `BRA`, `STZ`,
//! `TRB`/`TSB`, `BBRn`/`BBSn`/`RMBn`/`SMBn`, `PHX`/`PHY`/`PLX`/`PLY`,
//! `JMP (abs,X)`, zero-page indirect addressing, immediate `BIT`, and
//! `WAI`/`STP`), and interrupt arbitration via [`InterruptController`]. It
//! has no opinion on memory layout or peripherals beyond the [`Bus`] trait
//! it is driven through — that belongs to a system crate layered on top.
//!
//! The 65C02 has no runtime-fallible instructions; every opcode decodes and
//! every addressing mode resolves unconditionally (undocumented opcodes are
//! 1-byte, 1-cycle NOPs). [`InvalidStateError`] exists only at the
//! object-construction / interrupt-registration boundary, never from
//! [`Cpu::tick`].

mod addressing;
mod bus;
mod cpu;
mod decode;
mod error;
mod interrupt;
mod status;

pub use addressing::{AddrMode, EffectiveAddress};
pub use bus::{vectors, Bus};
pub use cpu::{Cpu, RunState};
pub use decode::{decode, InstructionInfo, Op};
pub use error::InvalidStateError;
pub use interrupt::{InterruptController, InterruptKind, VectorInfo};
pub use status::Status;
