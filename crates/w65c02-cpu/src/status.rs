//! Processor status register (P).

use bitflags::bitflags;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

bitflags! {
    /// The W65C02S processor status register.
    ///
    /// Bit 5 (`U`) has no hardware meaning and always reads as 1; it is kept
    /// here as a named flag so stack round-trips can assert its value rather
    /// than special-casing it everywhere.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct Status: u8 {
        /// Carry
        const C = 0b0000_0001;
        /// Zero
        const Z = 0b0000_0010;
        /// IRQ disable
        const I = 0b0000_0100;
        /// Decimal mode
        const D = 0b0000_1000;
        /// Break (only meaningful in the byte pushed to the stack)
        const B = 0b0001_0000;
        /// Unused, always reads 1
        const U = 0b0010_0000;
        /// Overflow
        const V = 0b0100_0000;
        /// Negative
        const N = 0b1000_0000;
    }
}

/// Power-on / RESET value of P: interrupts disabled, unused bit set.
pub const POWER_ON: Status = Status::from_bits_truncate(Status::I.bits() | Status::U.bits());

/// Mask applied when PLP/RTI restore P from the stack: the unused bit is
/// always forced to 1 regardless of what was pushed.
const RESTORE_FORCE_SET: Status = Status::U;

impl Status {
    /// Status with only the unused bit set, as on power-on before RESET
    /// initializes I.
    #[must_use]
    pub fn new() -> Self {
        Status::U
    }

    /// Set N and Z from an 8-bit result.
    pub fn set_zn(&mut self, value: u8) {
        self.set(Status::Z, value == 0);
        self.set(Status::N, value & 0x80 != 0);
    }

    /// Set or clear a single flag.
    pub fn set_flag(&mut self, flag: Status, value: bool) {
        self.set(flag, value);
    }

    /// Render P as pushed to the stack by PHP or by interrupt/BRK entry.
    ///
    /// `brk` selects whether the B bit is set (true for PHP and BRK, false
    /// for hardware NMI/IRQ entry).
    #[must_use]
    pub fn to_stack_byte(self, brk: bool) -> u8 {
        let mut bits = self | Status::U;
        bits.set(Status::B, brk);
        bits.bits()
    }

    /// Reconstruct P from a byte pulled off the stack (PLP, RTI).
    ///
    /// The unused bit is forced to 1; B is restored as pulled since it has
    /// no effect on CPU behavior outside of the stack image itself.
    #[must_use]
    pub fn from_stack_byte(value: u8) -> Self {
        Status::from_bits_truncate(value) | RESTORE_FORCE_SET
    }
}

impl Default for Status {
    fn default() -> Self {
        Status::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_has_only_unused_bit() {
        assert_eq!(Status::new(), Status::U);
    }

    #[test]
    fn set_zn_zero() {
        let mut p = Status::new();
        p.set_zn(0);
        assert!(p.contains(Status::Z));
        assert!(!p.contains(Status::N));
    }

    #[test]
    fn set_zn_negative() {
        let mut p = Status::new();
        p.set_zn(0x80);
        assert!(!p.contains(Status::Z));
        assert!(p.contains(Status::N));
    }

    #[test]
    fn to_stack_byte_forces_unused_and_break() {
        let p = Status::N | Status::C;
        assert_eq!(p.to_stack_byte(true), (Status::N | Status::C | Status::U | Status::B).bits());
        assert_eq!(p.to_stack_byte(false), (Status::N | Status::C | Status::U).bits());
    }

    #[test]
    fn from_stack_byte_forces_unused() {
        let restored = Status::from_stack_byte(0x00);
        assert!(restored.contains(Status::U));
    }

    #[test]
    fn round_trip_through_stack_preserves_nvzc() {
        let p = Status::N | Status::V | Status::Z | Status::C;
        let byte = p.to_stack_byte(false);
        let restored = Status::from_stack_byte(byte);
        assert_eq!(restored & (Status::N | Status::V | Status::Z | Status::C), p);
    }
}
