//! Error types raised at CPU construction / state-restore boundaries.

use thiserror::Error;

/// A construction-time or state-restore-time error.
///
/// The W65C02S itself cannot fault at runtime (see the crate-level docs), so
/// this type is never produced by [`crate::Cpu::tick`] or instruction
/// execution; it only guards interrupt-line registration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidStateError {
    /// An interrupt source was registered with an empty identifier.
    #[error("interrupt source id must not be empty")]
    EmptySourceId,
}
