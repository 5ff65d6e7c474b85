//! Error types for bus wiring, device mapping, and system configuration.

use thiserror::Error;

/// Failures that can occur while mapping devices into the address space or
/// while driving the resulting bus.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    /// A new mapping's address range overlaps one or more existing mappings.
    #[error("range {new_start:#06x}..={new_end:#06x} overlaps existing mapping {existing_name:?} at {existing_start:#06x}..={existing_end:#06x}")]
    Overlap {
        /// Name of the device being mapped.
        new_name: String,
        /// First address of the new mapping.
        new_start: u16,
        /// Last address of the new mapping.
        new_end: u16,
        /// Name of the conflicting, already-mapped device.
        existing_name: String,
        /// First address of the conflicting mapping.
        existing_start: u16,
        /// Last address of the conflicting mapping.
        existing_end: u16,
    },
    /// A device with this name is already registered in the mapper.
    #[error("a device named {0:?} is already mapped")]
    NameConflict(String),
    /// `start > end`, so the requested range is empty or inverted.
    #[error("invalid range: start {start:#06x} is after end {end:#06x}")]
    InvalidRange {
        /// Requested first address.
        start: u16,
        /// Requested last address.
        end: u16,
    },
    /// No device is mapped at this address and the bus has no open-bus
    /// fallback configured for it.
    #[error("no device mapped at address {0:#06x}")]
    Unmapped(u16),
    /// A write landed on an address whose device is read-only.
    #[error("address {0:#06x} ({1:?}) is read-only")]
    WriteToReadOnly(u16, String),
    /// Lookup by name found nothing.
    #[error("no device named {0:?} is mapped")]
    NoSuchDevice(String),
}

/// Failures that can occur while building or validating a [`crate::config::SystemConfig`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A device descriptor's address range is invalid or overlaps another.
    #[error(transparent)]
    Bus(#[from] BusError),
    /// A referenced device kind is not one the builder knows how to
    /// construct.
    #[error("unknown device kind {0:?}")]
    UnknownDeviceKind(String),
    /// A descriptor's size is zero, which can never back a real device.
    #[error("device {0:?} has zero size")]
    ZeroSizedDevice(String),
}
