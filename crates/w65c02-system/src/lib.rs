//! Device-mapped bus, interrupt bridging, and a master-cycle scheduler built
//! around the [`w65c02_cpu`] core.
//!
//! Where `w65c02-cpu` has no opinion on memory layout or peripherals, this
//! crate supplies them: a [`Device`] trait peripherals implement, a
//! [`DeviceMapper`]/[`AddressSpace`] that resolves addresses to devices with
//! overlap detection, a [`Scheduler`] that ticks devices and bridges their
//! IRQ lines into the CPU every master cycle, and a [`System`] that wires
//! all three together into one runnable machine.

mod bus;
mod config;
mod device;
mod error;
mod inspector;
mod mapping;
mod scheduler;
mod system;

pub use bus::AddressSpace;
pub use config::{DeviceDescriptor, ExecutionMode, SystemConfig};
pub use device::{Device, Priority};
pub use error::{BusError, ConfigError};
pub use inspector::{Inspector, MemoryMapEntry, RegisterSnapshot};
pub use mapping::{DeviceMapper, DeviceMapping, UnmappedRange};
pub use scheduler::{timing, Scheduler};
pub use system::System;
