//! The [`Device`] trait peripherals implement to be mapped onto the bus.

/// Scheduling priority for a device's per-cycle tick.
///
/// Devices tick in priority order within a single master cycle so that, for
/// example, an interrupt controller observes a peripheral's state change in
/// the same cycle it occurs rather than one cycle later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Priority {
    /// Ticked first: interrupt controllers and other devices whose state
    /// must be current before anything else observes it this cycle.
    Critical,
    /// Ticked after `Critical`: timers, DMA engines.
    High,
    /// The common case for a peripheral with no ordering requirement.
    #[default]
    Normal,
    /// Ticked last: devices that only ever consume state, never produce it.
    Low,
}

/// A memory-mapped peripheral.
///
/// Mirrors the shape of a hardware-mapper trait: every method but `read`/
/// `write` has a default no-op implementation, so a device only overrides
/// the hooks it actually needs.
pub trait Device: Send + Sync {
    /// Read a byte at `offset` within this device's mapped window.
    fn read(&mut self, offset: u16) -> u8;

    /// Write a byte at `offset` within this device's mapped window.
    fn write(&mut self, offset: u16, value: u8);

    /// Side-effect-free read for inspectors and debuggers. Defaults to
    /// re-reading an unspecified but harmless value; devices with genuine
    /// read side effects (status registers that clear-on-read, FIFOs)
    /// should override this to return the value `read` *would* return
    /// without triggering the side effect.
    fn peek(&self, _offset: u16) -> u8 {
        0xFF
    }

    /// Human-readable device name, used as the default mapping name and in
    /// inspector output. Defaults to a type-name-derived string; devices
    /// mapped by more than one instance should override this with something
    /// unique, since [`crate::mapping::DeviceMapper`] rejects duplicate
    /// names.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Scheduling priority for [`Self::tick`]. Defaults to [`Priority::Normal`].
    fn priority(&self) -> Priority {
        Priority::Normal
    }

    /// Advance internal state by one master cycle. `cycle` is the running
    /// master-cycle count since the last reset, not an elapsed-cycle count.
    /// Devices with no internal clock (plain RAM/ROM) never need to
    /// override this.
    fn tick(&mut self, _cycle: u64) {}

    /// Whether this device currently asserts an interrupt request.
    fn irq_pending(&self) -> bool {
        false
    }

    /// Acknowledge and clear this device's interrupt request, if any.
    fn irq_acknowledge(&mut self) {}

    /// Restore the device to its power-on state.
    fn reset(&mut self) {}
}
