//! A device-mapped [`AddressSpace`] implementing the CPU's [`w65c02_cpu::Bus`]
//! contract over a [`DeviceMapper`].

use w65c02_cpu::Bus;

use crate::device::Device;
use crate::error::BusError;
use crate::mapping::{DeviceMapper, UnmappedRange};

/// The system's 64 KiB address space: a [`DeviceMapper`] plus an open-bus
/// latch tracking the last byte that moved across the bus, for the common
/// "reads of unmapped addresses return the last fetched byte" behavior real
/// hardware exhibits.
#[derive(Default)]
pub struct AddressSpace {
    mapper: DeviceMapper,
    last_bus_value: u8,
    fault: Option<BusError>,
}

impl AddressSpace {
    /// Create an address space with no devices mapped.
    #[must_use]
    pub fn new() -> Self {
        Self {
            mapper: DeviceMapper::new(),
            last_bus_value: 0xFF,
            fault: None,
        }
    }

    /// Map `device` onto `start..=end`, see [`DeviceMapper::map_device`].
    ///
    /// # Errors
    ///
    /// See [`DeviceMapper::map_device`].
    pub fn map(
        &mut self,
        device: Box<dyn Device>,
        start: u16,
        end: u16,
        name: impl Into<String>,
        read_only: bool,
    ) -> Result<(), BusError> {
        self.mapper.map_device(device, start, end, name, 0, read_only)
    }

    /// Remove the mapping registered under `name`.
    ///
    /// # Errors
    ///
    /// See [`DeviceMapper::unmap_by_name`].
    pub fn unmap(&mut self, name: &str) -> Result<(), BusError> {
        self.mapper.unmap_by_name(name)
    }

    /// The underlying device mapper, for inspection.
    #[must_use]
    pub fn mapper(&self) -> &DeviceMapper {
        &self.mapper
    }

    /// Mutable access to the underlying device mapper.
    pub fn mapper_mut(&mut self) -> &mut DeviceMapper {
        &mut self.mapper
    }

    /// Contiguous runs of the address space with no mapping.
    #[must_use]
    pub fn unmapped_ranges(&self) -> Vec<UnmappedRange> {
        self.mapper.unmapped_ranges()
    }

    /// The last byte that crossed the bus on a read or successful write,
    /// used as the open-bus value when nothing is mapped at an address.
    #[must_use]
    pub fn last_bus_value(&self) -> u8 {
        self.last_bus_value
    }

    /// Advance every mapped device's internal clock by one cycle, in
    /// priority order. `cycle` is the running master-cycle count.
    pub fn tick_devices(&mut self, cycle: u64) {
        self.mapper.tick_all(cycle);
    }

    /// Reset every mapped device to its power-on state.
    pub fn reset_devices(&mut self) {
        self.mapper.reset_all();
    }

    /// Take the most recent [`BusError`] raised by a `Bus::write` call (a
    /// store to an unmapped or read-only address), clearing it. `None` if no
    /// write has faulted since the last call.
    ///
    /// The CPU's [`Bus`] contract makes `write` infallible so instruction
    /// execution never has to check a return value; this is where that
    /// fault resurfaces for a host loop (see [`crate::Scheduler::tick`]) to
    /// report to its caller.
    pub fn take_fault(&mut self) -> Option<BusError> {
        self.fault.take()
    }

    /// Peek at the most recent bus fault without clearing it.
    #[must_use]
    pub fn fault(&self) -> Option<&BusError> {
        self.fault.as_ref()
    }
}

impl Bus for AddressSpace {
    fn read(&mut self, addr: u16) -> u8 {
        let value = self.mapper.read(addr);
        self.last_bus_value = value;
        value
    }

    fn write(&mut self, addr: u16, value: u8) {
        match self.mapper.write(addr, value) {
            Ok(()) => self.last_bus_value = value,
            Err(err) => {
                log::warn!("bus fault: {err}");
                self.fault = Some(err);
            }
        }
    }

    fn peek(&self, addr: u16) -> u8 {
        self.mapper.peek(addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ram(Vec<u8>);

    impl Device for Ram {
        fn read(&mut self, offset: u16) -> u8 {
            self.0[offset as usize]
        }
        fn write(&mut self, offset: u16, value: u8) {
            self.0[offset as usize] = value;
        }
        fn name(&self) -> &str {
            "ram"
        }
    }

    #[test]
    fn read_write_round_trip_through_bus_trait() {
        let mut space = AddressSpace::new();
        space
            .map(Box::new(Ram(vec![0; 0x800])), 0x0000, 0x07FF, "", false)
            .unwrap();
        space.write(0x0100, 0xAB);
        assert_eq!(space.read(0x0100), 0xAB);
    }

    #[test]
    fn unmapped_read_returns_open_bus() {
        let mut space = AddressSpace::new();
        assert_eq!(space.read(0x9000), 0xFF);
    }

    #[test]
    fn write_to_read_only_mapping_latches_a_fault_instead_of_panicking() {
        let mut space = AddressSpace::new();
        space
            .map(Box::new(Ram(vec![0xEA; 0x10])), 0x8000, 0x800F, "rom", true)
            .unwrap();
        space.write(0x8000, 0x00);
        assert!(matches!(space.take_fault(), Some(BusError::WriteToReadOnly(0x8000, _))));
        assert!(space.take_fault().is_none(), "fault should be cleared after being taken");
        assert_eq!(space.read(0x8000), 0xEA, "the rejected write must not have landed");
    }

    #[test]
    fn last_bus_value_tracks_most_recent_transfer() {
        let mut space = AddressSpace::new();
        space
            .map(Box::new(Ram(vec![0; 0x10])), 0x0000, 0x000F, "", false)
            .unwrap();
        space.write(0x0005, 0x7A);
        assert_eq!(space.last_bus_value(), 0x7A);
        space.read(0x0005);
        assert_eq!(space.last_bus_value(), 0x7A);
    }
}
