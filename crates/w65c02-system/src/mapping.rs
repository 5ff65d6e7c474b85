//! Address-range mapping of [`Device`] instances onto the 16-bit address
//! space, with overlap detection and name-based lookup.

use std::cell::Cell;
use std::collections::HashMap;

use crate::device::{Device, Priority};
use crate::error::BusError;

/// One device's placement in the address space.
pub struct DeviceMapping {
    device: Box<dyn Device>,
    start: u16,
    end: u16,
    name: String,
    device_offset: u16,
    read_only: bool,
}

impl DeviceMapping {
    /// First address of this mapping's window.
    #[must_use]
    pub fn start(&self) -> u16 {
        self.start
    }

    /// Last address (inclusive) of this mapping's window.
    #[must_use]
    pub fn end(&self) -> u16 {
        self.end
    }

    /// Mapping name (device name unless overridden at map time).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of addresses covered by this mapping.
    #[must_use]
    pub fn size(&self) -> u32 {
        u32::from(self.end) - u32::from(self.start) + 1
    }

    /// Whether writes to this mapping are rejected.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// The mapped device's scheduling priority.
    #[must_use]
    pub fn priority(&self) -> Priority {
        self.device.priority()
    }

    /// Shared access to the mapped device, for inspectors.
    #[must_use]
    pub fn device(&self) -> &dyn Device {
        self.device.as_ref()
    }

    /// Exclusive access to the mapped device.
    pub fn device_mut(&mut self) -> &mut dyn Device {
        self.device.as_mut()
    }

    fn contains(&self, address: u16) -> bool {
        self.start <= address && address <= self.end
    }

    fn overlaps(&self, start: u16, end: u16) -> bool {
        !(end < self.start || start > self.end)
    }

    fn device_address(&self, system_address: u16) -> u16 {
        (system_address - self.start).wrapping_add(self.device_offset)
    }
}

/// One contiguous run of unmapped addresses, as reported by
/// [`DeviceMapper::unmapped_ranges`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnmappedRange {
    /// First unmapped address in the run.
    pub start: u16,
    /// Last unmapped address in the run.
    pub end: u16,
}

impl UnmappedRange {
    /// Number of addresses covered by this range.
    #[must_use]
    pub fn size(&self) -> u32 {
        u32::from(self.end) - u32::from(self.start) + 1
    }
}

/// Registry of [`DeviceMapping`]s, kept sorted by start address for O(log n)
/// address lookup via binary search.
///
/// A single-entry last-hit cache short-circuits the common case of repeated
/// accesses inside the same mapping (instruction fetch walking through one
/// ROM region, a loop hammering one RAM page); it is invalidated on any
/// structural change to the mapping list.
#[derive(Default)]
pub struct DeviceMapper {
    mappings: Vec<DeviceMapping>,
    names: HashMap<String, usize>,
    last_hit: Cell<Option<usize>>,
}

impl DeviceMapper {
    /// Create an empty mapper.
    #[must_use]
    pub fn new() -> Self {
        Self {
            mappings: Vec::new(),
            names: HashMap::new(),
            last_hit: Cell::new(None),
        }
    }

    /// Index of the mapping covering `address`, consulting and refreshing
    /// the last-hit cache.
    fn locate(&self, address: u16) -> Option<usize> {
        if let Some(idx) = self.last_hit.get() {
            if self.mappings.get(idx).is_some_and(|m| m.contains(address)) {
                return Some(idx);
            }
        }
        let idx = self.mappings.partition_point(|m| m.end < address);
        let hit = self.mappings.get(idx).filter(|m| m.contains(address)).map(|_| idx);
        self.last_hit.set(hit);
        hit
    }

    /// Map `device` onto `start..=end`. `name` defaults to `device.name()`
    /// when empty.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::InvalidRange`] if `start > end`, [`BusError::Overlap`]
    /// if the range intersects an existing mapping, or [`BusError::NameConflict`]
    /// if the resolved name is already registered.
    pub fn map_device(
        &mut self,
        device: Box<dyn Device>,
        start: u16,
        end: u16,
        name: impl Into<String>,
        device_offset: u16,
        read_only: bool,
    ) -> Result<(), BusError> {
        if start > end {
            return Err(BusError::InvalidRange { start, end });
        }

        let name = {
            let requested = name.into();
            if requested.is_empty() {
                device.name().to_string()
            } else {
                requested
            }
        };

        if let Some(existing) = self.find_overlapping(start, end) {
            return Err(BusError::Overlap {
                new_name: name,
                new_start: start,
                new_end: end,
                existing_name: existing.name.clone(),
                existing_start: existing.start,
                existing_end: existing.end,
            });
        }

        if self.names.contains_key(&name) {
            return Err(BusError::NameConflict(name));
        }

        let mapping = DeviceMapping {
            device,
            start,
            end,
            name: name.clone(),
            device_offset,
            read_only,
        };

        let insert_at = self
            .mappings
            .partition_point(|m| m.start < mapping.start);
        self.mappings.insert(insert_at, mapping);
        self.reindex_names();
        self.last_hit.set(None);
        Ok(())
    }

    /// Remove the mapping occupying exactly `start..=end`.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Unmapped`] if no mapping has that exact range.
    pub fn unmap_range(&mut self, start: u16, end: u16) -> Result<(), BusError> {
        let idx = self
            .mappings
            .iter()
            .position(|m| m.start == start && m.end == end)
            .ok_or(BusError::Unmapped(start))?;
        let removed = self.mappings.remove(idx);
        self.names.remove(&removed.name);
        self.reindex_names();
        self.last_hit.set(None);
        Ok(())
    }

    /// Remove the mapping registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::NoSuchDevice`] if no mapping has that name.
    pub fn unmap_by_name(&mut self, name: &str) -> Result<(), BusError> {
        let idx = *self
            .names
            .get(name)
            .ok_or_else(|| BusError::NoSuchDevice(name.to_string()))?;
        self.mappings.remove(idx);
        self.names.remove(name);
        self.reindex_names();
        self.last_hit.set(None);
        Ok(())
    }

    /// Binary-search the sorted mapping list (through the last-hit cache)
    /// for the device covering `address`.
    #[must_use]
    pub fn find_device(&self, address: u16) -> Option<&DeviceMapping> {
        self.locate(address).map(|idx| &self.mappings[idx])
    }

    /// Mutable counterpart of [`Self::find_device`].
    pub fn find_device_mut(&mut self, address: u16) -> Option<&mut DeviceMapping> {
        let idx = self.locate(address)?;
        Some(&mut self.mappings[idx])
    }

    /// Look up a mapping by its registered name.
    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<&DeviceMapping> {
        self.names.get(name).map(|&idx| &self.mappings[idx])
    }

    /// Mutable counterpart of [`Self::get_by_name`].
    pub fn get_by_name_mut(&mut self, name: &str) -> Option<&mut DeviceMapping> {
        if let Some(&idx) = self.names.get(name) {
            Some(&mut self.mappings[idx])
        } else {
            None
        }
    }

    /// Read a byte through the mapping at `address`, translating to the
    /// device-local offset. Returns the open-bus default (`0xFF`) if nothing
    /// is mapped there.
    pub fn read(&mut self, address: u16) -> u8 {
        match self.locate(address) {
            Some(idx) => {
                let mapping = &mut self.mappings[idx];
                let offset = mapping.device_address(address);
                mapping.device.read(offset)
            }
            None => 0xFF,
        }
    }

    /// Side-effect-free counterpart of [`Self::read`], for inspectors.
    #[must_use]
    pub fn peek(&self, address: u16) -> u8 {
        match self.find_device(address) {
            Some(mapping) => mapping.device.peek(mapping.device_address(address)),
            None => 0xFF,
        }
    }

    /// Write a byte through the mapping at `address`.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Unmapped`] if nothing is mapped at `address`, or
    /// [`BusError::WriteToReadOnly`] if the mapping is read-only.
    pub fn write(&mut self, address: u16, value: u8) -> Result<(), BusError> {
        match self.locate(address) {
            Some(idx) => {
                let mapping = &mut self.mappings[idx];
                if mapping.read_only {
                    return Err(BusError::WriteToReadOnly(address, mapping.name.clone()));
                }
                let offset = mapping.device_address(address);
                mapping.device.write(offset, value);
                Ok(())
            }
            None => Err(BusError::Unmapped(address)),
        }
    }

    /// All mappings, in ascending address order.
    #[must_use]
    pub fn memory_map(&self) -> impl Iterator<Item = &DeviceMapping> {
        self.mappings.iter()
    }

    /// Contiguous runs of the address space with no mapping.
    #[must_use]
    pub fn unmapped_ranges(&self) -> Vec<UnmappedRange> {
        let mut ranges = Vec::new();
        let mut cursor: u32 = 0x0000;

        for mapping in &self.mappings {
            if cursor < u32::from(mapping.start) {
                ranges.push(UnmappedRange {
                    start: cursor as u16,
                    end: mapping.start - 1,
                });
            }
            cursor = cursor.max(u32::from(mapping.end) + 1);
        }

        if cursor <= 0xFFFF {
            ranges.push(UnmappedRange {
                start: cursor as u16,
                end: 0xFFFF,
            });
        }

        ranges
    }

    /// Re-derive the name→index table and check for internal inconsistency.
    /// Returns a description of each problem found; an empty vec means the
    /// mapper is internally consistent.
    #[must_use]
    pub fn validate_integrity(&self) -> Vec<String> {
        let mut issues = Vec::new();

        for (i, a) in self.mappings.iter().enumerate() {
            for b in &self.mappings[i + 1..] {
                if a.overlaps(b.start, b.end) {
                    issues.push(format!("overlap detected: {:?} and {:?}", a.name, b.name));
                }
            }
        }

        for i in 0..self.mappings.len().saturating_sub(1) {
            if self.mappings[i].start > self.mappings[i + 1].start {
                issues.push("mapping list is not sorted by start address".to_string());
                break;
            }
        }

        issues
    }

    /// Remove every mapping.
    pub fn clear(&mut self) {
        self.mappings.clear();
        self.names.clear();
        self.last_hit.set(None);
    }

    /// Number of mappings currently registered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    /// Whether no mappings are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Sum of every mapping's [`DeviceMapping::size`].
    #[must_use]
    pub fn total_mapped_size(&self) -> u32 {
        self.mappings.iter().map(DeviceMapping::size).sum()
    }

    /// Advance every device by one tick, ordered `Critical` before `High`
    /// before `Normal` before `Low` (stable within a priority tier, so ties
    /// tick in address order). `cycle` is the running master-cycle count.
    pub fn tick_all(&mut self, cycle: u64) {
        let mut order: Vec<usize> = (0..self.mappings.len()).collect();
        order.sort_by_key(|&i| self.mappings[i].priority());
        for idx in order {
            self.mappings[idx].device.tick(cycle);
        }
    }

    /// Reset every mapped device to its power-on state.
    pub fn reset_all(&mut self) {
        for mapping in &mut self.mappings {
            mapping.device.reset();
        }
    }

    /// Names of every device currently asserting an interrupt request.
    #[must_use]
    pub fn pending_irq_sources(&self) -> Vec<String> {
        self.mappings
            .iter()
            .filter(|m| m.device.irq_pending())
            .map(|m| m.name.clone())
            .collect()
    }

    /// Acknowledge the interrupt request from the device named `name`, if
    /// one is mapped under that name.
    pub fn acknowledge_irq(&mut self, name: &str) {
        if let Some(&idx) = self.names.get(name) {
            self.mappings[idx].device.irq_acknowledge();
        }
    }

    fn find_overlapping(&self, start: u16, end: u16) -> Option<&DeviceMapping> {
        self.mappings.iter().find(|m| m.overlaps(start, end))
    }

    fn reindex_names(&mut self) {
        self.names.clear();
        for (idx, mapping) in self.mappings.iter().enumerate() {
            self.names.insert(mapping.name.clone(), idx);
        }
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
    fn map_and_read_round_trips() {
        let mut mapper = DeviceMapper::new();
        mapper
            .map_device(Box::new(Ram(vec![0; 0x800])), 0x0000, 0x07FF, "", 0, false)
            .unwrap();
        mapper.write(0x0010, 0x42).unwrap();
        assert_eq!(mapper.read(0x0010), 0x42);
    }

    #[test]
    fn overlapping_mapping_is_rejected() {
        let mut mapper = DeviceMapper::new();
        mapper
            .map_device(Box::new(Ram(vec![0; 0x100])), 0x0000, 0x00FF, "a", 0, false)
            .unwrap();
        let err = mapper
            .map_device(Box::new(Ram(vec![0; 0x10])), 0x00F0, 0x010F, "b", 0, false)
            .unwrap_err();
        assert!(matches!(err, BusError::Overlap { .. }));
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let mut mapper = DeviceMapper::new();
        mapper
            .map_device(Box::new(Ram(vec![0; 0x10])), 0x0000, 0x000F, "a", 0, false)
            .unwrap();
        let err = mapper
            .map_device(Box::new(Ram(vec![0; 0x10])), 0x1000, 0x100F, "a", 0, false)
            .unwrap_err();
        assert!(matches!(err, BusError::NameConflict(_)));
    }

    #[test]
    fn write_to_read_only_mapping_errors() {
        let mut mapper = DeviceMapper::new();
        mapper
            .map_device(Box::new(Ram(vec![0xEA; 0x10])), 0x8000, 0x800F, "rom", 0, true)
            .unwrap();
        assert_eq!(mapper.read(0x8000), 0xEA);
        assert!(matches!(
            mapper.write(0x8000, 0x00),
            Err(BusError::WriteToReadOnly(0x8000, _))
        ));
    }

    #[test]
    fn unmapped_address_reads_open_bus() {
        let mapper = DeviceMapper::new();
        assert_eq!(mapper.peek(0x4000), 0xFF);
    }

    #[test]
    fn unmapped_ranges_cover_the_gaps() {
        let mut mapper = DeviceMapper::new();
        mapper
            .map_device(Box::new(Ram(vec![0; 0x10])), 0x0010, 0x001F, "", 0, false)
            .unwrap();
        let ranges = mapper.unmapped_ranges();
        assert_eq!(ranges[0], UnmappedRange { start: 0x0000, end: 0x000F });
        assert_eq!(ranges[1], UnmappedRange { start: 0x0020, end: 0xFFFF });
    }

    #[test]
    fn unmap_by_name_frees_the_range() {
        let mut mapper = DeviceMapper::new();
        mapper
            .map_device(Box::new(Ram(vec![0; 0x10])), 0x0000, 0x000F, "a", 0, false)
            .unwrap();
        mapper.unmap_by_name("a").unwrap();
        assert!(mapper.is_empty());
        assert_eq!(mapper.peek(0x0000), 0xFF);
    }

    #[test]
    fn device_offset_translates_addresses() {
        let mut mapper = DeviceMapper::new();
        let mut ram = Ram(vec![0; 0x100]);
        ram.0[0x50] = 0x99;
        mapper
            .map_device(Box::new(ram), 0xC000, 0xC0FF, "ram", 0x40, false)
            .unwrap();
        // system address 0xC010 -> device offset 0x40 + 0x10 = 0x50
        assert_eq!(mapper.read(0xC010), 0x99);
    }

    #[test]
    fn validate_integrity_is_clean_on_well_formed_mapper() {
        let mut mapper = DeviceMapper::new();
        mapper
            .map_device(Box::new(Ram(vec![0; 0x10])), 0x0000, 0x000F, "a", 0, false)
            .unwrap();
        mapper
            .map_device(Box::new(Ram(vec![0; 0x10])), 0x1000, 0x100F, "b", 0, false)
            .unwrap();
        assert!(mapper.validate_integrity().is_empty());
    }
}
