//! Read-only introspection of a running [`crate::System`]: register file,
//! memory map, interrupt state, and a breakpoint set, for debuggers and test
//! harnesses that need to look without perturbing execution.

use std::collections::HashSet;

use w65c02_cpu::{Cpu, InterruptKind, RunState, Status};

use crate::bus::AddressSpace;
use crate::mapping::UnmappedRange;

/// Snapshot of the CPU's architectural register file, suitable for display
/// in a debugger without holding a borrow on the live [`Cpu`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterSnapshot {
    /// Accumulator.
    pub a: u8,
    /// X index register.
    pub x: u8,
    /// Y index register.
    pub y: u8,
    /// Stack pointer.
    pub sp: u8,
    /// Program counter.
    pub pc: u16,
    /// Processor status flags.
    pub status: Status,
    /// Total master cycles elapsed since construction or last reset.
    pub cycles: u64,
    /// Current run state (running / WAI-suspended / STP-halted).
    pub run_state: RunState,
}

impl RegisterSnapshot {
    /// Capture the current state of `cpu`.
    #[must_use]
    pub fn capture(cpu: &Cpu) -> Self {
        Self {
            a: cpu.a,
            x: cpu.x,
            y: cpu.y,
            sp: cpu.sp,
            pc: cpu.pc,
            status: cpu.status,
            cycles: cpu.cycles,
            run_state: cpu.state,
        }
    }
}

/// One entry in an [`Inspector::memory_map`] listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryMapEntry {
    /// Mapping name.
    pub name: String,
    /// First address.
    pub start: u16,
    /// Last address (inclusive).
    pub end: u16,
    /// Whether the mapping rejects writes.
    pub read_only: bool,
}

/// A read-only view over a CPU and bus pair, plus a breakpoint set the host
/// loop can consult before or after each instruction boundary.
#[derive(Default)]
pub struct Inspector {
    breakpoints: HashSet<u16>,
}

impl Inspector {
    /// Create an inspector with no breakpoints set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a breakpoint at `address`.
    pub fn add_breakpoint(&mut self, address: u16) {
        self.breakpoints.insert(address);
    }

    /// Remove a previously-registered breakpoint.
    pub fn remove_breakpoint(&mut self, address: u16) {
        self.breakpoints.remove(&address);
    }

    /// Whether `address` currently has a breakpoint set.
    #[must_use]
    pub fn has_breakpoint(&self, address: u16) -> bool {
        self.breakpoints.contains(&address)
    }

    /// Whether `cpu`'s current PC sits on a registered breakpoint.
    #[must_use]
    pub fn at_breakpoint(&self, cpu: &Cpu) -> bool {
        !cpu.is_busy() && self.breakpoints.contains(&cpu.pc)
    }

    /// Every registered breakpoint address.
    pub fn breakpoints(&self) -> impl Iterator<Item = u16> + '_ {
        self.breakpoints.iter().copied()
    }

    /// Capture the CPU's register file.
    #[must_use]
    pub fn registers(cpu: &Cpu) -> RegisterSnapshot {
        RegisterSnapshot::capture(cpu)
    }

    /// Current device map, in ascending address order.
    #[must_use]
    pub fn memory_map(bus: &AddressSpace) -> Vec<MemoryMapEntry> {
        bus.mapper()
            .memory_map()
            .map(|m| MemoryMapEntry {
                name: m.name().to_string(),
                start: m.start(),
                end: m.end(),
                read_only: m.is_read_only(),
            })
            .collect()
    }

    /// Address ranges with no device mapped.
    #[must_use]
    pub fn unmapped_ranges(bus: &AddressSpace) -> Vec<UnmappedRange> {
        bus.unmapped_ranges()
    }

    /// Which interrupt, if any, is currently between entry and its matching
    /// `RTI`.
    #[must_use]
    pub fn servicing(scheduler: &crate::scheduler::Scheduler) -> Option<InterruptKind> {
        scheduler.interrupts().servicing()
    }

    /// Whether any interrupt line is currently pending for `cpu`, taking its
    /// own `P.I` mask into account — useful for telling a `WAI`-suspended
    /// CPU that is genuinely stuck apart from one that is about to wake up.
    #[must_use]
    pub fn interrupt_pending(cpu: &Cpu, scheduler: &crate::scheduler::Scheduler) -> bool {
        scheduler.interrupts().is_pending(!cpu.status.contains(Status::I))
    }

    /// Names of devices currently asserting IRQ.
    #[must_use]
    pub fn pending_irq_sources(bus: &AddressSpace) -> Vec<String> {
        bus.mapper().pending_irq_sources()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::Device;

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
    fn register_snapshot_reflects_cpu_state() {
        let mut cpu = Cpu::new();
        cpu.a = 0x42;
        let snap = Inspector::registers(&cpu);
        assert_eq!(snap.a, 0x42);
    }

    #[test]
    fn interrupt_pending_respects_the_i_flag() {
        let mut cpu = Cpu::new();
        let mut scheduler = crate::scheduler::Scheduler::new();
        scheduler.interrupts_mut().assert_irq("dev").unwrap();

        cpu.status.insert(Status::I);
        assert!(!Inspector::interrupt_pending(&cpu, &scheduler));

        cpu.status.remove(Status::I);
        assert!(Inspector::interrupt_pending(&cpu, &scheduler));
    }

    #[test]
    fn breakpoints_round_trip() {
        let mut inspector = Inspector::new();
        inspector.add_breakpoint(0x8000);
        assert!(inspector.has_breakpoint(0x8000));
        inspector.remove_breakpoint(0x8000);
        assert!(!inspector.has_breakpoint(0x8000));
    }

    #[test]
    fn memory_map_lists_mapped_devices() {
        let mut bus = AddressSpace::new();
        bus.map(Box::new(Ram(vec![0; 0x100])), 0x0000, 0x00FF, "ram", false)
            .unwrap();
        let map = Inspector::memory_map(&bus);
        assert_eq!(map.len(), 1);
        assert_eq!(map[0].name, "ram");
    }
}
