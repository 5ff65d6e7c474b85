//! Drives the master-cycle clock: ticks the CPU, then devices in priority
//! order, then bridges device interrupt lines into the
//! [`InterruptController`] for the CPU to observe starting next cycle.

use std::collections::HashSet;

use w65c02_cpu::{Cpu, InterruptController};

use crate::bus::AddressSpace;
use crate::error::BusError;

/// Common per-cycle clock rates a host loop can pace real-time execution
/// against via [`crate::ExecutionMode::RealTime`]. A system driven by a
/// different crystal should supply its own `clock_hz` rather than relying on
/// these constants.
pub mod timing {
    /// Typical W65C02S system clock, 1 MHz parts.
    pub const CPU_CLOCK_1MHZ: u64 = 1_000_000;
    /// Typical W65C02S system clock, 2 MHz parts.
    pub const CPU_CLOCK_2MHZ: u64 = 2_000_000;
    /// Typical W65C02S system clock, 4 MHz parts (the W65C02S6 grade).
    pub const CPU_CLOCK_4MHZ: u64 = 4_000_000;
}

/// Drives one master cycle at a time in the order the ordering guarantee in
/// §4.4 requires: CPU tick, then devices in ascending priority, then
/// interrupt-line bridging. Device IRQ lines are polled every cycle and
/// reflected into the [`InterruptController`] as level-triggered sources
/// keyed by device name; because bridging happens *after* the CPU's tick
/// this cycle, a device that asserts during cycle k is only observable to
/// the CPU starting cycle k+1, matching the one-cycle propagation delay the
/// system's ordering contract specifies.
#[derive(Debug, Default)]
pub struct Scheduler {
    interrupts: InterruptController,
    asserted_sources: HashSet<String>,
    cycle_count: u64,
}

impl Scheduler {
    /// Create a scheduler with no interrupts pending.
    #[must_use]
    pub fn new() -> Self {
        Self {
            interrupts: InterruptController::new(),
            asserted_sources: HashSet::new(),
            cycle_count: 0,
        }
    }

    /// The interrupt controller driving CPU arbitration, for callers that
    /// need to assert NMI/RESET directly (device IRQ lines are bridged
    /// automatically by [`Self::tick`]).
    pub fn interrupts_mut(&mut self) -> &mut InterruptController {
        &mut self.interrupts
    }

    /// Read-only access to the interrupt controller.
    #[must_use]
    pub fn interrupts(&self) -> &InterruptController {
        &self.interrupts
    }

    /// Advance the whole system by one master cycle: tick the CPU, tick
    /// every device in priority order, then bridge their IRQ lines into the
    /// controller for next cycle's CPU tick to observe.
    ///
    /// # Errors
    ///
    /// Returns the [`BusError`] latched by [`AddressSpace`] if the CPU's
    /// tick performed a store that faulted (write to an unmapped or
    /// read-only address). The cycle has already been consumed — this
    /// surfaces the fault to the caller rather than undoing it, matching
    /// real hardware's "the bad store already happened" semantics.
    pub fn tick(&mut self, cpu: &mut Cpu, bus: &mut AddressSpace) -> Result<(), BusError> {
        self.cycle_count += 1;
        cpu.tick(bus, &mut self.interrupts);
        if let Some(fault) = bus.take_fault() {
            return Err(fault);
        }
        bus.tick_devices(self.cycle_count);
        self.bridge_device_interrupts(bus);
        Ok(())
    }

    /// Tick repeatedly until the CPU finishes its current instruction (or
    /// interrupt entry) and becomes idle again. Returns cycles consumed.
    ///
    /// Intended for tests and simple host loops; a cycle-paced host should
    /// prefer driving [`Self::tick`] directly once per master clock edge.
    ///
    /// # Errors
    ///
    /// See [`Self::tick`].
    pub fn step(&mut self, cpu: &mut Cpu, bus: &mut AddressSpace) -> Result<u64, BusError> {
        let start = cpu.cycles;
        self.tick(cpu, bus)?;
        while cpu.is_busy() {
            self.tick(cpu, bus)?;
        }
        Ok(cpu.cycles - start)
    }

    /// Run cycles until at least `target_cycles` master cycles have elapsed
    /// since this call began, finishing the in-flight instruction if the
    /// target lands mid-instruction. Returns the actual cycle count reached.
    ///
    /// # Errors
    ///
    /// See [`Self::tick`].
    pub fn run_cycles(
        &mut self,
        cpu: &mut Cpu,
        bus: &mut AddressSpace,
        target_cycles: u64,
    ) -> Result<u64, BusError> {
        let start = cpu.cycles;
        while cpu.cycles - start < target_cycles {
            self.tick(cpu, bus)?;
        }
        while cpu.is_busy() {
            self.tick(cpu, bus)?;
        }
        Ok(cpu.cycles - start)
    }

    /// Reset the CPU and every mapped device to their power-on state.
    pub fn power_on(&mut self, cpu: &mut Cpu, bus: &mut AddressSpace) {
        bus.reset_devices();
        bus.take_fault();
        cpu.reset(bus);
        self.interrupts = InterruptController::new();
        self.asserted_sources.clear();
        self.cycle_count = 0;
    }

    /// Mirror each device's current `irq_pending()` onto the interrupt
    /// controller's level-triggered IRQ sources, asserting newly-pending
    /// devices and deasserting ones that stopped requesting since last
    /// cycle.
    fn bridge_device_interrupts(&mut self, bus: &AddressSpace) {
        let pending: HashSet<String> = bus.mapper().pending_irq_sources().into_iter().collect();

        for name in pending.difference(&self.asserted_sources) {
            let _ = self.interrupts.assert_irq(name);
        }
        for name in self.asserted_sources.difference(&pending) {
            let _ = self.interrupts.deassert_irq(name);
        }

        self.asserted_sources = pending;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{Device, Priority};
    use w65c02_cpu::Bus;

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

    struct Timer {
        countdown: u8,
        fired: bool,
    }

    impl Device for Timer {
        fn read(&mut self, _offset: u16) -> u8 {
            0
        }
        fn write(&mut self, _offset: u16, _value: u8) {}
        fn name(&self) -> &str {
            "timer"
        }
        fn priority(&self) -> Priority {
            Priority::High
        }
        fn tick(&mut self, _cycle: u64) {
            if self.countdown > 0 {
                self.countdown -= 1;
                if self.countdown == 0 {
                    self.fired = true;
                }
            }
        }
        fn irq_pending(&self) -> bool {
            self.fired
        }
        fn irq_acknowledge(&mut self) {
            self.fired = false;
        }
    }

    fn basic_system() -> (Cpu, AddressSpace) {
        let mut bus = AddressSpace::new();
        bus.map(Box::new(Ram(vec![0; 0x10000])), 0x0000, 0xFFFF, "ram", false)
            .unwrap();
        let mut cpu = Cpu::new();
        let mut scheduler = Scheduler::new();
        scheduler.power_on(&mut cpu, &mut bus);
        (cpu, bus)
    }

    #[test]
    fn step_executes_one_full_instruction() {
        let (mut cpu, mut bus) = basic_system();
        bus.write(0x0000, 0xEA); // NOP, RESET vector defaults to 0x0000
        let mut scheduler = Scheduler::new();
        let cycles = scheduler.step(&mut cpu, &mut bus).unwrap();
        assert_eq!(cycles, 2);
        assert_eq!(cpu.pc, 0x0001);
    }

    #[test]
    fn step_surfaces_a_fault_from_a_store_to_a_read_only_mapping() {
        let mut bus = AddressSpace::new();
        bus.map(Box::new(Ram(vec![0; 0x8000])), 0x0000, 0x7FFF, "ram", false)
            .unwrap();
        bus.map(Box::new(Ram(vec![0xEA; 0x10])), 0x8000, 0x800F, "rom", true)
            .unwrap();
        bus.write(0xFFFC, 0x00);
        bus.write(0xFFFD, 0x00);
        bus.write(0x0000, 0x8D); // STA $8000
        bus.write(0x0001, 0x00);
        bus.write(0x0002, 0x80);

        let mut cpu = Cpu::new();
        let mut scheduler = Scheduler::new();
        scheduler.power_on(&mut cpu, &mut bus);

        let err = scheduler.step(&mut cpu, &mut bus).unwrap_err();
        assert!(matches!(err, BusError::WriteToReadOnly(0x8000, _)));
    }

    #[test]
    fn device_irq_reaches_the_cpu_through_the_scheduler() {
        let mut bus = AddressSpace::new();
        bus.map(Box::new(Ram(vec![0; 0x10000])), 0x0000, 0xFFFF, "ram", false)
            .unwrap();
        bus.map(
            Box::new(Timer { countdown: 3, fired: false }),
            0x2000,
            0x2000,
            "timer",
            false,
        )
        .unwrap();
        bus.write(0xFFFE, 0x00);
        bus.write(0xFFFF, 0x90); // IRQ vector -> 0x9000
        bus.write(0x0000, 0x58); // CLI, then NOPs while waiting for the timer
        for i in 1..16 {
            bus.write(i, 0xEA);
        }
        bus.write(0x9000, 0xEA);

        let mut cpu = Cpu::new();
        let mut scheduler = Scheduler::new();
        scheduler.power_on(&mut cpu, &mut bus);

        for _ in 0..16 {
            scheduler.step(&mut cpu, &mut bus).unwrap();
            if cpu.pc == 0x9000 {
                break;
            }
        }
        assert_eq!(cpu.pc, 0x9000);
    }
}
