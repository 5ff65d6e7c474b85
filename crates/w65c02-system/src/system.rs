//! [`System`]: the top-level orchestrator tying a [`Cpu`], an
//! [`AddressSpace`], and a [`Scheduler`] together into one runnable machine.

use w65c02_cpu::Cpu;

use crate::bus::AddressSpace;
use crate::device::Device;
use crate::error::BusError;
use crate::scheduler::Scheduler;

/// A complete, runnable W65C02S-based machine: CPU core, device-mapped
/// address space, and the scheduler that bridges device interrupts into the
/// CPU each cycle.
///
/// `System` owns no pacing policy of its own beyond what
/// [`crate::config::SystemConfig::execution_mode`] records for the host to
/// read back — cycle-accurate emulation means the host drives [`System::tick`]
/// or [`System::step`] as often as its own clock demands, not the other way
/// around.
pub struct System {
    cpu: Cpu,
    bus: AddressSpace,
    scheduler: Scheduler,
}

impl System {
    /// Build an empty system: no devices mapped, CPU in its post-construction
    /// (not yet reset) state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cpu: Cpu::new(),
            bus: AddressSpace::new(),
            scheduler: Scheduler::new(),
        }
    }

    /// Map a device onto the address space before power-on.
    ///
    /// # Errors
    ///
    /// See [`AddressSpace::map`].
    pub fn map_device(
        &mut self,
        device: Box<dyn Device>,
        start: u16,
        end: u16,
        name: impl Into<String>,
        read_only: bool,
    ) -> Result<(), BusError> {
        self.bus.map(device, start, end, name, read_only)
    }

    /// Reset the CPU and every mapped device to their power-on state and
    /// load `PC` from the reset vector. Must be called at least once before
    /// [`Self::tick`]/[`Self::step`] produce meaningful execution.
    pub fn power_on(&mut self) {
        self.scheduler.power_on(&mut self.cpu, &mut self.bus);
    }

    /// Advance the whole machine by exactly one master cycle.
    ///
    /// # Errors
    ///
    /// Returns a [`BusError`] if this cycle's CPU store faulted (a write to
    /// an unmapped or read-only address); see [`Scheduler::tick`].
    pub fn tick(&mut self) -> Result<(), BusError> {
        self.scheduler.tick(&mut self.cpu, &mut self.bus)
    }

    /// Run until the CPU completes its current instruction (or interrupt
    /// entry) and goes idle. Returns cycles consumed.
    ///
    /// # Errors
    ///
    /// See [`Self::tick`].
    pub fn step(&mut self) -> Result<u64, BusError> {
        self.scheduler.step(&mut self.cpu, &mut self.bus)
    }

    /// Run at least `cycles` master cycles, finishing the in-flight
    /// instruction if the target falls mid-instruction. Returns the actual
    /// number of cycles elapsed.
    ///
    /// # Errors
    ///
    /// See [`Self::tick`].
    pub fn run_cycles(&mut self, cycles: u64) -> Result<u64, BusError> {
        self.scheduler.run_cycles(&mut self.cpu, &mut self.bus, cycles)
    }

    /// Assert the NMI line for one edge.
    pub fn assert_nmi(&mut self) {
        self.scheduler.interrupts_mut().assert_nmi();
    }

    /// Drive the NMI line low, re-arming edge detection.
    pub fn deassert_nmi(&mut self) {
        self.scheduler.interrupts_mut().deassert_nmi();
    }

    /// Assert the RESET line; the CPU services it on its next idle cycle.
    pub fn assert_reset(&mut self) {
        self.scheduler.interrupts_mut().assert_reset();
    }

    /// Deassert RESET.
    pub fn deassert_reset(&mut self) {
        self.scheduler.interrupts_mut().deassert_reset();
    }

    /// Read-only access to the CPU, for inspection.
    #[must_use]
    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    /// Read-only access to the address space, for inspection.
    #[must_use]
    pub fn bus(&self) -> &AddressSpace {
        &self.bus
    }

    /// Mutable access to the address space, for pre-power-on setup or
    /// out-of-band device pokes (e.g. a debugger writing memory directly).
    pub fn bus_mut(&mut self) -> &mut AddressSpace {
        &mut self.bus
    }

    /// Read-only access to the scheduler, for [`crate::inspector::Inspector`].
    #[must_use]
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }
}

impl Default for System {
    fn default() -> Self {
        Self::new()
    }
}
