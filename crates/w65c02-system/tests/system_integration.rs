//! End-to-end scenarios exercising [`System`] as a whole: memory-mapped
//! device interaction, an interrupt traveling from a device through the
//! scheduler to the CPU, and bus error conditions surfacing correctly.

use w65c02_cpu::Bus;
use w65c02_system::{BusError, Device, Priority, System};

struct Ram(Vec<u8>);

impl Device for Ram {
    fn read(&mut self, offset: u16) -> u8 {
        self.0[offset as usize]
    }
    fn write(&mut self, offset: u16, value: u8) {
        self.0[offset as usize] = value;
    }
    fn peek(&self, offset: u16) -> u8 {
        self.0[offset as usize]
    }
    fn name(&self) -> &str {
        "ram"
    }
}

struct Rom(Vec<u8>);

impl Device for Rom {
    fn read(&mut self, offset: u16) -> u8 {
        self.0[offset as usize]
    }
    fn write(&mut self, _offset: u16, _value: u8) {}
    fn peek(&self, offset: u16) -> u8 {
        self.0[offset as usize]
    }
    fn name(&self) -> &str {
        "rom"
    }
}

/// A one-byte "doorbell" register: writing any value asserts IRQ, reading
/// clears it. Stands in for a UART/ACIA-style status-and-clear peripheral.
struct Doorbell {
    rung: bool,
}

impl Device for Doorbell {
    fn read(&mut self, _offset: u16) -> u8 {
        let value = u8::from(self.rung);
        self.rung = false;
        value
    }
    fn write(&mut self, _offset: u16, _value: u8) {
        self.rung = true;
    }
    fn name(&self) -> &str {
        "doorbell"
    }
    fn priority(&self) -> Priority {
        Priority::Critical
    }
    fn irq_pending(&self) -> bool {
        self.rung
    }
    fn irq_acknowledge(&mut self) {
        self.rung = false;
    }
}

fn install_vectors(system: &mut System, reset: u16, irq: u16) {
    let [lo, hi] = reset.to_le_bytes();
    system.bus_mut().write(0xFFFC, lo);
    system.bus_mut().write(0xFFFD, hi);
    let [lo, hi] = irq.to_le_bytes();
    system.bus_mut().write(0xFFFE, lo);
    system.bus_mut().write(0xFFFF, hi);
}

#[test]
fn ram_and_rom_coexist_on_the_bus() {
    let mut system = System::new();
    system
        .map_device(Box::new(Ram(vec![0; 0x8000])), 0x0000, 0x7FFF, "ram", false)
        .unwrap();
    system
        .map_device(Box::new(Rom(vec![0xEA; 0x8000])), 0x8000, 0xFFFF, "rom", true)
        .unwrap();
    install_vectors(&mut system, 0x8000, 0x8000);
    system.power_on();

    system.bus_mut().write(0x0010, 0x55);
    assert_eq!(system.bus_mut().read(0x0010), 0x55);
    assert_eq!(system.bus_mut().read(0x8000), 0xEA);
}

#[test]
fn writing_to_rom_is_rejected() {
    let mut system = System::new();
    system
        .map_device(Box::new(Rom(vec![0xEA; 0x10])), 0x8000, 0x800F, "rom", true)
        .unwrap();
    let err = system.bus_mut().mapper_mut().write(0x8000, 0x00);
    assert!(matches!(err, Err(BusError::WriteToReadOnly(0x8000, _))));
}

#[test]
fn a_store_to_rom_during_step_surfaces_as_a_bus_error() {
    let mut system = System::new();
    system
        .map_device(Box::new(Ram(vec![0; 0x8000])), 0x0000, 0x7FFF, "ram", false)
        .unwrap();
    system
        .map_device(Box::new(Rom(vec![0xEA; 0x10])), 0x8000, 0x800F, "rom", true)
        .unwrap();
    install_vectors(&mut system, 0x0000, 0x0000);
    system.bus_mut().write(0x0000, 0x8D); // STA $8000
    system.bus_mut().write(0x0001, 0x00);
    system.bus_mut().write(0x0002, 0x80);
    system.power_on();

    let err = system.step().unwrap_err();
    assert!(matches!(err, BusError::WriteToReadOnly(0x8000, _)));
}

#[test]
fn overlapping_device_mapping_is_rejected() {
    let mut system = System::new();
    system
        .map_device(Box::new(Ram(vec![0; 0x100])), 0x0000, 0x00FF, "a", false)
        .unwrap();
    let err = system.map_device(Box::new(Ram(vec![0; 0x10])), 0x00F0, 0x00FF, "b", false);
    assert!(matches!(err, Err(BusError::Overlap { .. })));
}

#[test]
fn device_interrupt_is_serviced_end_to_end() {
    let mut system = System::new();
    system
        .map_device(Box::new(Ram(vec![0; 0x10000])), 0x0000, 0xFFFF, "ram", false)
        .unwrap();
    system
        .map_device(Box::new(Doorbell { rung: false }), 0x3000, 0x3000, "doorbell", false)
        .unwrap();
    install_vectors(&mut system, 0x8000, 0x9000);

    // CLI then spin on NOP, waiting for the doorbell's IRQ.
    let main_loop = [0x58, 0xEA, 0x80, 0xFC]; // CLI / NOP / BRA -4
    for (i, b) in main_loop.iter().enumerate() {
        system.bus_mut().write(0x8000 + i as u16, *b);
    }
    // IRQ handler: bump a sentinel in zero page, then RTI.
    system.bus_mut().write(0x9000, 0xE6); // INC $00
    system.bus_mut().write(0x9001, 0x00);
    system.bus_mut().write(0x9002, 0x40); // RTI

    system.power_on();
    system.bus_mut().write(0x3000, 0x01); // ring the doorbell

    for _ in 0..64 {
        system.step().unwrap();
        if system.bus().mapper().peek(0x0000) == 1 {
            break;
        }
    }

    assert_eq!(system.bus().mapper().peek(0x0000), 1);
}

#[test]
fn reset_returns_every_register_to_its_power_on_state() {
    let mut system = System::new();
    system
        .map_device(Box::new(Ram(vec![0; 0x10000])), 0x0000, 0xFFFF, "ram", false)
        .unwrap();
    install_vectors(&mut system, 0x8000, 0x8000);
    system.bus_mut().write(0x8000, 0xA9); // LDA #$FF
    system.bus_mut().write(0x8001, 0xFF);

    system.power_on();
    system.step().unwrap();
    assert_eq!(system.cpu().a, 0xFF);

    system.assert_reset();
    system.step().unwrap();
    assert_eq!(system.cpu().pc, 0x8000);
}
