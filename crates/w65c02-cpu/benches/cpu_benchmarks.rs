//! Throughput benchmarks for a representative instruction mix.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use w65c02_cpu::{Bus, Cpu, InterruptController};

struct FlatBus(Vec<u8>);

impl FlatBus {
    fn new() -> Self {
        FlatBus(vec![0; 0x1_0000])
    }
}

impl Bus for FlatBus {
    fn read(&mut self, addr: u16) -> u8 {
        self.0[addr as usize]
    }
    fn write(&mut self, addr: u16, value: u8) {
        self.0[addr as usize] = value;
    }
    fn peek(&self, addr: u16) -> u8 {
        self.0[addr as usize]
    }
}

/// LDA/STA/ADC/branch loop exercising immediate, zero-page, and relative
/// addressing: a representative small-program mix rather than a single
/// instruction in isolation.
fn program() -> FlatBus {
    let mut bus = FlatBus::new();
    bus.write_word(w65c02_cpu::vectors::RESET, 0x0200);
    let code = [
        0xA9, 0x00, // LDA #$00
        0x18, //       CLC
        0x69, 0x01, // ADC #$01
        0x85, 0x10, // STA $10
        0xC9, 0xFF, // CMP #$FF
        0xD0, 0xF5, // BNE -11 (back to ADC)
    ];
    for (i, b) in code.iter().enumerate() {
        bus.write(0x0200 + i as u16, *b);
    }
    bus
}

fn bench_instruction_mix(c: &mut Criterion) {
    c.bench_function("cpu_instruction_mix_1000_steps", |b| {
        b.iter(|| {
            let mut bus = program();
            let mut cpu = Cpu::new();
            cpu.reset(&mut bus);
            let mut interrupts = InterruptController::new();
            for _ in 0..1000 {
                black_box(cpu.step(&mut bus, &mut interrupts));
            }
        });
    });
}

criterion_group!(benches, bench_instruction_mix);
criterion_main!(benches);
