use criterion::{black_box, criterion_group, criterion_main, Criterion};

use chip8_vm::prelude::*;

fn criterion_benchmark(c: &mut Criterion) {
    {
        let mut vm = Chip8Vm::new(Chip8Conf { rng_seed: Some(0) });
        let rom = include_bytes!("../programs/maze.ch8");

        c.bench_function("maze bytecode", |b| {
            b.iter(|| {
                vm.load_bytecode(rom).unwrap();
                let step_count = black_box(1000_usize);
                black_box(vm.run_steps(step_count))
            })
        });
    }

    {
        let rom = include_bytes!("../programs/maze.ch8");

        c.bench_function("maze disassembly", |b| {
            b.iter(|| {
                let mut buf = String::new();
                Disassembler::new(black_box(rom))
                    .disassemble_all(&mut buf)
                    .unwrap();
                buf
            })
        });
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
