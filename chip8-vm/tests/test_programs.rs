use chip8_vm::{constants::*, prelude::*, KeyCode};

const MAZE: &[u8] = include_bytes!("../programs/maze.ch8");

fn vm_with(words: &[u16]) -> Chip8Vm {
    let mut vm = Chip8Vm::new(Chip8Conf { rng_seed: Some(42) });
    vm.load_words(words).unwrap();
    vm
}

#[test]
fn test_maze_runs_to_completion() {
    let mut vm = Chip8Vm::new(Chip8Conf { rng_seed: Some(1) });
    vm.load_bytecode(MAZE).unwrap();

    vm.run_steps(2000).unwrap();

    // The program parks itself in an infinite jump once the maze is drawn.
    assert_eq!(vm.cpu().pc(), 0x218);
    assert_eq!(vm.step().unwrap(), Flow::Jump);
    assert_eq!(vm.cpu().pc(), 0x218);

    // 16 by 8 cells, each a 4 pixel diagonal that never overlaps another.
    assert_eq!(vm.display_buffer().lit_count(), 16 * 8 * 4);
    assert_eq!(vm.cpu().register(0xF), 0);
}

#[test]
fn test_maze_is_reproducible_with_seed() {
    let mut a = Chip8Vm::new(Chip8Conf { rng_seed: Some(99) });
    let mut b = Chip8Vm::new(Chip8Conf { rng_seed: Some(99) });
    a.load_bytecode(MAZE).unwrap();
    b.load_bytecode(MAZE).unwrap();
    a.run_steps(2000).unwrap();
    b.run_steps(2000).unwrap();

    assert_eq!(a.dump_display().unwrap(), b.dump_display().unwrap());
}

#[test]
fn test_load_words_layout() {
    let vm = vm_with(&[0x1333, 0x1FC2]);
    let memory = vm.cpu().memory();

    assert_eq!(memory.slice(0, FONTSET_DATA_LENGTH).unwrap(), &FONTSET[..]);
    assert_eq!(memory.read(MEM_START).unwrap(), 0x13);
    assert_eq!(memory.read(MEM_START + 1).unwrap(), 0x33);
    assert_eq!(memory.read(MEM_START + 2).unwrap(), 0x1F);
    assert_eq!(memory.read(MEM_START + 3).unwrap(), 0xC2);
}

#[test]
fn test_scenario_jump() {
    let mut vm = vm_with(&[0x1333]);
    vm.step().unwrap();
    assert_eq!(vm.cpu().pc(), 0x333);
}

#[test]
fn test_scenario_call() {
    let mut vm = vm_with(&[0x2123]);
    let pc0 = vm.cpu().pc();
    vm.step().unwrap();

    assert_eq!(vm.cpu().stack().pointer(), Some(0));
    assert_eq!(vm.cpu().stack().top(), Some(pc0 + 2));
    assert_eq!(vm.cpu().pc(), 0x123);
}

#[test]
fn test_scenario_return() {
    let mut vm = vm_with(&[0x00EE]);
    vm.cpu_mut().stack_mut().set_state(Some(1), &[0x0, 0x9]);
    vm.step().unwrap();

    assert_eq!(vm.cpu().pc(), 0x9);
    assert_eq!(vm.cpu().stack().pointer(), Some(0));
}

#[test]
fn test_scenario_add_with_carry() {
    let mut vm = vm_with(&[0x8A14]);
    vm.cpu_mut().set_register(0xA, 0xFF);
    vm.cpu_mut().set_register(0x1, 0xFF);
    vm.step().unwrap();

    assert_eq!(vm.cpu().register(0xA), 0xFE);
    assert_eq!(vm.cpu().register(0xF), 1);
}

#[test]
fn test_scenario_draw() {
    let mut vm = vm_with(&[0xD123]);
    vm.cpu_mut().set_index(0x300);
    vm.cpu_mut()
        .memory_mut()
        .write_slice(0x300, &[0xFF, 0xFF, 0xFF])
        .unwrap();
    vm.step().unwrap();

    let display = vm.display_buffer();
    for y in 0..3 {
        for x in 0..8 {
            assert!(display.pixel(x, y));
        }
    }
    assert_eq!(vm.cpu().register(0xF), 0);
}

#[test]
fn test_scenario_bcd() {
    let mut vm = vm_with(&[0xFA33]);
    vm.cpu_mut().set_register(0xA, 0x7B);
    vm.cpu_mut().set_index(0x400);
    vm.step().unwrap();

    assert_eq!(vm.cpu().memory().slice(0x400, 3).unwrap(), &[1, 2, 3]);
}

#[test]
#[rustfmt::skip]
fn test_countdown_loop() {
    // Set the delay timer, then spin until it reaches zero.
    let mut vm = vm_with(&[
        0x6005, // 200: LD V0, 05
        0xF015, // 202: LD DT, V0
        0xF107, // 204: LD V1, DT
        0x3100, // 206: SE V1, 00
        0x1204, // 208: JP 204
        0x120A, // 20A: JP 20A
    ]);

    vm.run_steps(2).unwrap();
    for _ in 0..5 {
        vm.run_steps(3).unwrap();
        assert_eq!(vm.cpu().pc(), 0x204);
        vm.tick();
    }

    vm.run_steps(3).unwrap();
    assert_eq!(vm.cpu().pc(), 0x20A);
    assert_eq!(vm.delay_timer(), 0);
}

#[test]
#[rustfmt::skip]
fn test_wait_for_key_then_draw_glyph() {
    let mut vm = vm_with(&[
        0xF00A, // 200: LD V0, K
        0xF029, // 202: LD F, V0
        0xD115, // 204: DRW V1, V1, 5
    ]);

    assert_eq!(vm.step().unwrap(), Flow::KeyWait);
    assert_eq!(vm.step().unwrap(), Flow::KeyWait);
    assert_eq!(vm.cpu().pc(), 0x200);

    vm.set_key(Some(KeyCode::Key8));
    vm.run_steps(2).unwrap();
    assert_eq!(vm.cpu().index(), 8 * 5);
    assert_eq!(vm.step().unwrap(), Flow::Draw);

    let mut screen = String::new();
    for row in vm.display_buffer().rows().take(5) {
        let line: String = row[..4].iter().map(|px| if *px { '#' } else { '.' }).collect();
        screen.push_str(&line);
        screen.push('\n');
    }
    assert_eq!(screen, "####\n#..#\n####\n#..#\n####\n");
}

#[test]
fn test_errors_are_fatal_and_preserve_state() {
    let mut vm = vm_with(&[0x0123]);
    let err = vm.step().unwrap_err();
    assert!(matches!(err, Chip8Error::UnknownOpcode { opcode: 0x0123 }));
    assert_eq!(vm.cpu().pc(), 0x200);

    // Retrying hits the same fault.
    assert!(vm.step().is_err());
}

#[test]
fn test_fetch_past_end_of_memory() {
    let mut vm = vm_with(&[0x1200]);
    vm.cpu_mut().set_pc(0xFFF);

    assert!(matches!(
        vm.step(),
        Err(Chip8Error::MemoryOverflow {
            address: 0xFFF,
            len: 2
        })
    ));
    assert_eq!(vm.cpu().pc(), 0xFFF);

    vm.cpu_mut().set_pc(0x200);
    assert_eq!(vm.step().unwrap(), Flow::Jump);
}

#[test]
fn test_buzzer_follows_sound_timer() {
    let mut vm = vm_with(&[0x1200]);
    assert!(!vm.buzzer());

    vm.cpu_mut().timers_mut().sound = 2;
    assert!(vm.buzzer());

    vm.tick();
    assert!(vm.buzzer());
    vm.tick();
    assert!(!vm.buzzer());
    assert_eq!(vm.sound_timer(), 0);
}

#[test]
fn test_run_steps_stops_at_error() {
    let mut vm = vm_with(&[0x6001, 0x00EE, 0x6002]);
    assert!(matches!(vm.run_steps(3), Err(Chip8Error::StackUnderflow)));
    assert_eq!(vm.cpu().register(0), 1);
    assert_eq!(vm.cpu().pc(), 0x202);
}

#[test]
fn test_disassemble_maze() {
    let mut buf = String::new();
    Disassembler::new(MAZE).disassemble_all(&mut buf).unwrap();

    let lines: Vec<&str> = buf.lines().collect();
    assert_eq!(lines.len(), MAZE.len() / 2);
    assert_eq!(lines[0], "0200: A21E  LD I, 21E");
    assert_eq!(lines[4], "0208: D014  DRW V0, V1, 4");
    assert_eq!(lines[12], "0218: 1218  JP 218");
}
