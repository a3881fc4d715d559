//! Entrypoint for CLI
use std::{env, process, time::Instant};

use chip8_vm::{prelude::*, KeyCode};
use log::{debug, error, info};

use self::{clock::FrameClock, error::AppError};

mod clock;
mod error;
mod rom;

static USAGE: &str = r#"
usage: chip8 CMD FILE [OPTIONS]

commands:
    run     Run the target ROM file and print the final screen
    dis     Disassemble the target ROM into readable assembly

options for run:
    --frames N    Number of 60Hz frames to run (default 600)
    --key K       Hold down hexadecimal key K for the whole run
    --seed S      Seed the random number generator
    --fast        Run frames back to back instead of in real time

examples:
    chip8 run maze.ch8 --frames 120 --seed 7
    chip8 dis maze.ch8
"#;

/// Instructions executed between two timer ticks.
const CYCLES_PER_FRAME: usize = 10;
const DEFAULT_FRAMES: u64 = 600;

fn run_bytecode(args: &RunArgs) -> Result<(), AppError> {
    let bytecode = rom::read_rom(&args.filepath)?;

    let mut vm = Chip8Vm::new(Chip8Conf {
        rng_seed: args.seed,
    });
    vm.load_bytecode(bytecode.as_slice())?;
    vm.set_key(args.key);

    if let Some(seed) = vm.config().rng_seed {
        info!("random number generator seeded with {seed}");
    }

    let start = Instant::now();
    let result = run_frames(&mut vm, args);
    info!(
        "time taken: {}ms",
        start.elapsed().as_nanos() as f64 / 1000000.0
    );

    println!("{}", vm.dump_display()?);

    if let Err(err) = result {
        error!("program faulted at {:04X}: {err}", vm.cpu().pc());
        return Err(err.into());
    }

    Ok(())
}

fn run_frames(vm: &mut Chip8Vm, args: &RunArgs) -> Chip8Result<()> {
    let mut clock = FrameClock::new();
    let mut buzzer = false;

    for frame in 0..args.frames {
        for _ in 0..CYCLES_PER_FRAME {
            // A blocked program is retried on the next frame.
            if let Flow::KeyWait = vm.step()? {
                break;
            }
        }

        vm.tick();

        if vm.buzzer() != buzzer {
            buzzer = vm.buzzer();
            debug!("frame {frame}: buzzer {}", if buzzer { "on" } else { "off" });
        }

        if !args.fast {
            clock.wait();
        }
    }

    Ok(())
}

fn run_disassembler(filepath: &str) -> Result<(), AppError> {
    let bytecode = rom::read_rom(filepath)?;

    let mut listing = String::new();
    Disassembler::new(bytecode.as_slice()).disassemble_all(&mut listing)?;
    print!("{listing}");

    Ok(())
}

fn main() {
    if let Err(err) = simple_logger::SimpleLogger::new().env().init() {
        eprintln!("failed to initialise logger: {err}");
    }

    let result = parse_args(env::args().skip(1)).and_then(|cmd| match cmd {
        Cmd::Run(args) => run_bytecode(&args),
        Cmd::Dis { filepath } => run_disassembler(&filepath),
    });

    match result {
        Ok(()) => {}
        Err(err) if err.is_usage() => {
            eprintln!("{}", err.kind);
            print_usage();
            // FreeBSD EX_USAGE (64)
            process::exit(64)
        }
        Err(err) => {
            error!("{err}");
            process::exit(1)
        }
    }
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Cmd, AppError> {
    let cmd = args.next().ok_or_else(|| AppError::usage("missing command"))?;

    match cmd.as_str() {
        "run" => {
            let mut run = RunArgs {
                filepath: consume_arg(&mut args, "FILE")?,
                frames: DEFAULT_FRAMES,
                key: None,
                seed: None,
                fast: false,
            };

            while let Some(flag) = args.next() {
                match flag.as_str() {
                    "--frames" => {
                        let value = consume_arg(&mut args, "--frames")?;
                        run.frames = value
                            .parse()
                            .map_err(|_| AppError::usage(format!("invalid frame count: {value}")))?;
                    }
                    "--key" => {
                        let value = consume_arg(&mut args, "--key")?;
                        run.key = Some(parse_key(&value)?);
                    }
                    "--seed" => {
                        let value = consume_arg(&mut args, "--seed")?;
                        run.seed = Some(
                            value
                                .parse()
                                .map_err(|_| AppError::usage(format!("invalid seed: {value}")))?,
                        );
                    }
                    "--fast" => run.fast = true,
                    _ => return Err(AppError::usage(format!("unknown option: {flag}"))),
                }
            }

            Ok(Cmd::Run(run))
        }
        "dis" => Ok(Cmd::Dis {
            filepath: consume_arg(&mut args, "FILE")?,
        }),
        _ => Err(AppError::usage(format!("unknown command: {cmd}"))),
    }
}

/// Consumes the next argument, failing with a usage error if it doesn't exist.
fn consume_arg(args: &mut impl Iterator<Item = String>, name: &str) -> Result<String, AppError> {
    args.next()
        .ok_or_else(|| AppError::usage(format!("missing value for {name}")))
}

/// Key names are single hexadecimal digits, as on the COSMAC VIP keypad.
fn parse_key(value: &str) -> Result<KeyCode, AppError> {
    let invalid = || AppError::usage(format!("invalid key: {value}"));

    let code = u8::from_str_radix(value, 16).map_err(|_| invalid())?;
    KeyCode::try_from(code).map_err(|_| invalid())
}

fn print_usage() {
    println!("Chip8 v{}", env!("CARGO_PKG_VERSION"));
    println!("{USAGE}");
}

#[derive(Debug)]
enum Cmd {
    /// Run file
    Run(RunArgs),
    /// Disassemble
    Dis { filepath: String },
}

#[derive(Debug)]
struct RunArgs {
    filepath: String,
    frames: u64,
    key: Option<KeyCode>,
    seed: Option<u64>,
    fast: bool,
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::ErrorKind;

    fn args(line: &str) -> impl Iterator<Item = String> + '_ {
        line.split_whitespace().map(String::from)
    }

    #[test]
    fn test_parse_run() {
        match parse_args(args("run maze.ch8 --frames 30 --key a --seed 7 --fast")).unwrap() {
            Cmd::Run(run) => {
                assert_eq!(run.filepath, "maze.ch8");
                assert_eq!(run.frames, 30);
                assert_eq!(run.key, Some(KeyCode::KeyA));
                assert_eq!(run.seed, Some(7));
                assert!(run.fast);
            }
            cmd => panic!("unexpected command {cmd:?}"),
        }
    }

    #[test]
    fn test_parse_run_defaults() {
        match parse_args(args("run maze.ch8")).unwrap() {
            Cmd::Run(run) => {
                assert_eq!(run.frames, DEFAULT_FRAMES);
                assert_eq!(run.key, None);
                assert_eq!(run.seed, None);
                assert!(!run.fast);
            }
            cmd => panic!("unexpected command {cmd:?}"),
        }
    }

    #[test]
    fn test_parse_dis() {
        assert!(matches!(
            parse_args(args("dis maze.ch8")).unwrap(),
            Cmd::Dis { filepath } if filepath == "maze.ch8"
        ));
    }

    #[test]
    fn test_usage_errors() {
        for line in [
            "",
            "asm maze.ch8",
            "run",
            "dis",
            "run maze.ch8 --frames",
            "run maze.ch8 --frames many",
            "run maze.ch8 --key 10",
            "run maze.ch8 --key g",
            "run maze.ch8 --verbose",
        ] {
            let err = parse_args(args(line)).unwrap_err();
            assert!(
                matches!(err.kind, ErrorKind::Usage(_)),
                "expected usage error for {line:?}"
            );
        }
    }
}
