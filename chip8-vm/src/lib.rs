pub mod constants;
mod cpu;
mod devices;
mod disasm;
mod display;
mod error;
mod memory;
pub mod opcode;
mod stack;
mod timer;
mod vm;

pub use self::{
    devices::{InvalidKeyCode, KeyCode},
    error::{Chip8Error, Chip8Result},
};

pub mod prelude {
    pub use super::{
        cpu::Chip8Cpu,
        devices::KeyCode,
        disasm::Disassembler,
        display::DisplayBuffer,
        error::{Chip8Error, Chip8Result},
        memory::Memory,
        stack::CallStack,
        timer::Timers,
        vm::{Chip8Conf, Chip8Vm, Flow},
    };
}
