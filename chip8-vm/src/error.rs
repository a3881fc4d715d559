//! Result and errors.
use std::fmt::{self, Display, Formatter};

use crate::constants::MAX_PROGRAM_SIZE;

pub type Chip8Result<T> = std::result::Result<T, Chip8Error>;

/// Faults raised by the virtual machine.
///
/// None of these are recovered from internally. The instruction that raised
/// the error leaves the machine state untouched, and the driver decides
/// whether to halt, reset or report.
#[derive(Debug)]
pub enum Chip8Error {
    /// Subroutine call with all 16 stack slots in use.
    StackOverflow,
    /// Subroutine return with an empty call stack.
    StackUnderflow,
    /// The instruction word does not match any entry in the opcode table.
    UnknownOpcode { opcode: u16 },
    /// Memory access would read or write past address `0xFFF`.
    MemoryOverflow { address: usize, len: usize },
    /// Attempt to load a bytecode program that can't fit in memory.
    LargeProgram { size: usize },
    Fmt(fmt::Error),
}

impl Display for Chip8Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::StackOverflow => write!(f, "call stack overflow"),
            Self::StackUnderflow => write!(f, "call stack underflow"),
            Self::UnknownOpcode { opcode } => write!(
                f,
                "unknown opcode {:04X} (payload {:03X})",
                opcode,
                opcode & 0x0FFF
            ),
            Self::MemoryOverflow { address, len } => write!(
                f,
                "memory overflow: {len} byte access at {address:04X} exceeds address space"
            ),
            Self::LargeProgram { size } => write!(
                f,
                "program too large for VM memory: {size} bytes, maximum is {MAX_PROGRAM_SIZE}"
            ),
            Self::Fmt(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for Chip8Error {}

impl From<fmt::Error> for Chip8Error {
    fn from(err: fmt::Error) -> Self {
        Chip8Error::Fmt(err)
    }
}
