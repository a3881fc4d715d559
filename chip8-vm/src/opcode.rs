//! Instruction decoder.
//!
//! Instructions are identified by matching the 16-bit word against a static
//! table of `(mask, pattern)` pairs. The table is built so that every word
//! matches at most one entry; the specific `8XY_`, `EX__` and `FX__` forms all
//! include their low nibble or low byte in the mask.
use std::fmt::{self, Display, Formatter, Write};

use crate::error::{Chip8Error, Chip8Result};

/// Identity of an instruction in the opcode table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpId {
    Cls,
    Ret,
    Jump,
    Call,
    SkipEqByte,
    SkipNeByte,
    SkipEqReg,
    LoadByte,
    AddByte,
    LoadReg,
    Or,
    And,
    Xor,
    AddReg,
    Sub,
    ShiftRight,
    SubN,
    ShiftLeft,
    SkipNeReg,
    LoadIndex,
    JumpOffset,
    Random,
    Draw,
    SkipKey,
    SkipNotKey,
    LoadDelay,
    WaitKey,
    SetDelay,
    SetSound,
    AddIndex,
    LoadFont,
    StoreBcd,
    StoreRegs,
    LoadRegs,
}

/// Kind of value an operand field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    /// 4-bit register index in the second nibble.
    X,
    /// 4-bit register index in the third nibble.
    Y,
    /// 4-bit count in the lowest nibble.
    N,
    /// 8-bit immediate in the lowest byte.
    NN,
    /// 12-bit address.
    NNN,
}

/// Location of an operand field within the instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operand {
    pub kind: OperandKind,
    pub mask: u16,
    pub shift: u8,
}

impl Operand {
    #[inline(always)]
    pub const fn extract(&self, opcode: u16) -> u16 {
        (opcode & self.mask) >> self.shift
    }
}

const X: Operand = Operand {
    kind: OperandKind::X,
    mask: 0x0F00,
    shift: 8,
};
const Y: Operand = Operand {
    kind: OperandKind::Y,
    mask: 0x00F0,
    shift: 4,
};
const N: Operand = Operand {
    kind: OperandKind::N,
    mask: 0x000F,
    shift: 0,
};
const NN: Operand = Operand {
    kind: OperandKind::NN,
    mask: 0x00FF,
    shift: 0,
};
const NNN: Operand = Operand {
    kind: OperandKind::NNN,
    mask: 0x0FFF,
    shift: 0,
};

/// Entry in the opcode table.
#[derive(Debug)]
pub struct OpcodeDef {
    pub id: OpId,
    /// Canonical pattern name, eg. `8XY4`.
    pub name: &'static str,
    pub pattern: u16,
    pub mask: u16,
    /// Operand fields, in the order the instruction consumes them.
    pub operands: &'static [Operand],
    /// Assembly syntax with operand placeholders.
    pub syntax: &'static str,
}

impl OpcodeDef {
    #[inline(always)]
    pub fn matches(&self, opcode: u16) -> bool {
        opcode & self.mask == self.pattern
    }
}

macro_rules! op {
    ($id:ident, $name:literal, $pattern:literal, $mask:literal, [$($operand:ident),*], $syntax:literal) => {
        OpcodeDef {
            id: OpId::$id,
            name: $name,
            pattern: $pattern,
            mask: $mask,
            operands: &[$($operand),*],
            syntax: $syntax,
        }
    };
}

/// Ordered opcode table.
#[rustfmt::skip]
pub static OPCODE_TABLE: [OpcodeDef; 34] = [
    op!(Cls,        "00E0", 0x00E0, 0xFFFF, [],           "CLS"),
    op!(Ret,        "00EE", 0x00EE, 0xFFFF, [],           "RET"),
    op!(Jump,       "1NNN", 0x1000, 0xF000, [NNN],        "JP {nnn}"),
    op!(Call,       "2NNN", 0x2000, 0xF000, [NNN],        "CALL {nnn}"),
    op!(SkipEqByte, "3XNN", 0x3000, 0xF000, [X, NN],      "SE V{x}, {nn}"),
    op!(SkipNeByte, "4XNN", 0x4000, 0xF000, [X, NN],      "SNE V{x}, {nn}"),
    op!(SkipEqReg,  "5XY0", 0x5000, 0xF00F, [X, Y],       "SE V{x}, V{y}"),
    op!(LoadByte,   "6XNN", 0x6000, 0xF000, [X, NN],      "LD V{x}, {nn}"),
    op!(AddByte,    "7XNN", 0x7000, 0xF000, [X, NN],      "ADD V{x}, {nn}"),
    op!(LoadReg,    "8XY0", 0x8000, 0xF00F, [X, Y],       "LD V{x}, V{y}"),
    op!(Or,         "8XY1", 0x8001, 0xF00F, [X, Y],       "OR V{x}, V{y}"),
    op!(And,        "8XY2", 0x8002, 0xF00F, [X, Y],       "AND V{x}, V{y}"),
    op!(Xor,        "8XY3", 0x8003, 0xF00F, [X, Y],       "XOR V{x}, V{y}"),
    op!(AddReg,     "8XY4", 0x8004, 0xF00F, [X, Y],       "ADD V{x}, V{y}"),
    op!(Sub,        "8XY5", 0x8005, 0xF00F, [X, Y],       "SUB V{x}, V{y}"),
    op!(ShiftRight, "8XY6", 0x8006, 0xF00F, [X, Y],       "SHR V{x}"),
    op!(SubN,       "8XY7", 0x8007, 0xF00F, [X, Y],       "SUBN V{x}, V{y}"),
    op!(ShiftLeft,  "8XYE", 0x800E, 0xF00F, [X, Y],       "SHL V{x}"),
    op!(SkipNeReg,  "9XY0", 0x9000, 0xF00F, [X, Y],       "SNE V{x}, V{y}"),
    op!(LoadIndex,  "ANNN", 0xA000, 0xF000, [NNN],        "LD I, {nnn}"),
    op!(JumpOffset, "BNNN", 0xB000, 0xF000, [NNN],        "JP V0, {nnn}"),
    op!(Random,     "CXNN", 0xC000, 0xF000, [X, NN],      "RND V{x}, {nn}"),
    op!(Draw,       "DXYN", 0xD000, 0xF000, [X, Y, N],    "DRW V{x}, V{y}, {n}"),
    op!(SkipKey,    "EX9E", 0xE09E, 0xF0FF, [X],          "SKP V{x}"),
    op!(SkipNotKey, "EXA1", 0xE0A1, 0xF0FF, [X],          "SKNP V{x}"),
    op!(LoadDelay,  "FX07", 0xF007, 0xF0FF, [X],          "LD V{x}, DT"),
    op!(WaitKey,    "FX0A", 0xF00A, 0xF0FF, [X],          "LD V{x}, K"),
    op!(SetDelay,   "FX15", 0xF015, 0xF0FF, [X],          "LD DT, V{x}"),
    op!(SetSound,   "FX18", 0xF018, 0xF0FF, [X],          "LD ST, V{x}"),
    op!(AddIndex,   "FX1E", 0xF01E, 0xF0FF, [X],          "ADD I, V{x}"),
    op!(LoadFont,   "FX29", 0xF029, 0xF0FF, [X],          "LD F, V{x}"),
    op!(StoreBcd,   "FX33", 0xF033, 0xF0FF, [X],          "LD B, V{x}"),
    op!(StoreRegs,  "FX55", 0xF055, 0xF0FF, [X],          "LD [I], V{x}"),
    op!(LoadRegs,   "FX65", 0xF065, 0xF0FF, [X],          "LD V{x}, [I]"),
];

/// Most operands any instruction declares.
const MAX_OPERANDS: usize = 3;

/// A decoded instruction word with its extracted operands.
#[derive(Debug, Clone, Copy)]
pub struct Instruction {
    pub opcode: u16,
    pub def: &'static OpcodeDef,
    args: [u16; MAX_OPERANDS],
}

impl Instruction {
    #[inline(always)]
    pub fn id(&self) -> OpId {
        self.def.id
    }

    /// Operand values in declaration order.
    #[inline]
    pub fn args(&self) -> &[u16] {
        &self.args[..self.def.operands.len()]
    }

    /// The first `C` operand values, for destructuring at the dispatch site.
    #[inline(always)]
    pub fn operands<const C: usize>(&self) -> [u16; C] {
        debug_assert!(C <= self.def.operands.len());
        let mut out = [0; C];
        out.copy_from_slice(&self.args[..C]);
        out
    }

    /// Value of the operand of the given kind, if the instruction declares one.
    pub fn operand(&self, kind: OperandKind) -> Option<u16> {
        self.def
            .operands
            .iter()
            .position(|operand| operand.kind == kind)
            .map(|i| self.args[i])
    }
}

/// Decode an instruction word.
///
/// Fails with [`Chip8Error::UnknownOpcode`] when no table entry matches.
pub fn decode(opcode: u16) -> Chip8Result<Instruction> {
    let def = OPCODE_TABLE
        .iter()
        .find(|def| def.matches(opcode))
        .ok_or(Chip8Error::UnknownOpcode { opcode })?;

    let mut args = [0; MAX_OPERANDS];
    for (arg, operand) in args.iter_mut().zip(def.operands) {
        *arg = operand.extract(opcode);
    }

    Ok(Instruction { opcode, def, args })
}

/// Formats the instruction as assembly, eg. `ADD V1, V2`.
impl Display for Instruction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut chars = self.def.syntax.chars();

        while let Some(c) = chars.next() {
            if c != '{' {
                f.write_char(c)?;
                continue;
            }

            let placeholder: String = chars.by_ref().take_while(|c| *c != '}').collect();
            let kind = match placeholder.as_str() {
                "x" => OperandKind::X,
                "y" => OperandKind::Y,
                "n" => OperandKind::N,
                "nn" => OperandKind::NN,
                "nnn" => OperandKind::NNN,
                _ => return Err(fmt::Error),
            };
            let value = self.operand(kind).ok_or(fmt::Error)?;

            match kind {
                OperandKind::X | OperandKind::Y | OperandKind::N => write!(f, "{value:X}")?,
                OperandKind::NN => write!(f, "{value:02X}")?,
                OperandKind::NNN => write!(f, "{value:03X}")?,
            }
        }

        Ok(())
    }
}
