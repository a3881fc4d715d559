//! Disassembler.
use std::fmt::{self, Write as FmtWrite};

use crate::{constants::MEM_START, opcode::decode};

/// Renders ROM bytes as an assembly listing.
///
/// Addresses are printed as they would be once loaded, starting at `0x200`.
/// Words that don't decode, usually sprite data, are listed as `DW`.
pub struct Disassembler<'a> {
    bytecode: &'a [u8],
    cursor: usize,
}

impl<'a> Disassembler<'a> {
    pub fn new(bytecode: &'a [u8]) -> Self {
        Self {
            bytecode,
            cursor: 0,
        }
    }

    /// Write the listing of the whole program.
    pub fn disassemble_all<W: FmtWrite>(&mut self, w: &mut W) -> fmt::Result {
        self.cursor = 0;
        while self.cursor < self.bytecode.len() {
            self.disassemble(w)?;
            self.cursor += 2;
        }
        self.cursor = 0;

        Ok(())
    }

    /// Write a single instruction to the given writer.
    pub fn disassemble<W: FmtWrite>(&self, w: &mut W) -> fmt::Result {
        let address = MEM_START + self.cursor;

        match self.bytecode[self.cursor..] {
            [a, b, ..] => {
                let word = u16::from_be_bytes([a, b]);
                match decode(word) {
                    Ok(instr) => writeln!(w, "{address:04X}: {word:04X}  {instr}"),
                    Err(_) => writeln!(w, "{address:04X}: {word:04X}  DW 0x{word:04X}"),
                }
            }
            [a] => writeln!(w, "{address:04X}: {a:02X}    DB 0x{a:02X}"),
            [] => Ok(()),
        }
    }
}
