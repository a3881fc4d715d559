//! Flat 4KB address space.
use crate::{
    constants::*,
    error::{Chip8Error, Chip8Result},
};

/// Main memory storage space.
///
/// Every multi-byte access is bounds checked as a whole before any cell is
/// touched, so a rejected access leaves memory unchanged.
pub struct Memory {
    ram: Box<[u8; MEM_SIZE]>,
}

impl Default for Memory {
    fn default() -> Self {
        Self {
            ram: Box::new([0; MEM_SIZE]),
        }
    }
}

impl Memory {
    pub fn new() -> Self {
        Default::default()
    }

    /// Erase all memory cells.
    pub(crate) fn clear(&mut self) {
        self.ram.fill(0);
    }

    /// Ensure that `len` bytes starting at `address` lie within the address space.
    #[inline]
    pub fn check_range(address: usize, len: usize) -> Chip8Result<()> {
        if len == 0 || address + len - 1 <= MEM_LAST {
            Ok(())
        } else {
            Err(Chip8Error::MemoryOverflow { address, len })
        }
    }

    #[inline]
    pub fn read(&self, address: usize) -> Chip8Result<u8> {
        Self::check_range(address, 1)?;
        Ok(self.ram[address])
    }

    #[inline]
    pub fn write(&mut self, address: usize, value: u8) -> Chip8Result<()> {
        Self::check_range(address, 1)?;
        self.ram[address] = value;
        Ok(())
    }

    /// Read a big-endian instruction word.
    #[inline]
    pub fn read_word(&self, address: usize) -> Chip8Result<u16> {
        let [a, b] = self.read_array::<2>(address)?;
        Ok(u16::from_be_bytes([a, b]))
    }

    /// Write a big-endian instruction word.
    #[inline]
    pub fn write_word(&mut self, address: usize, word: u16) -> Chip8Result<()> {
        self.write_slice(address, &word.to_be_bytes())
    }

    #[inline]
    pub fn read_array<const N: usize>(&self, address: usize) -> Chip8Result<[u8; N]> {
        let mut buf = [0; N];
        buf.copy_from_slice(self.slice(address, N)?);
        Ok(buf)
    }

    /// Borrow `len` bytes starting at `address`.
    ///
    /// An empty range is legal at any address, including past the end of memory.
    pub fn slice(&self, address: usize, len: usize) -> Chip8Result<&[u8]> {
        if len == 0 {
            return Ok(&[]);
        }
        Self::check_range(address, len)?;
        Ok(&self.ram[address..address + len])
    }

    /// Copy `data` into memory starting at `address`.
    pub fn write_slice(&mut self, address: usize, data: &[u8]) -> Chip8Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        Self::check_range(address, data.len())?;
        self.ram[address..address + data.len()].copy_from_slice(data);
        Ok(())
    }

    /// The whole address space.
    pub fn as_slice(&self) -> &[u8] {
        &self.ram[..]
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_word_big_endian() {
        let mut mem = Memory::new();
        mem.write_word(MEM_START, 0x1F_C2).unwrap();
        assert_eq!(mem.read(MEM_START).unwrap(), 0x1F);
        assert_eq!(mem.read(MEM_START + 1).unwrap(), 0xC2);
        assert_eq!(mem.read_word(MEM_START).unwrap(), 0x1FC2);
    }

    #[test]
    fn test_range_check() {
        assert!(Memory::check_range(0xFFF, 1).is_ok());
        assert!(Memory::check_range(0xFFD, 3).is_ok());
        assert!(Memory::check_range(0x1000, 0).is_ok());
        assert!(matches!(
            Memory::check_range(0xFFE, 3),
            Err(Chip8Error::MemoryOverflow {
                address: 0xFFE,
                len: 3
            })
        ));
        assert!(Memory::check_range(0x1000, 1).is_err());
    }

    #[test]
    fn test_rejected_write_leaves_memory() {
        let mut mem = Memory::new();
        assert!(mem.write_slice(0xFFE, &[1, 2, 3]).is_err());
        assert_eq!(mem.read(0xFFE).unwrap(), 0);
        assert_eq!(mem.read(0xFFF).unwrap(), 0);
    }

    #[test]
    fn test_empty_range_past_end_of_memory() {
        let mut mem = Memory::new();
        assert_eq!(mem.slice(0x11FD, 0).unwrap(), &[] as &[u8]);
        assert_eq!(mem.slice(0xFFFF, 0).unwrap().len(), 0);
        assert!(mem.write_slice(0x11FD, &[]).is_ok());
        assert!(mem.as_slice().iter().all(|b| *b == 0));
    }

    #[test]
    fn test_word_fetch_at_end_of_memory() {
        let mem = Memory::new();
        assert!(mem.read_word(0xFFE).is_ok());
        assert!(mem.read_word(0xFFF).is_err());
    }
}
