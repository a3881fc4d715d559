//! CPU and memory state.
use crate::{
    constants::*, devices::KeyCode, display::DisplayBuffer, memory::Memory, stack::CallStack,
    timer::Timers,
};

/// Core state for a chip8 interpreter.
pub struct Chip8Cpu {
    // ------------------------------------------------------------------------
    // Registers
    /// Program counter pointing to the current position in the bytecode.
    pub(crate) pc: Address,
    /// General purpose registers for temporary values.
    ///
    /// Register 16 (VF) is used for either the carry flag or borrow switch depending on opcode.
    pub(crate) registers: [u8; REGISTER_COUNT],
    /// Index register used for temporarily storing an address.
    ///
    /// It is 16 bits wide, so arithmetic may take it past the 12-bit address space.
    /// Memory accesses through it are bounds checked.
    pub(crate) index: Address,
    /// Delay and sound timers.
    pub(crate) timers: Timers,
    /// Key currently pressed down, if any.
    pub(crate) key: Option<KeyCode>,

    // ------------------------------------------------------------------------
    // Memory
    /// Main memory storage space.
    pub(crate) memory: Memory,
    /// Stack of return pointers used for jumping when a routine call finishes.
    pub(crate) stack: CallStack,
    /// Screen buffer that is drawn too.
    pub(crate) display: DisplayBuffer,
}

impl Default for Chip8Cpu {
    fn default() -> Self {
        Self {
            pc: MEM_START as Address,
            registers: [0; REGISTER_COUNT],
            index: 0,
            timers: Timers::new(),
            key: None,

            memory: Memory::new(),
            stack: CallStack::new(),
            display: DisplayBuffer::new(),
        }
    }
}

impl Chip8Cpu {
    pub fn new() -> Self {
        Default::default()
    }

    /// Return every register, buffer and timer to its power-on state.
    pub(crate) fn reset(&mut self) {
        self.pc = MEM_START as Address;
        self.registers.fill(0);
        self.index = 0;
        self.timers = Timers::new();
        self.key = None;

        self.memory.clear();
        self.stack.clear();
        self.display.clear();
    }

    #[inline]
    pub fn pc(&self) -> Address {
        self.pc
    }

    #[inline]
    pub fn index(&self) -> Address {
        self.index
    }

    /// Value of register `Vx`.
    ///
    /// # Panics
    ///
    /// When `x` is not a register index in `0x0..=0xF`.
    #[inline]
    pub fn register(&self, x: usize) -> u8 {
        self.registers[x]
    }

    pub fn registers(&self) -> &[u8; REGISTER_COUNT] {
        &self.registers
    }

    #[inline]
    pub fn delay_timer(&self) -> u8 {
        self.timers.delay
    }

    #[inline]
    pub fn sound_timer(&self) -> u8 {
        self.timers.sound
    }

    #[inline]
    pub fn timers(&self) -> &Timers {
        &self.timers
    }

    #[inline]
    pub fn pressed_key(&self) -> Option<KeyCode> {
        self.key
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn stack(&self) -> &CallStack {
        &self.stack
    }

    pub fn display(&self) -> &DisplayBuffer {
        &self.display
    }
}

/// Debugging and fixture setup.
///
/// The display is deliberately left out; it only changes through instructions.
impl Chip8Cpu {
    pub fn set_pc(&mut self, pc: Address) {
        self.pc = pc;
    }

    pub fn set_index(&mut self, index: Address) {
        self.index = index;
    }

    /// # Panics
    ///
    /// When `x` is not a register index in `0x0..=0xF`.
    pub fn set_register(&mut self, x: usize, value: u8) {
        self.registers[x] = value;
    }

    pub fn timers_mut(&mut self) -> &mut Timers {
        &mut self.timers
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    pub fn stack_mut(&mut self) -> &mut CallStack {
        &mut self.stack
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_reset() {
        let mut cpu = Chip8Cpu::default();
        cpu.pc = 0x300;
        cpu.registers[0xF] = 1;
        cpu.index = 0x123;
        cpu.timers.delay = 9;
        cpu.key = Some(KeyCode::Key3);
        cpu.memory.write(0x400, 0xAB).unwrap();
        cpu.stack.push(0x202).unwrap();
        cpu.display.draw_sprite(0, 0, &[0xFF]);

        cpu.reset();

        assert_eq!(cpu.pc(), MEM_START as Address);
        assert_eq!(cpu.register(0xF), 0);
        assert_eq!(cpu.index(), 0);
        assert_eq!(cpu.delay_timer(), 0);
        assert_eq!(cpu.pressed_key(), None);
        assert_eq!(cpu.memory().read(0x400).unwrap(), 0);
        assert!(cpu.stack().is_empty());
        assert_eq!(cpu.display().lit_count(), 0);
    }
}
