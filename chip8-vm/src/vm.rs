//! Virtual machine.
use std::fmt::{self, Write};

use log::{debug, warn};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    constants::*,
    cpu::Chip8Cpu,
    devices::KeyCode,
    display::DisplayBuffer,
    error::{Chip8Error, Chip8Result},
    opcode::{decode, Instruction, OpId},
};

pub struct Chip8Vm {
    cpu: Chip8Cpu,
    rng: StdRng,
    conf: Chip8Conf,
}

impl Chip8Vm {
    pub fn new(conf: Chip8Conf) -> Self {
        Chip8Vm {
            cpu: Chip8Cpu::new(),
            rng: conf.rng(),
            conf,
        }
    }

    /// Configuration that was used to instantiate the VM.
    pub fn config(&self) -> &Chip8Conf {
        &self.conf
    }

    fn load_builtin_font(&mut self) -> Chip8Result<()> {
        self.cpu
            .memory
            .write_slice(FONTSET_START as usize, &FONTSET)
    }

    /// Load a program from raw ROM bytes.
    ///
    /// All machine state is reset, the builtin font is written to the start of memory,
    /// and the program is copied to `0x200` where execution begins.
    pub fn load_bytecode(&mut self, bytecode: &[u8]) -> Chip8Result<()> {
        if bytecode.len() > MAX_PROGRAM_SIZE {
            return Err(Chip8Error::LargeProgram {
                size: bytecode.len(),
            });
        }

        if bytecode.len() % 2 != 0 {
            warn!(
                "program length {} is odd, final instruction is zero padded",
                bytecode.len()
            );
        }

        // Start with clean memory to avoid leaking previous program.
        self.cpu.reset();

        // Reset fonts
        self.load_builtin_font()?;

        // Load program into virtual RAM
        self.cpu.memory.write_slice(MEM_START, bytecode)?;

        // A seeded machine replays the same random sequence on every load.
        if self.conf.rng_seed.is_some() {
            self.rng = self.conf.rng();
        }

        debug!(
            "loaded program: {} bytes, {} words",
            bytecode.len(),
            (bytecode.len() + 1) / 2
        );

        Ok(())
    }

    /// Load a program given as instruction words, each stored big-endian.
    pub fn load_words(&mut self, words: &[u16]) -> Chip8Result<()> {
        let bytecode: Vec<u8> = words.iter().flat_map(|word| word.to_be_bytes()).collect();
        self.load_bytecode(&bytecode)
    }

    pub fn display_buffer(&self) -> &DisplayBuffer {
        &self.cpu.display
    }

    pub fn cpu(&self) -> &Chip8Cpu {
        &self.cpu
    }

    /// Mutable machine state, for debuggers and test fixtures.
    pub fn cpu_mut(&mut self) -> &mut Chip8Cpu {
        &mut self.cpu
    }

    pub fn delay_timer(&self) -> u8 {
        self.cpu.timers.delay
    }

    pub fn sound_timer(&self) -> u8 {
        self.cpu.timers.sound
    }

    /// Whether the buzzer should be sounding.
    pub fn buzzer(&self) -> bool {
        self.cpu.timers.buzzer()
    }
}

/// Outcome of a single instruction cycle, reported to the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Flow {
    Ok,
    /// Program counter has jumped to a new address.
    ///
    /// This is useful for the caller to avoid being
    /// blocked on infinite or long running loops.
    ///
    /// This is returned when the interpreter encounters:
    ///
    /// - 1nnn (`JP addr`)
    /// - 2nnn (`CALL addr`)
    /// - 00EE (`RET`)
    /// - Bnnn (`JP V0, addr`)
    Jump,
    /// The display buffer changed and should be presented.
    Draw,
    /// The sound timer was set.
    Sound,
    /// Wait for a keypress.
    ///
    /// This is triggered by the opcode `Fx0A` (`LD Vx, K`), which stops
    /// execution until a key is pressed, and loads the key value into `Vx`.
    KeyWait,
}

/// How an executed instruction wants the program counter to move.
///
/// The interpreter loop is the only place the program counter is changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Effect {
    /// Advance to the next instruction.
    Next,
    /// Advance past the next instruction.
    Skip,
    /// Continue at the given address.
    Jump(Address),
    /// Execute the same instruction again on the next cycle.
    Wait,
}

#[inline(always)]
fn skip_if(condition: bool) -> Effect {
    if condition {
        Effect::Skip
    } else {
        Effect::Next
    }
}

/// VM Configuration Parameters.
#[derive(Debug, Default, Clone)]
pub struct Chip8Conf {
    /// Seed for the random number generator used by `Cxnn` (`RND Vx, byte`).
    ///
    /// When not set, the generator is seeded from system entropy.
    pub rng_seed: Option<u64>,
}

impl Chip8Conf {
    fn rng(&self) -> StdRng {
        match self.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

/// Interpreter
impl Chip8Vm {
    /// Sets the keyboard key input state.
    ///
    /// Only one key is considered pressed at a time. `None` releases all keys.
    pub fn set_key(&mut self, key: Option<KeyCode>) {
        self.cpu.key = key;
    }

    /// Count down the delay and sound timers.
    ///
    /// Must be called by the driver at 60Hz, independent of the instruction rate.
    pub fn tick(&mut self) {
        self.cpu.timers.tick();
    }

    /// Execute `step_count` instruction cycles, stopping at the first error.
    ///
    /// Returns the flow of the last executed cycle.
    pub fn run_steps(&mut self, step_count: usize) -> Chip8Result<Flow> {
        let mut flow = Flow::Ok;

        for _ in 0..step_count {
            flow = self.step()?;
        }

        Ok(flow)
    }

    /// Fetch, decode and execute a single instruction.
    ///
    /// On error the machine state is left as it was before the cycle.
    pub fn step(&mut self) -> Chip8Result<Flow> {
        let pc = self.cpu.pc;

        // Each instruction is two bytes, stored big-endian.
        let opcode = self.cpu.memory.read_word(pc as usize)?;
        let instr = decode(opcode)?;

        op_trace(pc, &instr);

        let effect = self.exec(&instr)?;

        self.cpu.pc = match effect {
            Effect::Next => pc.wrapping_add(2),
            Effect::Skip => pc.wrapping_add(4),
            Effect::Jump(address) => address,
            Effect::Wait => pc,
        };

        let flow = match (effect, instr.id()) {
            (Effect::Jump(_), _) => Flow::Jump,
            (Effect::Wait, _) => Flow::KeyWait,
            (_, OpId::Cls | OpId::Draw) => Flow::Draw,
            (_, OpId::SetSound) => Flow::Sound,
            _ => Flow::Ok,
        };

        Ok(flow)
    }

    /// Execute a decoded instruction against the machine state.
    ///
    /// Bounds and stack checks happen before any state is mutated.
    fn exec(&mut self, instr: &Instruction) -> Chip8Result<Effect> {
        let cpu = &mut self.cpu;

        let effect = match instr.id() {
            // 00E0 (CLS)
            //
            // Clear display
            OpId::Cls => {
                cpu.display.clear();
                Effect::Next
            }
            // 00EE (RET)
            //
            // Return from a subroutine.
            // Set the program counter to the value at the top of the stack.
            OpId::Ret => Effect::Jump(cpu.stack.pop()?),
            // 1NNN (JP addr)
            //
            // Jump to address.
            OpId::Jump => {
                let [nnn] = instr.operands::<1>();
                Effect::Jump(nnn)
            }
            // 2NNN (CALL addr)
            //
            // Call subroutine at NNN.
            // The address of the following instruction is pushed as the return address.
            OpId::Call => {
                let [nnn] = instr.operands::<1>();
                cpu.stack.push(cpu.pc.wrapping_add(2))?;
                Effect::Jump(nnn)
            }
            // 3XNN (SE Vx, byte)
            //
            // Skip the next instruction if register VX equals value NN.
            OpId::SkipEqByte => {
                let [vx, nn] = instr.operands::<2>();
                skip_if(cpu.registers[vx as usize] == nn as u8)
            }
            // 4XNN (SNE Vx, byte)
            //
            // Skip the next instruction if register VX does not equal value NN.
            OpId::SkipNeByte => {
                let [vx, nn] = instr.operands::<2>();
                skip_if(cpu.registers[vx as usize] != nn as u8)
            }
            // 5XY0 (SE Vx, Vy)
            //
            // Skip the next instruction if register VX equals value VY.
            OpId::SkipEqReg => {
                let [vx, vy] = instr.operands::<2>();
                skip_if(cpu.registers[vx as usize] == cpu.registers[vy as usize])
            }
            // 6XNN (LD Vx, byte)
            //
            // Set register VX to value NN.
            OpId::LoadByte => {
                let [vx, nn] = instr.operands::<2>();
                cpu.registers[vx as usize] = nn as u8;
                Effect::Next
            }
            // 7XNN (ADD Vx, byte)
            //
            // Add value NN to register VX. Carry flag is not set.
            OpId::AddByte => {
                let [vx, nn] = instr.operands::<2>();
                let x = cpu.registers[vx as usize];
                cpu.registers[vx as usize] = x.wrapping_add(nn as u8);
                Effect::Next
            }
            // 9XY0 (SNE Vx, Vy)
            //
            // Skip next instruction if Vx != Vy.
            OpId::SkipNeReg => {
                let [vx, vy] = instr.operands::<2>();
                skip_if(cpu.registers[vx as usize] != cpu.registers[vy as usize])
            }
            // ANNN (LD I, addr)
            //
            // Set address register I to value NNN.
            OpId::LoadIndex => {
                let [nnn] = instr.operands::<1>();
                cpu.index = nnn;
                Effect::Next
            }
            // BNNN (JP V0, addr)
            //
            // Jump to address NNN offset by register V0.
            OpId::JumpOffset => {
                let [nnn] = instr.operands::<1>();
                Effect::Jump(nnn + cpu.registers[0] as Address)
            }
            // CXNN (RND Vx, byte)
            //
            // Generate random number.
            // Set register VX to the result of bitwise AND between a random number and NN.
            OpId::Random => {
                let [vx, nn] = instr.operands::<2>();
                cpu.registers[vx as usize] = self.rng.gen::<u8>() & nn as u8;
                Effect::Next
            }
            // DXYN (DRW Vx, Vy, nibble)
            //
            // Draw sprite to the display buffer, at coordinate as per registers Vx and Vy.
            // Sprite is encoded as 8 pixels wide, N pixels high, stored in bits located in
            // memory pointed to by address register I.
            //
            // If the drawing operation erases existing pixels in the display buffer, register VF is set to
            // 1, and set to 0 if no display bits are unset. This is used for collision detection.
            OpId::Draw => {
                let [vx, vy, n] = instr.operands::<3>();
                let (x, y) = (
                    cpu.registers[vx as usize] as usize,
                    cpu.registers[vy as usize] as usize,
                );

                let sprite = cpu.memory.slice(cpu.index as usize, n as usize)?;
                let is_erased = cpu.display.draw_sprite(x, y, sprite);

                cpu.registers[FLAG_REGISTER] = is_erased as u8;
                Effect::Next
            }
            // EX9E (SKP Vx)
            //
            // Skip the next instruction if the key with the value of Vx is pressed.
            OpId::SkipKey => {
                let [vx] = instr.operands::<1>();
                skip_if(cpu.key.map(u8::from) == Some(cpu.registers[vx as usize]))
            }
            // EXA1 (SKNP Vx)
            //
            // Skip the next instruction if the key with the value of Vx is not pressed.
            OpId::SkipNotKey => {
                let [vx] = instr.operands::<1>();
                skip_if(cpu.key.map(u8::from) != Some(cpu.registers[vx as usize]))
            }
            // FX07 (LD Vx, DT)
            //
            // Set Vx = delay timer value.
            OpId::LoadDelay => {
                let [vx] = instr.operands::<1>();
                cpu.registers[vx as usize] = cpu.timers.delay;
                Effect::Next
            }
            // FX0A (LD Vx, K)
            //
            // Wait for a key press, store the value of the key in Vx.
            // While no key is pressed the instruction is repeated on the next cycle.
            OpId::WaitKey => {
                let [vx] = instr.operands::<1>();
                match cpu.key {
                    Some(key) => {
                        cpu.registers[vx as usize] = key.into();
                        Effect::Next
                    }
                    None => Effect::Wait,
                }
            }
            // FX15 (LD DT, Vx)
            //
            // Set delay timer = Vx.
            OpId::SetDelay => {
                let [vx] = instr.operands::<1>();
                cpu.timers.delay = cpu.registers[vx as usize];
                Effect::Next
            }
            // FX18 (LD ST, Vx)
            //
            // Set sound timer = Vx.
            OpId::SetSound => {
                let [vx] = instr.operands::<1>();
                cpu.timers.sound = cpu.registers[vx as usize];
                Effect::Next
            }
            // FX1E (ADD I, Vx)
            //
            // Add Vx to I.
            // VF is set to 1 when the result exceeds the 12-bit address space.
            // The register itself wraps at 16 bits.
            OpId::AddIndex => {
                let [vx] = instr.operands::<1>();
                let sum = cpu.index as u32 + cpu.registers[vx as usize] as u32;
                cpu.index = sum as Address;
                cpu.registers[FLAG_REGISTER] = (sum > MEM_LAST as u32) as u8;
                Effect::Next
            }
            // FX29 (LD F, Vx)
            //
            // Set I = location of sprite for digit Vx.
            OpId::LoadFont => {
                let [vx] = instr.operands::<1>();
                let x = cpu.registers[vx as usize] as Address;
                cpu.index = FONTSET_START + x * FONTSET_HEIGHT as Address;
                Effect::Next
            }
            // FX33 (LD B, Vx)
            //
            // Store the binary-coded decimal representation of Vx
            // in the memory locations I, I+1, and I+2.
            #[rustfmt::skip]
            OpId::StoreBcd => {
                let [vx] = instr.operands::<1>();
                let x = cpu.registers[vx as usize];
                let digits = [
                    x / 100 % 10,
                    x / 10  % 10,
                    x       % 10,
                ];
                cpu.memory.write_slice(cpu.index as usize, &digits)?;
                Effect::Next
            }
            // FX55 (LD [I], Vx)
            //
            // Store registers V0 through Vx in memory starting at location I.
            OpId::StoreRegs => {
                let [vx] = instr.operands::<1>();
                cpu.memory
                    .write_slice(cpu.index as usize, &cpu.registers[..=vx as usize])?;
                Effect::Next
            }
            // FX65 (LD Vx, [I])
            //
            // Read registers V0 through Vx from memory starting at location I.
            OpId::LoadRegs => {
                let [vx] = instr.operands::<1>();
                let count = vx as usize + 1;
                let data = cpu.memory.slice(cpu.index as usize, count)?;
                cpu.registers[..count].copy_from_slice(data);
                Effect::Next
            }
            // Arithmetic instructions identified by n
            OpId::LoadReg
            | OpId::Or
            | OpId::And
            | OpId::Xor
            | OpId::AddReg
            | OpId::Sub
            | OpId::ShiftRight
            | OpId::SubN
            | OpId::ShiftLeft => Self::exec_math(cpu, instr),
        };

        Ok(effect)
    }

    /// Execute an arithmetic instruction
    #[inline]
    #[must_use]
    fn exec_math(cpu: &mut Chip8Cpu, instr: &Instruction) -> Effect {
        let [vx, vy] = instr.operands::<2>();
        let (vx, vy) = (vx as usize, vy as usize);
        let (x, y) = (cpu.registers[vx], cpu.registers[vy]);

        match instr.id() {
            // 8XY0 (LD Vx, Vy)
            //
            // Store the value of register VY in register VX.
            OpId::LoadReg => cpu.registers[vx] = y,
            // 8XY1 (OR Vx, Vy)
            OpId::Or => cpu.registers[vx] = x | y,
            // 8XY2 (AND Vx, Vy)
            OpId::And => cpu.registers[vx] = x & y,
            // 8XY3 (XOR Vx, Vy)
            OpId::Xor => cpu.registers[vx] = x ^ y,
            // 8XY4 (ADD Vx, Vy)
            //
            // ADDs VX to VY, and stores the result in VX.
            // Overflow is wrapped.
            // If overflow, set VF to 1, else 0.
            OpId::AddReg => {
                let (result, carry) = x.overflowing_add(y);
                cpu.registers[vx] = result;
                cpu.registers[FLAG_REGISTER] = carry as u8;
            }
            // 8XY5 (SUB Vx, Vy)
            //
            // Subtracts VY from VX, and stores the result in VX.
            // VF is set to 0 when there is a borrow, set to 1 when there isn't.
            OpId::Sub => {
                cpu.registers[vx] = x.wrapping_sub(y);
                cpu.registers[FLAG_REGISTER] = (x >= y) as u8;
            }
            // 8XY6 (SHR Vx)
            //
            // If the least-significant bit of Vx is 1, then VF is set to 1, otherwise 0.
            // Shift VX right by 1.
            // VY is unused.
            OpId::ShiftRight => {
                cpu.registers[vx] = x >> 1;
                cpu.registers[FLAG_REGISTER] = x & 1;
            }
            // 8XY7 (SUBN Vx, Vy)
            //
            // Subtracts VX from VY, and stores the result in VX.
            // VF is set to 0 when there is a borrow, set to 1 when there isn't.
            OpId::SubN => {
                cpu.registers[vx] = y.wrapping_sub(x);
                cpu.registers[FLAG_REGISTER] = (y >= x) as u8;
            }
            // 8XYE (SHL Vx)
            //
            // If the most-significant bit of Vx is 1, then VF is set to 1, otherwise 0.
            // Shift VX left by 1.
            // VY is unused.
            OpId::ShiftLeft => {
                cpu.registers[vx] = x << 1;
                cpu.registers[FLAG_REGISTER] = x >> 7;
            }
            id => unreachable!("{id:?} is not an arithmetic instruction"),
        }

        Effect::Next
    }
}

/// Troubleshooting
#[doc(hidden)]
impl Chip8Vm {
    /// Returns the program words starting at `0x200` as a human readable string.
    pub fn dump_ram(&self, count: usize) -> Result<String, fmt::Error> {
        let ram = self.cpu.memory.as_slice();
        let end = (MEM_START + count).min(MEM_SIZE);
        let mut buf = String::new();

        for (i, word) in ram[MEM_START..end].chunks(2).enumerate() {
            let offset = MEM_START + i * 2;
            match word {
                [a, b] => writeln!(buf, "{:04X}: {:02X}{:02X}", offset, a, b)?,
                [a] => writeln!(buf, "{:04X}: {:02X}", offset, a)?,
                _ => {}
            }
        }

        Ok(buf)
    }

    pub fn dump_display(&self) -> Result<String, fmt::Error> {
        let mut buf = String::new();
        self.cpu.display.dump(&mut buf)?;
        Ok(buf)
    }
}

#[cfg(feature = "op_trace")]
#[inline]
fn op_trace(pc: Address, instr: &Instruction) {
    log::trace!("{:04X}: {:04X} {}", pc, instr.opcode, instr);
}

#[cfg(not(feature = "op_trace"))]
#[inline]
fn op_trace(_: Address, _: &Instruction) {}
