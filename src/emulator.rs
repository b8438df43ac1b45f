use log::debug;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::decode::{OpCode, Word};
use crate::error::Fault;
use crate::framebuffer::FrameBuffer;
use crate::keyboard::Keypad;
use crate::memory::{FONT_ADDR, GLYPH_BYTES, Memory};
use crate::registers::Registers;

/// What one call to `cycle` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleStatus {
    /// One instruction ran to completion.
    Completed,
    /// A key wait is pending; the machine is parked until a latch is set.
    /// Refresh input and call `cycle` again.
    WaitingForKey,
}

/// The interpreter. Owns all machine state and advances it one instruction
/// per `cycle` call; pacing, input polling and presentation stay with the
/// caller.
pub struct Emulator {
    pub regs: Registers,
    pub mem: Memory,
    pub fb: FrameBuffer,
    pub keypad: Keypad,
    pub delay_timer: u8,
    pub sound_timer: u8,
    rng: StdRng,
    waiting_for_key: Option<u8>,
}

impl Emulator {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Fixed RNG seed, for reproducible runs and for pinning down CXKK in
    /// tests.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            regs: Registers::new(),
            mem: Memory::new(),
            fb: FrameBuffer::new(),
            keypad: Keypad::new(),
            delay_timer: 0,
            sound_timer: 0,
            rng,
            waiting_for_key: None,
        }
    }

    /// Back to the power-on state: everything zeroed, font reinstalled,
    /// program counter at the entry point. Usable before or after a ROM has
    /// been loaded.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.mem.reset();
        self.fb.clear();
        self.keypad.reset();
        self.delay_timer = 0;
        self.sound_timer = 0;
        self.waiting_for_key = None;
    }

    pub fn load_rom(&mut self, bytes: &[u8]) -> Result<(), Fault> {
        self.mem.load_rom(bytes)
    }

    /// Run one machine cycle: fetch, execute, tick both timers.
    ///
    /// While a key wait is pending this neither fetches nor mutates anything;
    /// it just reports `WaitingForKey` so the caller can keep servicing its
    /// own event loop. The wait resolves on the first cycle that sees a set
    /// latch.
    pub fn cycle(&mut self) -> Result<CycleStatus, Fault> {
        if let Some(dest) = self.waiting_for_key {
            match self.keypad.first_pressed() {
                None => return Ok(CycleStatus::WaitingForKey),
                Some(key) => {
                    self.regs.set(dest, key);
                    self.waiting_for_key = None;
                    self.mem.pc.advance();
                    self.tick_timers();
                    return Ok(CycleStatus::Completed);
                }
            }
        }

        let word = Word(self.mem.fetch()?);
        let op = OpCode::decode(word);
        if op == OpCode::Nop {
            debug!("unassigned opcode {:#06x}, treated as no-op", word.0);
        }
        self.exec(op)?;
        self.tick_timers();

        Ok(if self.waiting_for_key.is_some() {
            CycleStatus::WaitingForKey
        } else {
            CycleStatus::Completed
        })
    }

    fn tick_timers(&mut self) {
        if self.delay_timer > 0 {
            self.delay_timer -= 1;
        }
        if self.sound_timer > 0 {
            self.sound_timer -= 1;
        }
    }

    fn exec(&mut self, op: OpCode) -> Result<(), Fault> {
        match op {
            OpCode::Cls => self.fb.clear(),
            OpCode::Ret => {
                let addr = self.mem.stack.pop()?;
                self.mem.pc.jump(addr);
            }
            OpCode::Jump(addr) => self.mem.pc.jump(addr),
            OpCode::Call(addr) => {
                // return to the word after the call; fetch already stepped
                self.mem.stack.push(self.mem.pc.addr())?;
                self.mem.pc.jump(addr);
            }
            OpCode::SkipEqImm(x, kk) => {
                if self.regs.get(x) == kk {
                    self.mem.pc.advance();
                }
            }
            OpCode::SkipNeImm(x, kk) => {
                if self.regs.get(x) != kk {
                    self.mem.pc.advance();
                }
            }
            OpCode::SkipEqReg(x, y) => {
                if self.regs.get(x) == self.regs.get(y) {
                    self.mem.pc.advance();
                }
            }
            OpCode::SkipNeReg(x, y) => {
                if self.regs.get(x) != self.regs.get(y) {
                    self.mem.pc.advance();
                }
            }
            OpCode::LoadImm(x, kk) => self.regs.set(x, kk),
            OpCode::AddImm(x, kk) => {
                self.regs.set(x, self.regs.get(x).wrapping_add(kk));
            }
            OpCode::Move(x, y) => self.regs.set(x, self.regs.get(y)),
            OpCode::Or(x, y) => {
                self.regs.set(x, self.regs.get(x) | self.regs.get(y));
            }
            OpCode::And(x, y) => {
                self.regs.set(x, self.regs.get(x) & self.regs.get(y));
            }
            OpCode::Xor(x, y) => {
                self.regs.set(x, self.regs.get(x) ^ self.regs.get(y));
            }
            // flag writes come after the result so VF-as-destination ends up
            // holding the flag
            OpCode::Add(x, y) => {
                let (sum, carry) = self.regs.get(x).overflowing_add(self.regs.get(y));
                self.regs.set(x, sum);
                self.regs.set(0xF, carry as u8);
            }
            OpCode::Sub(x, y) => {
                let (diff, borrow) = self.regs.get(x).overflowing_sub(self.regs.get(y));
                self.regs.set(x, diff);
                self.regs.set(0xF, !borrow as u8);
            }
            OpCode::SubNeg(x, y) => {
                let (diff, borrow) = self.regs.get(y).overflowing_sub(self.regs.get(x));
                self.regs.set(x, diff);
                self.regs.set(0xF, !borrow as u8);
            }
            OpCode::ShiftRight(x) => {
                let value = self.regs.get(x);
                self.regs.set(x, value >> 1);
                self.regs.set(0xF, value & 1);
            }
            OpCode::ShiftLeft(x) => {
                let value = self.regs.get(x);
                self.regs.set(x, value << 1);
                self.regs.set(0xF, value >> 7);
            }
            OpCode::LoadIndex(addr) => self.mem.index.set(addr),
            OpCode::JumpOffset(addr) => {
                self.mem.pc.jump(addr.wrapping_add(u16::from(self.regs.get(0))));
            }
            OpCode::Rand(x, kk) => {
                let byte: u8 = self.rng.gen();
                self.regs.set(x, byte & kk);
            }
            OpCode::Draw(x, y, n) => {
                let (px, py) = (self.regs.get(x), self.regs.get(y));
                let base = self.mem.index.addr() as usize;
                let sprite = self.mem.slice(base, n as usize)?;
                let collided = self.fb.draw(px, py, sprite);
                self.regs.set(0xF, collided as u8);
            }
            OpCode::SkipKeyPressed(x) => {
                if self.keypad.is_pressed(self.regs.get(x) & 0xF) {
                    self.mem.pc.advance();
                }
            }
            OpCode::SkipKeyReleased(x) => {
                if !self.keypad.is_pressed(self.regs.get(x) & 0xF) {
                    self.mem.pc.advance();
                }
            }
            OpCode::ReadDelay(x) => self.regs.set(x, self.delay_timer),
            OpCode::WaitKey(x) => match self.keypad.first_pressed() {
                Some(key) => self.regs.set(x, key),
                None => {
                    // park on this instruction; the pc stays put until a
                    // latch shows up
                    self.mem.pc.rewind();
                    self.waiting_for_key = Some(x);
                }
            },
            OpCode::SetDelay(x) => self.delay_timer = self.regs.get(x),
            OpCode::SetSound(x) => self.sound_timer = self.regs.get(x),
            OpCode::AddIndex(x) => self.mem.index.add(self.regs.get(x)),
            OpCode::FontGlyph(x) => {
                let glyph = u16::from(self.regs.get(x) & 0xF);
                self.mem.index.set(FONT_ADDR as u16 + glyph * GLYPH_BYTES);
            }
            OpCode::StoreBcd(x) => {
                let value = self.regs.get(x);
                let base = self.mem.index.addr() as usize;
                self.mem.write(base, value / 100)?;
                self.mem.write(base + 1, value / 10 % 10)?;
                self.mem.write(base + 2, value % 10)?;
            }
            OpCode::StoreRegs(x) => {
                let base = self.mem.index.addr() as usize;
                for reg in 0..=x {
                    self.mem.write(base + reg as usize, self.regs.get(reg))?;
                }
            }
            OpCode::LoadRegs(x) => {
                let base = self.mem.index.addr() as usize;
                for reg in 0..=x {
                    let value = self.mem.read(base + reg as usize)?;
                    self.regs.set(reg, value);
                }
            }
            OpCode::Nop => {}
        }
        Ok(())
    }
}
