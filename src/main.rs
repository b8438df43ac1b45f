// 16 8-bit data registers named V0 to VF
// I -> address register, PC -> program counter
//
// Delay timer & sound timer count down once per machine cycle until 0;
// beep while the sound timer is non-zero
//
// Display res: 64 width, 32 height
//
// 35 opcodes, each 2 bytes (big-endian)
//      NNN: address
//      KK: 8-bit constant
//      N: 4-bit constant
//      X and Y: 4-bit register identifiers

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, warn};

use crate::display::Display;
use crate::emulator::{CycleStatus, Emulator};
use crate::sound::Beeper;

mod decode;
mod display;
mod emulator;
mod error;
mod framebuffer;
mod keyboard;
mod memory;
mod registers;
mod sound;

#[derive(Parser, Debug)]
#[command(version, about = "A CHIP-8 emulator", long_about = None)]
struct Args {
    /// Path to the ROM file to run
    rom: PathBuf,

    /// Window scale factor (1, 2, 4, 8, 16 or 32)
    #[arg(short, long, default_value_t = 16)]
    scale: u32,

    /// Microseconds between CPU cycles (~700 cycles/s by default)
    #[arg(short, long, default_value_t = 1400)]
    cycle_delay: u64,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let rom = fs::read(&args.rom)
        .with_context(|| format!("failed to read rom {}", args.rom.display()))?;
    let mut emu = Emulator::new();
    emu.load_rom(&rom)?;
    info!("loaded {} byte rom from {}", rom.len(), args.rom.display());

    let mut display = Display::new("ocho - ESC to exit", args.scale)?;
    let mut beeper = match Beeper::new() {
        Ok(beeper) => Some(beeper),
        Err(err) => {
            warn!("audio disabled: {err:#}");
            None
        }
    };

    let cycle_delay = Duration::from_micros(args.cycle_delay);
    let mut last_cycle = Instant::now();
    while display.is_open() {
        emu.keypad.latch_all(keyboard::scan(display.window()));

        while last_cycle.elapsed() >= cycle_delay {
            last_cycle += cycle_delay;
            match emu.cycle() {
                Ok(CycleStatus::Completed) => {}
                Ok(CycleStatus::WaitingForKey) => {
                    // parked on a key wait; go refresh input rather than
                    // spinning here
                    last_cycle = Instant::now();
                    break;
                }
                Err(fault) => {
                    error!("emulation halted: {fault}");
                    return Err(fault.into());
                }
            }
        }

        if let Some(beeper) = beeper.as_mut() {
            beeper.set_active(emu.sound_timer > 0);
        }
        display.present(emu.fb.pixels())?;
    }

    Ok(())
}
