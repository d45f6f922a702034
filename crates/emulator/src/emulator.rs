use bincode::{
    config::Config,
    enc::write::Writer,
    error::EncodeError,
};

use crate::{
    apu::Apu,
    audio::AudioOutput,
    bus::NesCpuBus,
    carts::{Board, CartBus, MapperChip, Rom},
    config::{EmulatorConfig, Equalizer, SpriteMode},
    controller::{Joypads, NesController},
    cpu::Cpu,
    error::{Error, RomError, StateError},
    frame::Frame,
    ppu::Ppu,
};

const STATE_MAGIC: [u8; 4] = *b"NBST";
const STATE_VERSION: u16 = 1;

/// Fixed width integers keep the size of a state independent of the values in it.
pub(crate) fn state_config() -> impl Config {
    bincode::config::standard()
        .with_fixed_int_encoding()
        .with_limit::<{ 1 << 20 }>()
}

/// Everything that changes while the console runs. This is what a save state holds.
#[derive(Clone, bincode::Encode, bincode::Decode)]
pub struct Machine {
    pub cpu: Cpu,
    pub ppu: Ppu,
    pub apu: Apu,
    pub board: Board,
    pub joypads: Joypads,
    pub ram: [u8; 0x800],
    open_bus: u8,
}

impl Machine {
    /// Reject decoded state the emulation loop could not run from.
    fn validate(&self) -> Result<(), StateError> {
        self.cpu.validate()?;
        self.ppu.validate()?;
        self.apu.validate()?;
        self.board.mapper.validate()
    }

    fn power_on(rom: &Rom, board: Board) -> Self {
        let mut machine = Self {
            cpu: Cpu::new(),
            ppu: Ppu::new(),
            apu: Apu::new(),
            board,
            joypads: Joypads::new(),
            ram: [0xFF; 0x800],
            open_bus: 0,
        };

        let Machine {
            cpu,
            ppu,
            apu,
            board,
            joypads,
            ram,
            open_bus,
        } = &mut machine;

        cpu.power_on(&mut NesCpuBus {
            ram,
            ppu,
            apu,
            cart: &mut CartBus { board, rom },
            joypads,
            open_bus,
        });

        machine
    }
}

#[derive(bincode::Encode, bincode::Decode)]
struct StateHeader {
    magic: [u8; 4],
    version: u16,
    mapper: u8,
    fingerprint: u32,
}

impl StateHeader {
    fn new(rom: &Rom) -> Self {
        Self {
            magic: STATE_MAGIC,
            version: STATE_VERSION,
            mapper: rom.mapper,
            fingerprint: rom.fingerprint,
        }
    }

    fn check(&self, rom: &Rom) -> Result<(), StateError> {
        if self.magic != STATE_MAGIC {
            return Err(StateError::BadMagic);
        }
        if self.version != STATE_VERSION {
            return Err(StateError::UnsupportedVersion(self.version));
        }
        if self.mapper != rom.mapper || self.fingerprint != rom.fingerprint {
            return Err(StateError::WrongCartridge);
        }
        Ok(())
    }
}

/// Lets a borrowed writer be handed to bincode by value.
struct Forward<'a, W: Writer>(&'a mut W);

impl<'a, W: Writer> Writer for Forward<'a, W> {
    fn write(&mut self, bytes: &[u8]) -> Result<(), EncodeError> {
        self.0.write(bytes)
    }
}

struct Loaded {
    rom: Rom,
    machine: Machine,
}

/// A console with an optional cartridge, stepped one frame at a time.
pub struct Emulator {
    loaded: Option<Loaded>,
    frame: Frame,
    audio: AudioOutput,
    config: EmulatorConfig,
}

impl Default for Emulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Emulator {
    pub fn new() -> Self {
        Self {
            loaded: None,
            frame: Frame::new(),
            audio: AudioOutput::new(),
            config: EmulatorConfig::default(),
        }
    }

    pub fn config(&self) -> &EmulatorConfig {
        &self.config
    }

    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    pub fn rom(&self) -> Option<&Rom> {
        self.loaded.as_ref().map(|l| &l.rom)
    }

    pub fn machine(&self) -> Option<&Machine> {
        self.loaded.as_ref().map(|l| &l.machine)
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    /// Parse an iNES image and power the console on with it.
    ///
    /// On failure the previously inserted cartridge is gone as well.
    pub fn load_ines(&mut self, data: &[u8]) -> Result<(), Error> {
        self.loaded = None;

        let rom = Rom::parse(data)?;
        let board = Board::new(&rom).ok_or(RomError::UnsupportedMapper(rom.mapper))?;
        let machine = Machine::power_on(&rom, board);

        log::debug!(
            "cartridge loaded, mapper {}, reset vector {:#06x}",
            rom.mapper,
            machine.cpu.pc
        );

        self.loaded = Some(Loaded { rom, machine });
        self.frame.palettes.clear();
        self.audio.begin_frame();
        Ok(())
    }

    /// Run until the start of the next vertical blank with the given controller bytes.
    pub fn emulate_frame(&mut self, pad1: u8, pad2: u8) -> Result<(), Error> {
        let Loaded { rom, machine } = self.loaded.as_mut().ok_or(Error::NoCartridge)?;

        machine.joypads.buttons = [
            NesController::from_bits_retain(pad1),
            NesController::from_bits_retain(pad2),
        ];
        machine.joypads.read_count = 0;
        self.audio.begin_frame();

        let sprite_limit = self.config.sprite_mode.limit();

        let Machine {
            cpu,
            ppu,
            apu,
            board,
            joypads,
            ram,
            open_bus,
        } = machine;
        let mut cart = CartBus { board, rom };

        loop {
            let start_cycle = cpu.cyc;
            {
                let mut bus = NesCpuBus {
                    ram: &mut *ram,
                    ppu: &mut *ppu,
                    apu: &mut *apu,
                    cart: &mut cart,
                    joypads: &mut *joypads,
                    open_bus: &mut *open_bus,
                };

                if bus.ppu.take_nmi() {
                    cpu.nmi(&mut bus);
                } else if bus.apu.irq_pending() {
                    cpu.irq(&mut bus);
                }

                cpu.step(&mut bus);
            }

            if cpu.jammed {
                return Err(Error::CpuJam { pc: cpu.pc });
            }

            let cycles = cpu.cyc - start_cycle;
            apu.step(cycles, &mut self.audio);
            if ppu.run(cycles * 3, &mut cart, &mut self.frame, sprite_limit) {
                break;
            }
        }

        self.frame.sample_count = self.audio.available();
        self.frame.joypad_read_count = joypads.read_count;

        log::trace!(
            "frame done at cycle {}, {} samples, {} palette blocks",
            cpu.cyc,
            self.frame.sample_count,
            self.frame.palettes.blocks_used()
        );

        Ok(())
    }

    /// Soft reset keeps RAM, hard reset powers the console off and on. Battery RAM survives
    /// both.
    pub fn reset(&mut self, hard: bool) {
        let Some(Loaded { rom, machine }) = self.loaded.as_mut() else {
            return;
        };

        if hard {
            let mut board = match Board::new(rom) {
                Some(board) => board,
                None => return,
            };
            if rom.battery {
                board.prg_ram = std::mem::take(&mut machine.board.prg_ram);
            }
            *machine = Machine::power_on(rom, board);
        } else {
            let Machine {
                cpu,
                ppu,
                apu,
                board,
                joypads,
                ram,
                open_bus,
            } = machine;

            ppu.reset();
            apu.reset();
            board.mapper.reset(rom.prg.len());
            cpu.reset(&mut NesCpuBus {
                ram,
                ppu,
                apu,
                cart: &mut CartBus { board, rom },
                joypads,
                open_bus,
            });
        }

        log::debug!("{} reset", if hard { "hard" } else { "soft" });
        self.frame.palettes.clear();
        self.audio.begin_frame();
    }

    /// Serialize the machine into `writer`: a header identifying the cartridge, then the state.
    pub fn save_state<W: Writer>(&self, writer: &mut W) -> Result<(), Error> {
        let Loaded { rom, machine } = self.loaded.as_ref().ok_or(Error::NoCartridge)?;

        bincode::encode_into_writer(StateHeader::new(rom), Forward(&mut *writer), state_config())
            .map_err(StateError::from)?;
        bincode::encode_into_writer(machine, Forward(&mut *writer), state_config())
            .map_err(StateError::from)?;
        Ok(())
    }

    /// Replace the machine with one previously written by [`Emulator::save_state`].
    ///
    /// Trailing bytes after the state are ignored.
    pub fn load_state(&mut self, data: &[u8]) -> Result<(), Error> {
        let Loaded { rom, machine } = self.loaded.as_mut().ok_or(Error::NoCartridge)?;

        let (header, read): (StateHeader, usize) =
            bincode::decode_from_slice(data, state_config()).map_err(StateError::from)?;
        header.check(rom)?;

        let (state, _): (Machine, usize) =
            bincode::decode_from_slice(&data[read..], state_config())
                .map_err(StateError::from)?;
        if !state.board.fits(rom) {
            return Err(StateError::LayoutMismatch.into());
        }
        state.validate()?;

        *machine = state;
        self.frame.palettes.clear();
        self.audio.begin_frame();
        log::debug!("state loaded, pc {:#06x}", machine.cpu.pc);
        Ok(())
    }

    pub fn has_battery_ram(&self) -> bool {
        self.loaded.as_ref().is_some_and(|l| l.rom.battery)
    }

    /// Write the battery backed PRG RAM, nothing when the cartridge has none.
    pub fn save_battery_ram<W: Writer>(&self, writer: &mut W) -> Result<(), Error> {
        if let Some(Loaded { rom, machine }) = &self.loaded {
            if rom.battery {
                writer
                    .write(&machine.board.prg_ram)
                    .map_err(StateError::from)?;
            }
        }
        Ok(())
    }

    /// Replace the battery backed PRG RAM. `data` must cover all of it, extra bytes are
    /// ignored. Without battery RAM this does nothing.
    pub fn load_battery_ram(&mut self, data: &[u8]) -> Result<(), Error> {
        let Some(Loaded { rom, machine }) = self.loaded.as_mut() else {
            return Ok(());
        };
        if !rom.battery {
            log::warn!("cartridge has no battery RAM, ignoring {} bytes", data.len());
            return Ok(());
        }

        let prg_ram = &mut machine.board.prg_ram;
        let src = data.get(..prg_ram.len()).ok_or(Error::BatteryTooShort {
            expected: prg_ram.len(),
            got: data.len(),
        })?;
        prg_ram.copy_from_slice(src);
        Ok(())
    }

    /// Drain up to `dest.len()` samples of the last frame.
    pub fn read_samples(&mut self, dest: &mut [i16]) -> usize {
        self.audio.read(dest)
    }

    /// Change the output rate and install the standard NES equalizer.
    pub fn set_sample_rate(&mut self, rate: u32) -> Result<(), Error> {
        self.audio.set_rate(rate)?;
        self.audio.set_equalizer(Equalizer::NES);
        self.config.sample_rate = rate;
        self.config.equalizer = Equalizer::NES;
        log::debug!("sample rate {rate} Hz");
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn set_equalizer(&mut self, equalizer: Equalizer) {
        self.audio.set_equalizer(equalizer);
        self.config.equalizer = equalizer;
    }

    pub fn set_sprite_mode(&mut self, mode: SpriteMode) {
        self.config.sprite_mode = mode;
    }

    pub fn set_pixel_pitch(&mut self, pitch: usize) -> Result<(), Error> {
        self.frame.set_pitch(pitch)
    }
}
