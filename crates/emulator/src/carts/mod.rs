pub mod ines;

mod axrom;
mod cnrom;
mod mmc1;
mod nrom;
mod uxrom;

use enum_dispatch::enum_dispatch;

use crate::error::StateError;

pub use axrom::AxRom;
pub use cnrom::CnRom;
pub use ines::Rom;
pub use mmc1::Mmc1;
pub use nrom::NRom;
pub use uxrom::UxRom;

pub const PRG_BANK_SIZE: usize = 0x4000;
pub const CHR_BANK_SIZE: usize = 0x2000;
pub const PRG_RAM_SIZE: usize = 0x2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub enum Mirroring {
    Horizontal,
    Vertical,
    SingleScreenLower,
    SingleScreenUpper,
    FourScreen,
}

impl Mirroring {
    /// Map a PPU address in `$2000-$3EFF` to an offset in the 4 KiB nametable memory.
    pub fn nametable_offset(self, addr: u16) -> usize {
        let addr = addr as usize & 0x0FFF;
        let table = addr / 0x400;
        let offset = addr % 0x400;

        let physical = match self {
            Mirroring::Horizontal => table / 2,
            Mirroring::Vertical => table % 2,
            Mirroring::SingleScreenLower => 0,
            Mirroring::SingleScreenUpper => 1,
            Mirroring::FourScreen => table,
        };

        physical * 0x400 + offset
    }
}

/// The banking logic of a cartridge board.
///
/// Offsets returned by the mapper are taken modulo the size of the memory they index, so
/// oversized bank numbers wrap like they do on hardware with fewer address lines.
#[enum_dispatch]
pub trait MapperChip {
    /// Offset into PRG ROM for the CPU address `addr` in `$8000-$FFFF`.
    fn prg_offset(&self, addr: u16, prg_len: usize) -> usize;

    /// Offset into CHR memory for the PPU address `addr` in `$0000-$1FFF`.
    fn chr_offset(&self, addr: u16) -> usize {
        addr as usize
    }

    /// A CPU write to `$8000-$FFFF`.
    fn write_register(&mut self, addr: u16, v: u8);

    /// Mirroring selected by the mapper, `None` to use the one wired on the board.
    fn mirroring(&self) -> Option<Mirroring> {
        None
    }

    fn prg_ram_enabled(&self) -> bool {
        true
    }

    fn reset(&mut self, prg_len: usize);

    /// Check the mapper registers after a save state was decoded.
    fn validate(&self) -> Result<(), StateError> {
        Ok(())
    }
}

#[enum_dispatch(MapperChip)]
#[derive(Debug, Clone, bincode::Encode, bincode::Decode)]
pub enum Mapper {
    NRom(NRom),
    Mmc1(Mmc1),
    UxRom(UxRom),
    CnRom(CnRom),
    AxRom(AxRom),
}

impl Mapper {
    pub const SUPPORTED: [u8; 5] = [0, 1, 2, 3, 7];

    pub fn new(number: u8, prg_len: usize) -> Option<Self> {
        let mapper: Mapper = match number {
            0 => NRom.into(),
            1 => Mmc1::new().into(),
            2 => UxRom::new(prg_len).into(),
            3 => CnRom::default().into(),
            7 => AxRom::default().into(),
            _ => return None,
        };
        Some(mapper)
    }

    pub fn number(&self) -> u8 {
        match self {
            Mapper::NRom(_) => 0,
            Mapper::Mmc1(_) => 1,
            Mapper::UxRom(_) => 2,
            Mapper::CnRom(_) => 3,
            Mapper::AxRom(_) => 7,
        }
    }
}

/// The mutable part of a cartridge: mapper registers and on-board RAM.
///
/// ROM contents are kept apart in [`Rom`] so that save states never carry them.
#[derive(Debug, Clone, bincode::Encode, bincode::Decode)]
pub struct Board {
    pub mapper: Mapper,
    pub prg_ram: Vec<u8>,
    pub chr_ram: Vec<u8>,
    wired_mirroring: Mirroring,
}

impl Board {
    pub fn new(rom: &Rom) -> Option<Self> {
        let mapper = Mapper::new(rom.mapper, rom.prg.len())?;
        let chr_ram = if rom.chr.is_empty() {
            vec![0x00; CHR_BANK_SIZE]
        } else {
            Vec::new()
        };

        Some(Self {
            mapper,
            prg_ram: vec![0xFF; PRG_RAM_SIZE],
            chr_ram,
            wired_mirroring: rom.mirroring,
        })
    }

    pub fn mirroring(&self) -> Mirroring {
        self.mapper.mirroring().unwrap_or(self.wired_mirroring)
    }

    /// Whether this board is shaped the way one built from `rom` would be.
    pub fn fits(&self, rom: &Rom) -> bool {
        self.mapper.number() == rom.mapper
            && self.prg_ram.len() == PRG_RAM_SIZE
            && self.chr_ram.len() == if rom.chr.is_empty() { CHR_BANK_SIZE } else { 0 }
    }
}

/// The cartridge as seen by the CPU and PPU buses.
pub struct CartBus<'a> {
    pub board: &'a mut Board,
    pub rom: &'a Rom,
}

impl<'a> CartBus<'a> {
    /// CPU read in `$4020-$FFFF`, `None` where nothing drives the bus.
    pub fn cpu_read(&self, addr: u16) -> Option<u8> {
        match addr {
            0x6000..=0x7FFF if self.board.mapper.prg_ram_enabled() => {
                Some(self.board.prg_ram[addr as usize - 0x6000])
            }
            0x8000..=0xFFFF => {
                let len = self.rom.prg.len();
                let offset = self.board.mapper.prg_offset(addr, len) % len;
                Some(self.rom.prg[offset])
            }
            _ => None,
        }
    }

    pub fn cpu_write(&mut self, addr: u16, v: u8) {
        match addr {
            0x6000..=0x7FFF => {
                if self.board.mapper.prg_ram_enabled() {
                    self.board.prg_ram[addr as usize - 0x6000] = v;
                }
            }
            0x8000..=0xFFFF => self.board.mapper.write_register(addr, v),
            _ => {
                log::trace!("ignored cartridge write {v:#04x} to {addr:#06x}");
            }
        }
    }

    pub fn chr_read(&self, addr: u16) -> u8 {
        if self.rom.chr.is_empty() {
            self.board.chr_ram[addr as usize % CHR_BANK_SIZE]
        } else {
            let len = self.rom.chr.len();
            self.rom.chr[self.board.mapper.chr_offset(addr) % len]
        }
    }

    pub fn chr_write(&mut self, addr: u16, v: u8) {
        // CHR ROM ignores writes
        if self.rom.chr.is_empty() {
            self.board.chr_ram[addr as usize % CHR_BANK_SIZE] = v;
        }
    }

    pub fn mirroring(&self) -> Mirroring {
        self.board.mirroring()
    }
}
