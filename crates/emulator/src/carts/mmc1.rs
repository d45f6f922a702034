use bitfield_struct::bitfield;

use super::{MapperChip, Mirroring, PRG_BANK_SIZE};
use crate::error::{ensure, StateError};

#[bitfield(u8)]
struct Mmc1Control {
    /// The arrangement of nametables
    ///
    /// 0: one screen, lower bank
    /// 1: one screen, upper bank
    /// 2: vertical mirroring
    /// 3: horizontal mirroring
    #[bits(2)]
    nametable_arrangement: u8,
    /// The prg rom bank mode
    ///
    /// 0 / 1: switch 32 KiB at 0x8000, ignore low bit of bank number
    /// 2: 0x8000 fixed to first bank, 0xC000 switched
    /// 3: 0x8000 switched, 0xC000 fixed to last bank
    #[bits(2)]
    prg_rom_bank_mode: u8,
    /// The chr bank mode
    ///
    /// false: switch 8 KiB at a time
    /// true: switch 2 separate 4 KiB banks
    chr_bank_mode: bool,
    #[bits(3)]
    _unused: u8,
}

const CONTROL_POWER_ON: u8 = 0x0C;

/// Mapper 1, registers are loaded serially one bit per write.
#[derive(Debug, Clone, bincode::Encode, bincode::Decode)]
pub struct Mmc1 {
    shift: u8,
    n_shift: u8,

    control: u8,
    chr_bank0: u8,
    chr_bank1: u8,
    prg_bank: u8,
}

impl Default for Mmc1 {
    fn default() -> Self {
        Self::new()
    }
}

impl Mmc1 {
    pub fn new() -> Self {
        Self {
            shift: 0,
            n_shift: 0,
            control: CONTROL_POWER_ON,
            chr_bank0: 0,
            chr_bank1: 0,
            prg_bank: 0,
        }
    }

    fn control(&self) -> Mmc1Control {
        Mmc1Control::from_bits(self.control)
    }
}

impl MapperChip for Mmc1 {
    fn prg_offset(&self, addr: u16, prg_len: usize) -> usize {
        let bank = (self.prg_bank & 0x0F) as usize;
        let last = (prg_len / PRG_BANK_SIZE).saturating_sub(1);
        let upper = addr >= 0xC000;

        let bank = match self.control().prg_rom_bank_mode() {
            0 | 1 => (bank & !1) | upper as usize,
            2 if upper => bank,
            2 => 0,
            _ if upper => last,
            _ => bank,
        };

        bank * PRG_BANK_SIZE + (addr as usize % PRG_BANK_SIZE)
    }

    fn chr_offset(&self, addr: u16) -> usize {
        if self.control().chr_bank_mode() {
            let bank = if addr < 0x1000 {
                self.chr_bank0
            } else {
                self.chr_bank1
            };
            bank as usize * 0x1000 + (addr as usize & 0x0FFF)
        } else {
            (self.chr_bank0 & !1) as usize * 0x1000 + addr as usize
        }
    }

    fn write_register(&mut self, addr: u16, v: u8) {
        if v & 0x80 != 0 {
            self.shift = 0;
            self.n_shift = 0;
            self.control |= CONTROL_POWER_ON;
            return;
        }

        self.shift |= (v & 1) << self.n_shift;
        self.n_shift += 1;

        if self.n_shift == 5 {
            let value = self.shift;
            match addr {
                0x8000..=0x9FFF => self.control = value,
                0xA000..=0xBFFF => self.chr_bank0 = value,
                0xC000..=0xDFFF => self.chr_bank1 = value,
                _ => self.prg_bank = value,
            }
            self.shift = 0;
            self.n_shift = 0;
        }
    }

    fn mirroring(&self) -> Option<Mirroring> {
        Some(match self.control().nametable_arrangement() {
            0 => Mirroring::SingleScreenLower,
            1 => Mirroring::SingleScreenUpper,
            2 => Mirroring::Vertical,
            _ => Mirroring::Horizontal,
        })
    }

    fn prg_ram_enabled(&self) -> bool {
        self.prg_bank & 0x10 == 0
    }

    fn reset(&mut self, _prg_len: usize) {
        *self = Self::new();
    }

    fn validate(&self) -> Result<(), StateError> {
        ensure(self.n_shift < 5 && self.shift < 0x20, "MMC1 shift register")
    }
}
