use super::{MapperChip, Mirroring};

/// Mapper 7, a switchable 32 KiB PRG bank and single screen mirroring selected by bit 4.
#[derive(Debug, Clone, Default, bincode::Encode, bincode::Decode)]
pub struct AxRom {
    bank: u8,
    upper_screen: bool,
}

impl MapperChip for AxRom {
    fn prg_offset(&self, addr: u16, _prg_len: usize) -> usize {
        self.bank as usize * 0x8000 + (addr as usize - 0x8000)
    }

    fn write_register(&mut self, _addr: u16, v: u8) {
        self.bank = v & 0x07;
        self.upper_screen = v & 0x10 != 0;
    }

    fn mirroring(&self) -> Option<Mirroring> {
        Some(if self.upper_screen {
            Mirroring::SingleScreenUpper
        } else {
            Mirroring::SingleScreenLower
        })
    }

    fn reset(&mut self, _prg_len: usize) {
        self.bank = 0;
        self.upper_screen = false;
    }
}
