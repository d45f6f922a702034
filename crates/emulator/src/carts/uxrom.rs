use super::{MapperChip, PRG_BANK_SIZE};

/// Mapper 2, switchable 16 KiB bank at `$8000` and the last bank fixed at `$C000`.
#[derive(Debug, Clone, bincode::Encode, bincode::Decode)]
pub struct UxRom {
    bank_lo: u8,
    bank_hi: u8,
}

impl UxRom {
    pub fn new(prg_len: usize) -> Self {
        Self {
            bank_lo: 0,
            bank_hi: last_bank(prg_len),
        }
    }
}

fn last_bank(prg_len: usize) -> u8 {
    (prg_len / PRG_BANK_SIZE).saturating_sub(1) as u8
}

impl MapperChip for UxRom {
    fn prg_offset(&self, addr: u16, _prg_len: usize) -> usize {
        let bank = match addr {
            0x8000..=0xBFFF => self.bank_lo,
            _ => self.bank_hi,
        };
        bank as usize * PRG_BANK_SIZE + (addr as usize % PRG_BANK_SIZE)
    }

    fn write_register(&mut self, _addr: u16, v: u8) {
        self.bank_lo = v & 0x0F;
    }

    fn reset(&mut self, prg_len: usize) {
        self.bank_lo = 0;
        self.bank_hi = last_bank(prg_len);
    }
}
