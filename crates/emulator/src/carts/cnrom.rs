use super::{MapperChip, CHR_BANK_SIZE};

/// Mapper 3, fixed PRG ROM and a switchable 8 KiB CHR bank.
#[derive(Debug, Clone, Default, bincode::Encode, bincode::Decode)]
pub struct CnRom {
    chr_bank: u8,
}

impl MapperChip for CnRom {
    fn prg_offset(&self, addr: u16, _prg_len: usize) -> usize {
        addr as usize - 0x8000
    }

    fn chr_offset(&self, addr: u16) -> usize {
        self.chr_bank as usize * CHR_BANK_SIZE + addr as usize
    }

    fn write_register(&mut self, _addr: u16, v: u8) {
        self.chr_bank = v & 0x03;
    }

    fn reset(&mut self, _prg_len: usize) {
        self.chr_bank = 0;
    }
}
