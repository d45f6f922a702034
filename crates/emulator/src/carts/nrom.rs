use super::MapperChip;

/// Mapper 0, fixed 16 or 32 KiB of PRG ROM and 8 KiB of CHR.
#[derive(Debug, Clone, Default, bincode::Encode, bincode::Decode)]
pub struct NRom;

impl MapperChip for NRom {
    fn prg_offset(&self, addr: u16, _prg_len: usize) -> usize {
        // 16 KiB images mirror into the upper half through the modulo in the bus
        addr as usize - 0x8000
    }

    fn write_register(&mut self, _addr: u16, _v: u8) {}

    fn reset(&mut self, _prg_len: usize) {}
}
