use bitfield_struct::bitfield;

use super::{Mapper, Mirroring, CHR_BANK_SIZE, PRG_BANK_SIZE};
use crate::error::RomError;

const MAGIC: u32 = u32::from_le_bytes(*b"NES\x1A");
const HEADER_LEN: usize = 16;
const TRAINER_LEN: usize = 512;

#[bitfield(u128)]
struct INes1Header {
    magic_bytes: u32,
    // PRG ROM size in 16 KiB units
    prg_rom_n: u8,
    // CHR ROM size in 8 KiB units, 0 means the board has CHR RAM
    chr_rom_n: u8,
    // Flags 6
    vertical_mirroring: bool,
    battery_prg_ram: bool,
    trainer: bool,
    four_screen: bool,
    #[bits(4)]
    mapper_number_lower: u8,
    // Flags 7
    vs_unisystem: bool,
    playchoice_10: bool,
    // If nes2 == 2 flags 8-15 are in NES 2.0 format
    #[bits(2)]
    nes2: u8,
    #[bits(4)]
    mapper_number_upper: u8,
    // Flags 8, PRG RAM size in 8 KiB units
    _prg_ram_size: u8,
    // Flags 9
    pal: bool,
    #[bits(7)]
    _reserved: u8,
    // Flags 10 and unused bytes
    #[bits(48)]
    _padding: u64,
}

/// A parsed iNES image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rom {
    pub prg: Vec<u8>,
    /// Empty when the board carries CHR RAM
    pub chr: Vec<u8>,
    pub mapper: u8,
    pub mirroring: Mirroring,
    pub battery: bool,
    /// CRC-32 of PRG and CHR ROM, identifies the cartridge in save states
    pub fingerprint: u32,
}

impl Rom {
    pub fn parse(bin: &[u8]) -> Result<Self, RomError> {
        let header: [u8; HEADER_LEN] = bin
            .get(..HEADER_LEN)
            .and_then(|h| h.try_into().ok())
            .ok_or(RomError::TooShort)?;
        let flags = INes1Header::from_bits(u128::from_le_bytes(header));

        if flags.magic_bytes() != MAGIC {
            return Err(RomError::BadMagic);
        }
        if flags.nes2() == 2 {
            return Err(RomError::Nes2Unsupported);
        }
        if flags.playchoice_10() {
            return Err(RomError::PlayChoiceUnsupported);
        }
        if flags.vs_unisystem() {
            log::warn!("VS System image, running it as a regular cartridge");
        }
        if flags.pal() {
            log::warn!("PAL image, timing will be NTSC");
        }

        // Old dumping tools wrote their name into bytes 7-15, the upper mapper nibble is
        // garbage then
        let mapper = if header[12..].iter().any(|&b| b != 0) {
            log::warn!("dirty iNES header, ignoring the upper mapper nibble");
            flags.mapper_number_lower()
        } else {
            flags.mapper_number_upper() << 4 | flags.mapper_number_lower()
        };
        if !Mapper::SUPPORTED.contains(&mapper) {
            return Err(RomError::UnsupportedMapper(mapper));
        }

        let mut i = HEADER_LEN;
        if flags.trainer() {
            section(bin, i, TRAINER_LEN, "trainer")?;
            i += TRAINER_LEN;
        }

        let prg_rom_size = flags.prg_rom_n() as usize * PRG_BANK_SIZE;
        if prg_rom_size == 0 {
            return Err(RomError::NoPrgRom);
        }
        let prg = section(bin, i, prg_rom_size, "PRG ROM")?.to_vec();
        i += prg_rom_size;

        let chr_rom_size = flags.chr_rom_n() as usize * CHR_BANK_SIZE;
        let chr = section(bin, i, chr_rom_size, "CHR ROM")?.to_vec();
        i += chr_rom_size;

        if i < bin.len() {
            log::debug!("ignoring {} trailing bytes after CHR ROM", bin.len() - i);
        }

        let mirroring = if flags.four_screen() {
            Mirroring::FourScreen
        } else if flags.vertical_mirroring() {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };

        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&prg);
        hasher.update(&chr);
        let fingerprint = hasher.finalize();

        log::debug!(
            "iNES image: mapper {mapper}, {} KiB PRG, {} KiB CHR, {mirroring:?}, battery {}, crc {fingerprint:08x}",
            prg.len() / 1024,
            chr.len() / 1024,
            flags.battery_prg_ram(),
        );

        Ok(Self {
            prg,
            chr,
            mapper,
            mirroring,
            battery: flags.battery_prg_ram(),
            fingerprint,
        })
    }
}

fn section<'a>(
    bin: &'a [u8],
    start: usize,
    len: usize,
    name: &'static str,
) -> Result<&'a [u8], RomError> {
    bin.get(start..start + len).ok_or(RomError::Truncated {
        section: name,
        expected: len,
        got: bin.len().saturating_sub(start),
    })
}
