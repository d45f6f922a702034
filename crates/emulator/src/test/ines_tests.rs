use crate::{
    carts::{Mirroring, Rom, CHR_BANK_SIZE, PRG_BANK_SIZE},
    error::RomError,
    testing::{demo_rom, demo_rom_with, TestCart},
};

#[test]
fn parses_demo_image() {
    let rom = Rom::parse(&demo_rom()).unwrap();
    assert_eq!(rom.mapper, 0);
    assert_eq!(rom.prg.len(), PRG_BANK_SIZE);
    assert_eq!(rom.chr.len(), CHR_BANK_SIZE);
    assert_eq!(rom.mirroring, Mirroring::Vertical);
    assert!(rom.battery);
}

#[test]
fn mapper_number_spans_both_nibbles() {
    let bin = demo_rom_with(&TestCart::new().mapper(7).prg_banks(2));
    let rom = Rom::parse(&bin).unwrap();
    assert_eq!(rom.mapper, 7);
    assert_eq!(rom.prg.len(), 2 * PRG_BANK_SIZE);
}

#[test]
fn chr_ram_boards_have_no_chr_rom() {
    let rom = Rom::parse(&demo_rom_with(&TestCart::new().chr_ram())).unwrap();
    assert!(rom.chr.is_empty());
}

#[test]
fn rejects_short_input() {
    assert_eq!(Rom::parse(b"NES\x1A"), Err(RomError::TooShort));
}

#[test]
fn rejects_bad_magic() {
    let mut bin = demo_rom();
    bin[0] = b'X';
    assert_eq!(Rom::parse(&bin), Err(RomError::BadMagic));
}

#[test]
fn rejects_nes2() {
    let mut bin = demo_rom();
    bin[7] |= 0x08;
    assert_eq!(Rom::parse(&bin), Err(RomError::Nes2Unsupported));
}

#[test]
fn rejects_playchoice() {
    let mut bin = demo_rom();
    bin[7] |= 0x02;
    assert_eq!(Rom::parse(&bin), Err(RomError::PlayChoiceUnsupported));
}

#[test]
fn rejects_unsupported_mapper() {
    let bin = demo_rom_with(&TestCart::new().mapper(4));
    assert_eq!(Rom::parse(&bin), Err(RomError::UnsupportedMapper(4)));
}

#[test]
fn dirty_header_drops_upper_mapper_nibble() {
    // Mapper 0x10 | 1 with junk in the padding reads as mapper 1
    let mut bin = demo_rom_with(&TestCart::new().mapper(0x11));
    bin[12..16].copy_from_slice(b"Ni03");
    assert_eq!(Rom::parse(&bin).unwrap().mapper, 1);
}

#[test]
fn rejects_truncated_prg() {
    let bin = demo_rom();
    let err = Rom::parse(&bin[..16 + 100]).unwrap_err();
    assert_eq!(
        err,
        RomError::Truncated {
            section: "PRG ROM",
            expected: PRG_BANK_SIZE,
            got: 100,
        }
    );
}

#[test]
fn rejects_missing_prg() {
    let mut bin = demo_rom();
    bin[4] = 0;
    assert_eq!(Rom::parse(&bin), Err(RomError::NoPrgRom));
}

#[test]
fn skips_trainer() {
    let bin = demo_rom();
    let mut with_trainer = bin[..16].to_vec();
    with_trainer[6] |= 0x04;
    with_trainer.extend_from_slice(&[0xAB; 512]);
    with_trainer.extend_from_slice(&bin[16..]);

    let plain = Rom::parse(&bin).unwrap();
    let trained = Rom::parse(&with_trainer).unwrap();
    assert_eq!(plain.prg, trained.prg);
    assert_eq!(plain.fingerprint, trained.fingerprint);
}

#[test]
fn fingerprint_tracks_contents() {
    let bin = demo_rom();
    let mut other = bin.clone();
    *other.last_mut().unwrap() ^= 0xFF;

    let a = Rom::parse(&bin).unwrap();
    let b = Rom::parse(&other).unwrap();
    assert_ne!(a.fingerprint, b.fingerprint);
}
