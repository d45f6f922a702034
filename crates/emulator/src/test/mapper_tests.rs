use crate::carts::{Board, CartBus, Mirroring, Rom, CHR_BANK_SIZE, PRG_BANK_SIZE};

/// A ROM where every 16 KiB PRG bank and every 4 KiB CHR bank is filled with its own index.
fn tagged_rom(mapper: u8, prg_banks: usize, chr_banks: usize) -> Rom {
    let mut prg = vec![0; prg_banks * PRG_BANK_SIZE];
    for (i, bank) in prg.chunks_mut(PRG_BANK_SIZE).enumerate() {
        bank.fill(i as u8);
    }
    let mut chr = vec![0; chr_banks * CHR_BANK_SIZE];
    for (i, bank) in chr.chunks_mut(0x1000).enumerate() {
        bank.fill(i as u8);
    }

    Rom {
        prg,
        chr,
        mapper,
        mirroring: Mirroring::Horizontal,
        battery: false,
        fingerprint: 0,
    }
}

fn mmc1_load(cart: &mut CartBus, addr: u16, v: u8) {
    for bit in 0..5 {
        cart.cpu_write(addr, (v >> bit) & 1);
    }
}

#[test]
fn nrom_128_mirrors_upper_half() {
    let mut rom = tagged_rom(0, 1, 1);
    rom.prg[0x1234] = 0x99;
    let mut board = Board::new(&rom).unwrap();
    let cart = CartBus {
        board: &mut board,
        rom: &rom,
    };

    assert_eq!(cart.cpu_read(0x9234), Some(0x99));
    assert_eq!(cart.cpu_read(0xD234), Some(0x99));
}

#[test]
fn prg_ram_reads_and_writes() {
    let rom = tagged_rom(0, 1, 1);
    let mut board = Board::new(&rom).unwrap();
    let mut cart = CartBus {
        board: &mut board,
        rom: &rom,
    };

    assert_eq!(cart.cpu_read(0x6000), Some(0xFF));
    cart.cpu_write(0x7FFF, 0x42);
    assert_eq!(cart.cpu_read(0x7FFF), Some(0x42));
    assert_eq!(cart.cpu_read(0x5000), None);
}

#[test]
fn uxrom_switches_lower_bank() {
    let rom = tagged_rom(2, 4, 0);
    let mut board = Board::new(&rom).unwrap();
    let mut cart = CartBus {
        board: &mut board,
        rom: &rom,
    };

    assert_eq!(cart.cpu_read(0x8000), Some(0));
    assert_eq!(cart.cpu_read(0xC000), Some(3));

    cart.cpu_write(0x8000, 2);
    assert_eq!(cart.cpu_read(0x8000), Some(2));
    assert_eq!(cart.cpu_read(0xFFFF), Some(3));
}

#[test]
fn cnrom_switches_chr() {
    let rom = tagged_rom(3, 1, 4);
    let mut board = Board::new(&rom).unwrap();
    let mut cart = CartBus {
        board: &mut board,
        rom: &rom,
    };

    assert_eq!(cart.chr_read(0x0000), 0);
    cart.cpu_write(0x8000, 2);
    assert_eq!(cart.chr_read(0x0000), 4);
    assert_eq!(cart.chr_read(0x1000), 5);
}

#[test]
fn axrom_switches_32k_and_screen() {
    let rom = tagged_rom(7, 8, 0);
    let mut board = Board::new(&rom).unwrap();
    let mut cart = CartBus {
        board: &mut board,
        rom: &rom,
    };

    assert_eq!(cart.mirroring(), Mirroring::SingleScreenLower);
    cart.cpu_write(0x8000, 0x11);
    assert_eq!(cart.cpu_read(0x8000), Some(2));
    assert_eq!(cart.cpu_read(0xC000), Some(3));
    assert_eq!(cart.mirroring(), Mirroring::SingleScreenUpper);
}

#[test]
fn mmc1_power_on_fixes_last_bank() {
    let rom = tagged_rom(1, 8, 2);
    let mut board = Board::new(&rom).unwrap();
    let mut cart = CartBus {
        board: &mut board,
        rom: &rom,
    };

    assert_eq!(cart.cpu_read(0x8000), Some(0));
    assert_eq!(cart.cpu_read(0xC000), Some(7));

    mmc1_load(&mut cart, 0xE000, 3);
    assert_eq!(cart.cpu_read(0x8000), Some(3));
    assert_eq!(cart.cpu_read(0xC000), Some(7));
}

#[test]
fn mmc1_control_modes() {
    let rom = tagged_rom(1, 8, 2);
    let mut board = Board::new(&rom).unwrap();
    let mut cart = CartBus {
        board: &mut board,
        rom: &rom,
    };

    // Vertical mirroring, first bank fixed at $8000, 4 KiB CHR banks
    mmc1_load(&mut cart, 0x8000, 0x1A);
    mmc1_load(&mut cart, 0xE000, 5);
    mmc1_load(&mut cart, 0xA000, 3);
    mmc1_load(&mut cart, 0xC000, 1);

    assert_eq!(cart.mirroring(), Mirroring::Vertical);
    assert_eq!(cart.cpu_read(0x8000), Some(0));
    assert_eq!(cart.cpu_read(0xC000), Some(5));
    assert_eq!(cart.chr_read(0x0000), 3);
    assert_eq!(cart.chr_read(0x1000), 1);

    // 32 KiB mode ignores the low bank bit
    mmc1_load(&mut cart, 0x8000, 0x00);
    assert_eq!(cart.cpu_read(0x8000), Some(4));
    assert_eq!(cart.cpu_read(0xC000), Some(5));
    assert_eq!(cart.mirroring(), Mirroring::SingleScreenLower);
}

#[test]
fn mmc1_reset_bit_restores_fixed_last_bank() {
    let rom = tagged_rom(1, 8, 2);
    let mut board = Board::new(&rom).unwrap();
    let mut cart = CartBus {
        board: &mut board,
        rom: &rom,
    };

    mmc1_load(&mut cart, 0x8000, 0x00);
    cart.cpu_write(0x8000, 1);
    cart.cpu_write(0x8000, 0x80);

    assert_eq!(cart.cpu_read(0xC000), Some(7));
}

#[test]
fn mmc1_can_disable_prg_ram() {
    let rom = tagged_rom(1, 2, 1);
    let mut board = Board::new(&rom).unwrap();
    let mut cart = CartBus {
        board: &mut board,
        rom: &rom,
    };

    cart.cpu_write(0x6000, 0x12);
    mmc1_load(&mut cart, 0xE000, 0x10);
    assert_eq!(cart.cpu_read(0x6000), None);
    cart.cpu_write(0x6000, 0x34);

    mmc1_load(&mut cart, 0xE000, 0x00);
    assert_eq!(cart.cpu_read(0x6000), Some(0x12));
}

#[test]
fn chr_rom_ignores_writes_chr_ram_keeps_them() {
    let rom = tagged_rom(0, 1, 1);
    let mut board = Board::new(&rom).unwrap();
    let mut cart = CartBus {
        board: &mut board,
        rom: &rom,
    };
    cart.chr_write(0x0010, 0xAA);
    assert_eq!(cart.chr_read(0x0010), 0);

    let rom = tagged_rom(2, 2, 0);
    let mut board = Board::new(&rom).unwrap();
    let mut cart = CartBus {
        board: &mut board,
        rom: &rom,
    };
    cart.chr_write(0x1FFF, 0xAA);
    assert_eq!(cart.chr_read(0x1FFF), 0xAA);
}

#[test]
fn board_fits_only_its_cartridge() {
    let chr_rom = tagged_rom(0, 1, 1);
    let chr_ram = tagged_rom(0, 1, 0);
    let board = Board::new(&chr_rom).unwrap();

    assert!(board.fits(&chr_rom));
    assert!(!board.fits(&chr_ram));
    assert!(!board.fits(&tagged_rom(2, 1, 1)));
}

#[test]
fn nametable_mirroring() {
    assert_eq!(Mirroring::Horizontal.nametable_offset(0x2400), 0x000);
    assert_eq!(Mirroring::Horizontal.nametable_offset(0x2800), 0x400);
    assert_eq!(Mirroring::Vertical.nametable_offset(0x2400), 0x400);
    assert_eq!(Mirroring::Vertical.nametable_offset(0x2C05), 0x405);
    assert_eq!(Mirroring::SingleScreenUpper.nametable_offset(0x2000), 0x400);
    assert_eq!(Mirroring::FourScreen.nametable_offset(0x2C00), 0xC00);
    assert_eq!(Mirroring::Horizontal.nametable_offset(0x3000), 0x000);
}
