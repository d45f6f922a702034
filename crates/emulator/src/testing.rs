//! Small cartridges assembled in memory, so tests do not depend on ROM files.

use crate::carts::{CHR_BANK_SIZE, PRG_BANK_SIZE};

const NMI_HANDLER: u16 = 0x8090;
const IRQ_HANDLER: u16 = 0x80E2;
const PALETTE_DATA: usize = 0x0100;
const SPRITE_DATA: usize = 0x0120;

/// Reset code: wait for the PPU, upload palette, nametable and sprites, start a square wave,
/// enable rendering and NMI, then spin.
#[rustfmt::skip]
const RESET_CODE: [u8; 0x7B] = [
    0x78,                   // SEI
    0xD8,                   // CLD
    0xA2, 0xFF,             // LDX #$FF
    0x9A,                   // TXS
    0x2C, 0x02, 0x20,       // BIT $2002
    0x10, 0xFB,             // BPL -5
    0x2C, 0x02, 0x20,       // BIT $2002
    0x10, 0xFB,             // BPL -5
    // Palette
    0xA9, 0x3F,             // LDA #$3F
    0x8D, 0x06, 0x20,       // STA $2006
    0xA9, 0x00,             // LDA #$00
    0x8D, 0x06, 0x20,       // STA $2006
    0xA2, 0x00,             // LDX #$00
    0xBD, 0x00, 0x81,       // LDA $8100,X
    0x8D, 0x07, 0x20,       // STA $2007
    0xE8,                   // INX
    0xE0, 0x20,             // CPX #$20
    0xD0, 0xF5,             // BNE -11
    // Nametable 0 and its attributes, tile X & 3
    0xA9, 0x20,             // LDA #$20
    0x8D, 0x06, 0x20,       // STA $2006
    0xA9, 0x00,             // LDA #$00
    0x8D, 0x06, 0x20,       // STA $2006
    0xA0, 0x04,             // LDY #$04
    0xA2, 0x00,             // LDX #$00
    0x8A,                   // TXA
    0x29, 0x03,             // AND #$03
    0x8D, 0x07, 0x20,       // STA $2007
    0xE8,                   // INX
    0xD0, 0xF7,             // BNE -9
    0x88,                   // DEY
    0xD0, 0xF4,             // BNE -12
    // Sprites into the DMA page
    0xA2, 0x00,             // LDX #$00
    0xBD, 0x20, 0x81,       // LDA $8120,X
    0x9D, 0x00, 0x02,       // STA $0200,X
    0xE8,                   // INX
    0xE0, 0x10,             // CPX #$10
    0xD0, 0xF5,             // BNE -11
    // Pulse 1, constant volume, about 440 Hz
    0xA9, 0x01,             // LDA #$01
    0x8D, 0x15, 0x40,       // STA $4015
    0xA9, 0xBF,             // LDA #$BF
    0x8D, 0x00, 0x40,       // STA $4000
    0xA9, 0xFD,             // LDA #$FD
    0x8D, 0x02, 0x40,       // STA $4002
    0xA9, 0x00,             // LDA #$00
    0x8D, 0x03, 0x40,       // STA $4003
    0xA9, 0x40,             // LDA #$40
    0x8D, 0x17, 0x40,       // STA $4017
    // Scroll, NMI on, show everything
    0xA9, 0x00,             // LDA #$00
    0x8D, 0x05, 0x20,       // STA $2005
    0x8D, 0x05, 0x20,       // STA $2005
    0xA9, 0x80,             // LDA #$80
    0x8D, 0x00, 0x20,       // STA $2000
    0xA9, 0x1E,             // LDA #$1E
    0x8D, 0x01, 0x20,       // STA $2001
    0x4C, 0x78, 0x80,       // JMP $8078
];

/// NMI: sprite DMA, read joypad 1 into `$6000`, count frames in `$6001` and `$11`, move
/// sprite 0 and cycle the backdrop color.
#[rustfmt::skip]
const NMI_CODE: [u8; 0x53] = [
    0x48,                   // PHA
    0x8A,                   // TXA
    0x48,                   // PHA
    0xA9, 0x02,             // LDA #$02
    0x8D, 0x14, 0x40,       // STA $4014
    0xA9, 0x01,             // LDA #$01
    0x8D, 0x16, 0x40,       // STA $4016
    0xA9, 0x00,             // LDA #$00
    0x8D, 0x16, 0x40,       // STA $4016
    0xA2, 0x08,             // LDX #$08
    0xAD, 0x16, 0x40,       // LDA $4016
    0x4A,                   // LSR A
    0x26, 0x10,             // ROL $10
    0xCA,                   // DEX
    0xD0, 0xF7,             // BNE -9
    0xA5, 0x10,             // LDA $10
    0x8D, 0x00, 0x60,       // STA $6000
    0xEE, 0x01, 0x60,       // INC $6001
    0xE6, 0x11,             // INC $11
    0xA5, 0x11,             // LDA $11
    0x8D, 0x03, 0x02,       // STA $0203
    0xAD, 0x02, 0x20,       // LDA $2002
    0xA9, 0x3F,             // LDA #$3F
    0x8D, 0x06, 0x20,       // STA $2006
    0xA9, 0x00,             // LDA #$00
    0x8D, 0x06, 0x20,       // STA $2006
    0xA5, 0x11,             // LDA $11
    0x4A,                   // LSR A
    0x4A,                   // LSR A
    0x29, 0x3F,             // AND #$3F
    0x8D, 0x07, 0x20,       // STA $2007
    0xA9, 0x00,             // LDA #$00
    0x8D, 0x05, 0x20,       // STA $2005
    0x8D, 0x05, 0x20,       // STA $2005
    0xA9, 0x80,             // LDA #$80
    0x8D, 0x00, 0x20,       // STA $2000
    0x68,                   // PLA
    0xAA,                   // TAX
    0x68,                   // PLA
    0x40,                   // RTI
];

#[rustfmt::skip]
const PALETTE: [u8; 32] = [
    0x0F, 0x01, 0x11, 0x21, 0x0F, 0x06, 0x16, 0x26, 0x0F, 0x09, 0x19, 0x29, 0x0F, 0x02, 0x12, 0x22,
    0x0F, 0x16, 0x27, 0x18, 0x0F, 0x1A, 0x2A, 0x3A, 0x0F, 0x14, 0x24, 0x34, 0x0F, 0x30, 0x10, 0x00,
];

/// Y, tile, attributes, X. The last one sits behind the background.
#[rustfmt::skip]
const SPRITES: [u8; 16] = [
    0x40, 0x01, 0x00, 0x20,
    0x40, 0x02, 0x01, 0x30,
    0x60, 0x03, 0x42, 0x50,
    0x80, 0x01, 0x23, 0x70,
];

/// Builds iNES images around one 16 KiB program bank, repeated for every bank.
#[derive(Debug, Clone)]
pub struct TestCart {
    mapper: u8,
    prg_banks: u8,
    chr_rom: bool,
    battery: bool,
}

impl Default for TestCart {
    fn default() -> Self {
        Self::new()
    }
}

impl TestCart {
    pub fn new() -> Self {
        Self {
            mapper: 0,
            prg_banks: 1,
            chr_rom: true,
            battery: false,
        }
    }

    pub fn mapper(mut self, mapper: u8) -> Self {
        self.mapper = mapper;
        self
    }

    pub fn prg_banks(mut self, banks: u8) -> Self {
        self.prg_banks = banks;
        self
    }

    pub fn battery(mut self, battery: bool) -> Self {
        self.battery = battery;
        self
    }

    /// Leave out CHR ROM so the board gets CHR RAM.
    pub fn chr_ram(mut self) -> Self {
        self.chr_rom = false;
        self
    }

    pub fn build(&self, bank: &[u8; PRG_BANK_SIZE], chr: &[u8; CHR_BANK_SIZE]) -> Vec<u8> {
        let mut out = Vec::with_capacity(
            16 + self.prg_banks as usize * PRG_BANK_SIZE + CHR_BANK_SIZE,
        );
        out.extend_from_slice(b"NES\x1A");
        out.push(self.prg_banks);
        out.push(self.chr_rom as u8);
        out.push((self.mapper & 0x0F) << 4 | (self.battery as u8) << 1 | 1);
        out.push(self.mapper & 0xF0);
        out.extend_from_slice(&[0; 8]);

        for _ in 0..self.prg_banks {
            out.extend_from_slice(bank);
        }
        if self.chr_rom {
            out.extend_from_slice(chr);
        }
        out
    }
}

fn set_vectors(bank: &mut [u8; PRG_BANK_SIZE], nmi: u16, reset: u16, irq: u16) {
    let vectors = PRG_BANK_SIZE - 6;
    bank[vectors..vectors + 2].copy_from_slice(&nmi.to_le_bytes());
    bank[vectors + 2..vectors + 4].copy_from_slice(&reset.to_le_bytes());
    bank[vectors + 4..].copy_from_slice(&irq.to_le_bytes());
}

fn demo_bank() -> Box<[u8; PRG_BANK_SIZE]> {
    let mut bank = Box::new([0xEA; PRG_BANK_SIZE]);
    let nmi = (NMI_HANDLER - 0x8000) as usize;

    bank[..RESET_CODE.len()].copy_from_slice(&RESET_CODE);
    bank[nmi..nmi + NMI_CODE.len()].copy_from_slice(&NMI_CODE);
    bank[PALETTE_DATA..PALETTE_DATA + PALETTE.len()].copy_from_slice(&PALETTE);
    bank[SPRITE_DATA..SPRITE_DATA + SPRITES.len()].copy_from_slice(&SPRITES);
    set_vectors(&mut bank, NMI_HANDLER, 0x8000, IRQ_HANDLER);
    bank
}

/// Tile 0 blank, tile 1 color 1, tile 2 color 2, tile 3 alternating 1 and 2.
fn demo_chr() -> Box<[u8; CHR_BANK_SIZE]> {
    let mut chr = Box::new([0; CHR_BANK_SIZE]);
    chr[0x10..0x18].fill(0xFF);
    chr[0x28..0x30].fill(0xFF);
    chr[0x30..0x38].fill(0xAA);
    chr[0x38..0x40].fill(0x55);
    chr
}

/// The demo program on a cartridge shaped by `cart`.
pub fn demo_rom_with(cart: &TestCart) -> Vec<u8> {
    cart.build(&demo_bank(), &demo_chr())
}

/// The demo program on NROM-128 with battery backed PRG RAM.
pub fn demo_rom() -> Vec<u8> {
    demo_rom_with(&TestCart::new().battery(true))
}

/// A cartridge whose first instruction halts the CPU.
pub fn jam_rom() -> Vec<u8> {
    let mut bank = Box::new([0xEA; PRG_BANK_SIZE]);
    bank[0] = 0x02;
    set_vectors(&mut bank, 0x8000, 0x8000, 0x8000);
    TestCart::new().build(&bank, &demo_chr())
}
