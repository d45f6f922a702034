use bitflags::bitflags;

use crate::{
    carts::CartBus,
    error::{ensure, StateError},
    frame::{Frame, WIDTH},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct PpuCtrl(u8);

bitflags! {
    impl PpuCtrl: u8 {
        const NAMETABLE_X       = 0b00000001;
        const NAMETABLE_Y       = 0b00000010;
        const VRAM_INCREMENT_32 = 0b00000100;
        const SPRITE_TABLE      = 0b00001000;
        const BACKGROUND_TABLE  = 0b00010000;
        const SPRITE_SIZE_16    = 0b00100000;
        const MASTER_SLAVE      = 0b01000000;
        const NMI_ENABLE        = 0b10000000;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct PpuMask(u8);

bitflags! {
    impl PpuMask: u8 {
        const GREYSCALE         = 0b00000001;
        const SHOW_BG_LEFT      = 0b00000010;
        const SHOW_SPRITES_LEFT = 0b00000100;
        const SHOW_BG           = 0b00001000;
        const SHOW_SPRITES      = 0b00010000;
        const EMPHASIZE_RED     = 0b00100000;
        const EMPHASIZE_GREEN   = 0b01000000;
        const EMPHASIZE_BLUE    = 0b10000000;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct PpuStatus(u8);

bitflags! {
    impl PpuStatus: u8 {
        const SPRITE_OVERFLOW = 0b00100000;
        const SPRITE_0_HIT    = 0b01000000;
        const VBLANK          = 0b10000000;
    }
}

pub const DOTS_PER_LINE: u16 = 341;
pub const LINES_PER_FRAME: u16 = 262;
pub const VBLANK_LINE: u16 = 241;
pub const PRE_RENDER_LINE: u16 = 261;

/// The 2C02 picture processor.
///
/// Rendering is done a scanline at a time at the start of each visible line, using the loopy
/// `v`/`t` scroll registers the way the hardware latches them. Everything else (vblank, flag
/// clearing, scroll copies, the odd frame skip) happens on its exact dot.
#[derive(Clone, bincode::Encode, bincode::Decode)]
pub struct Ppu {
    pub ctrl: PpuCtrl,
    pub mask: PpuMask,
    pub status: PpuStatus,

    pub oam: [u8; 256],
    oam_addr: u8,

    /// Current VRAM address
    v: u16,
    /// Temporary VRAM address, the top left of the screen
    t: u16,
    fine_x: u8,
    /// Write toggle shared by PPUSCROLL and PPUADDR
    w: bool,

    read_buffer: u8,
    open_bus: u8,

    palette: [u8; 32],
    /// Nametable memory, 2 KiB on the console plus 2 KiB for four screen boards
    vram: [u8; 0x1000],

    pub scanline: u16,
    pub dot: u16,
    odd_frame: bool,

    nmi_pending: bool,
    sprite0_hit_dot: Option<u16>,
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new()
    }
}

impl Ppu {
    pub fn new() -> Self {
        Self {
            ctrl: PpuCtrl::empty(),
            mask: PpuMask::empty(),
            status: PpuStatus::empty(),
            oam: [0; 256],
            oam_addr: 0,
            v: 0,
            t: 0,
            fine_x: 0,
            w: false,
            read_buffer: 0,
            open_bus: 0,
            palette: [0; 32],
            vram: [0; 0x1000],
            scanline: 0,
            dot: 0,
            odd_frame: false,
            nmi_pending: false,
            sprite0_hit_dot: None,
        }
    }

    /// Soft reset, memory survives.
    pub fn reset(&mut self) {
        self.ctrl = PpuCtrl::empty();
        self.mask = PpuMask::empty();
        self.w = false;
        self.read_buffer = 0;
        self.fine_x = 0;
        self.t = 0;
        self.odd_frame = false;
        self.nmi_pending = false;
    }

    /// Check the fields the renderer relies on after a save state was decoded.
    pub(crate) fn validate(&self) -> Result<(), StateError> {
        ensure(self.scanline < LINES_PER_FRAME, "PPU scanline")?;
        ensure(self.dot < DOTS_PER_LINE, "PPU dot")?;
        ensure(self.fine_x < 8, "PPU fine x scroll")?;
        ensure(self.v < 0x8000 && self.t < 0x8000, "PPU VRAM address")?;
        ensure(self.palette.iter().all(|&c| c < 0x40), "PPU palette RAM")
    }

    fn rendering_enabled(&self) -> bool {
        self.mask
            .intersects(PpuMask::SHOW_BG | PpuMask::SHOW_SPRITES)
    }

    /// Take a pending NMI, the CPU services it before its next instruction.
    pub fn take_nmi(&mut self) -> bool {
        std::mem::take(&mut self.nmi_pending)
    }

    /// Advance `dots` PPU cycles, returns true if vblank started during them.
    pub fn run(
        &mut self,
        dots: u64,
        cart: &mut CartBus,
        frame: &mut Frame,
        sprite_limit: usize,
    ) -> bool {
        let mut frame_done = false;
        for _ in 0..dots {
            frame_done |= self.tick(cart, frame, sprite_limit);
        }
        frame_done
    }

    fn tick(&mut self, cart: &mut CartBus, frame: &mut Frame, sprite_limit: usize) -> bool {
        let rendering = self.rendering_enabled();
        let mut vblank_started = false;

        match (self.scanline, self.dot) {
            (0..=239, 1) => self.render_line(cart, frame, sprite_limit),
            (0..=239, 256) if rendering => self.increment_y(),
            (0..=239 | PRE_RENDER_LINE, 257) if rendering => self.copy_x(),
            (VBLANK_LINE, 1) => {
                self.status |= PpuStatus::VBLANK;
                if self.ctrl.contains(PpuCtrl::NMI_ENABLE) {
                    self.nmi_pending = true;
                }
                vblank_started = true;
            }
            (PRE_RENDER_LINE, 1) => {
                self.status.remove(
                    PpuStatus::VBLANK | PpuStatus::SPRITE_0_HIT | PpuStatus::SPRITE_OVERFLOW,
                );
                frame.palettes.clear();
            }
            (PRE_RENDER_LINE, 304) if rendering => self.copy_y(),
            _ => {}
        }

        if let Some(hit_dot) = self.sprite0_hit_dot {
            if self.dot >= hit_dot {
                self.status |= PpuStatus::SPRITE_0_HIT;
                self.sprite0_hit_dot = None;
            }
        }

        self.dot += 1;
        // The pre-render line is one dot shorter on odd frames
        if self.scanline == PRE_RENDER_LINE && self.dot == 340 && self.odd_frame && rendering {
            self.dot += 1;
        }
        if self.dot >= DOTS_PER_LINE {
            self.dot = 0;
            self.scanline += 1;
            if self.scanline == LINES_PER_FRAME {
                self.scanline = 0;
                self.odd_frame = !self.odd_frame;
            }
        }

        vblank_started
    }

    fn increment_y(&mut self) {
        if self.v & 0x7000 != 0x7000 {
            self.v += 0x1000;
            return;
        }

        self.v &= !0x7000;
        let mut coarse_y = (self.v & 0x03E0) >> 5;
        if coarse_y == 29 {
            coarse_y = 0;
            self.v ^= 0x0800;
        } else if coarse_y == 31 {
            coarse_y = 0;
        } else {
            coarse_y += 1;
        }
        self.v = (self.v & !0x03E0) | (coarse_y << 5);
    }

    fn copy_x(&mut self) {
        self.v = (self.v & !0x041F) | (self.t & 0x041F);
    }

    fn copy_y(&mut self) {
        self.v = (self.v & !0x7BE0) | (self.t & 0x7BE0);
    }

    // CPU facing registers

    pub fn cpu_read_register(&mut self, cart: &mut CartBus, addr: u16) -> u8 {
        let v = match addr & 7 {
            2 => {
                let v = self.status.bits() | (self.open_bus & 0x1F);
                self.status.remove(PpuStatus::VBLANK);
                self.w = false;
                v
            }
            4 => self.oam[self.oam_addr as usize],
            7 => {
                let addr = self.v & 0x3FFF;
                let v = if addr >= 0x3F00 {
                    // Palette reads are immediate, the buffer gets the nametable underneath
                    self.read_buffer = self.read_mem(cart, addr - 0x1000);
                    self.palette[palette_index(addr)] | (self.open_bus & 0xC0)
                } else {
                    let v = self.read_buffer;
                    self.read_buffer = self.read_mem(cart, addr);
                    v
                };
                self.increment_v();
                v
            }
            _ => self.open_bus,
        };
        self.open_bus = v;
        v
    }

    pub fn cpu_write_register(&mut self, cart: &mut CartBus, addr: u16, v: u8) {
        self.open_bus = v;
        match addr & 7 {
            0 => {
                let was_enabled = self.ctrl.contains(PpuCtrl::NMI_ENABLE);
                self.ctrl = PpuCtrl::from_bits_retain(v);
                self.t = (self.t & !0x0C00) | ((v as u16 & 0x03) << 10);

                // Enabling NMI during vblank fires it right away
                if !was_enabled
                    && self.ctrl.contains(PpuCtrl::NMI_ENABLE)
                    && self.status.contains(PpuStatus::VBLANK)
                {
                    self.nmi_pending = true;
                }
            }
            1 => self.mask = PpuMask::from_bits_retain(v),
            3 => self.oam_addr = v,
            4 => {
                self.oam[self.oam_addr as usize] = v;
                self.oam_addr = self.oam_addr.wrapping_add(1);
            }
            5 => {
                if !self.w {
                    self.t = (self.t & !0x001F) | (v as u16 >> 3);
                    self.fine_x = v & 0x07;
                } else {
                    self.t = (self.t & !0x73E0)
                        | ((v as u16 & 0x07) << 12)
                        | ((v as u16 & 0xF8) << 2);
                }
                self.w = !self.w;
            }
            6 => {
                if !self.w {
                    self.t = (self.t & 0x00FF) | ((v as u16 & 0x3F) << 8);
                } else {
                    self.t = (self.t & 0xFF00) | v as u16;
                    self.v = self.t;
                }
                self.w = !self.w;
            }
            7 => {
                self.write_mem(cart, self.v & 0x3FFF, v);
                self.increment_v();
            }
            _ => {
                log::trace!("write {v:#04x} to read-only PPU register {addr:#06x}");
            }
        }
    }

    /// OAM DMA, one byte at a time starting at the current OAM address.
    pub fn write_oam(&mut self, v: u8) {
        self.oam[self.oam_addr as usize] = v;
        self.oam_addr = self.oam_addr.wrapping_add(1);
    }

    fn increment_v(&mut self) {
        let step = if self.ctrl.contains(PpuCtrl::VRAM_INCREMENT_32) {
            32
        } else {
            1
        };
        self.v = self.v.wrapping_add(step) & 0x7FFF;
    }

    fn read_mem(&self, cart: &CartBus, addr: u16) -> u8 {
        match addr & 0x3FFF {
            0x0000..=0x1FFF => cart.chr_read(addr),
            0x2000..=0x3EFF => self.vram[cart.mirroring().nametable_offset(addr)],
            a => self.palette[palette_index(a)],
        }
    }

    fn write_mem(&mut self, cart: &mut CartBus, addr: u16, v: u8) {
        match addr & 0x3FFF {
            0x0000..=0x1FFF => cart.chr_write(addr, v),
            0x2000..=0x3EFF => self.vram[cart.mirroring().nametable_offset(addr)] = v,
            a => self.palette[palette_index(a)] = v & 0x3F,
        }
    }

    // Rendering

    fn render_line(&mut self, cart: &mut CartBus, frame: &mut Frame, sprite_limit: usize) {
        let y = self.scanline as usize;
        let base = frame
            .palettes
            .block_for(&self.palette, self.mask.bits(), &mut frame.palette);

        self.sprite0_hit_dot = None;

        if !self.rendering_enabled() {
            frame.row_mut(y).fill(base);
            return;
        }

        let bg = if self.mask.contains(PpuMask::SHOW_BG) {
            self.background_line(cart)
        } else {
            [0; WIDTH]
        };

        let sprites = if self.mask.contains(PpuMask::SHOW_SPRITES) {
            self.sprite_line(cart, y, &bg, sprite_limit)
        } else {
            [SpritePixel::default(); WIDTH]
        };

        for (x, out) in frame.row_mut(y).iter_mut().enumerate() {
            let b = bg[x];
            let s = sprites[x];
            let slot = if s.slot != 0 && (b == 0 || !s.behind) {
                s.slot
            } else {
                b
            };
            *out = base + slot;
        }
    }

    /// Background palette slots for the current line, 0 where transparent.
    fn background_line(&self, cart: &CartBus) -> [u8; WIDTH] {
        let mut line = [0u8; WIDTH];

        let table: u16 = if self.ctrl.contains(PpuCtrl::BACKGROUND_TABLE) {
            0x1000
        } else {
            0x0000
        };
        let fine_y = (self.v >> 12) & 0x07;
        let mut v = self.v;

        // 33 tiles cover the line for any fine x scroll
        for tile in 0..33 {
            let tile_idx = self.read_mem(cart, 0x2000 | (v & 0x0FFF)) as u16;
            let attr_addr = 0x23C0 | (v & 0x0C00) | ((v >> 4) & 0x38) | ((v >> 2) & 0x07);
            let shift = ((v >> 4) & 0x04) | (v & 0x02);
            let pal = (self.read_mem(cart, attr_addr) >> shift) & 0x03;

            let pattern = table + tile_idx * 16 + fine_y;
            let lo = cart.chr_read(pattern);
            let hi = cart.chr_read(pattern + 8);

            for px in 0..8 {
                let x = tile * 8 + px - self.fine_x as i32;
                if !(0..WIDTH as i32).contains(&x) {
                    continue;
                }
                let bit = 7 - px;
                let c = ((lo >> bit) & 1) | (((hi >> bit) & 1) << 1);
                if c != 0 {
                    line[x as usize] = pal * 4 + c;
                }
            }

            // Coarse X increment, wrapping into the horizontally adjacent nametable
            if v & 0x001F == 31 {
                v &= !0x001F;
                v ^= 0x0400;
            } else {
                v += 1;
            }
        }

        if !self.mask.contains(PpuMask::SHOW_BG_LEFT) {
            line[..8].fill(0);
        }

        line
    }

    fn sprite_pattern(&self, cart: &CartBus, index: usize, row: u16, height: u16) -> (u8, u8) {
        let tile = self.oam[index * 4 + 1] as u16;
        let attr = self.oam[index * 4 + 2];

        let row = if attr & 0x80 != 0 { height - 1 - row } else { row };

        let (table, tile) = if height == 16 {
            ((tile & 1) * 0x1000, (tile & 0xFE) + row / 8)
        } else if self.ctrl.contains(PpuCtrl::SPRITE_TABLE) {
            (0x1000, tile)
        } else {
            (0x0000, tile)
        };

        let addr = table + tile * 16 + (row % 8);
        let (lo, hi) = (cart.chr_read(addr), cart.chr_read(addr + 8));

        if attr & 0x40 != 0 {
            (lo.reverse_bits(), hi.reverse_bits())
        } else {
            (lo, hi)
        }
    }

    fn sprite_line(
        &mut self,
        cart: &CartBus,
        y: usize,
        bg: &[u8; WIDTH],
        sprite_limit: usize,
    ) -> [SpritePixel; WIDTH] {
        let mut line = [SpritePixel::default(); WIDTH];

        let height: u16 = if self.ctrl.contains(PpuCtrl::SPRITE_SIZE_16) {
            16
        } else {
            8
        };
        let show_left = self.mask.contains(PpuMask::SHOW_SPRITES_LEFT);

        let mut found = 0;
        for i in 0..64 {
            // Sprites are delayed by one line
            let row = y as i32 - (self.oam[i * 4] as i32 + 1);
            if !(0..height as i32).contains(&row) {
                continue;
            }

            found += 1;
            if found > 8 {
                self.status |= PpuStatus::SPRITE_OVERFLOW;
            }

            let (lo, hi) = self.sprite_pattern(cart, i, row as u16, height);
            let attr = self.oam[i * 4 + 2];
            let sprite_x = self.oam[i * 4 + 3] as usize;

            for col in 0..8 {
                let x = sprite_x + col;
                if x >= WIDTH || (x < 8 && !show_left) {
                    continue;
                }
                let bit = 7 - col;
                let c = ((lo >> bit) & 1) | (((hi >> bit) & 1) << 1);
                if c == 0 {
                    continue;
                }

                if i == 0 && bg[x] != 0 && x != 255 && self.sprite0_hit_dot.is_none() {
                    self.sprite0_hit_dot = Some(x as u16 + 1);
                }

                // Lower OAM indices win, even when they are behind the background
                if found <= sprite_limit && line[x].slot == 0 {
                    line[x] = SpritePixel {
                        slot: 16 + (attr & 0x03) * 4 + c,
                        behind: attr & 0x20 != 0,
                    };
                }
            }

            if found > sprite_limit.max(8) {
                break;
            }
        }

        line
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct SpritePixel {
    /// Palette slot, 0 when transparent
    slot: u8,
    behind: bool,
}

/// Index into palette RAM, the backdrop entries of the sprite palettes mirror the background
/// ones.
fn palette_index(addr: u16) -> usize {
    let i = addr as usize & 0x1F;
    if i & 0x13 == 0x10 {
        i & 0x0F
    } else {
        i
    }
}
