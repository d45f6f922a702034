use crate::{
    carts::{Board, CartBus, Rom},
    frame::{Frame, HEIGHT, WIDTH},
    ppu::{Ppu, PpuStatus, DOTS_PER_LINE, LINES_PER_FRAME, VBLANK_LINE},
    testing::demo_rom,
};

struct Rig {
    rom: Rom,
    board: Board,
    ppu: Ppu,
    frame: Frame,
}

impl Rig {
    fn new() -> Self {
        let rom = Rom::parse(&demo_rom()).unwrap();
        let board = Board::new(&rom).unwrap();
        Self {
            rom,
            board,
            ppu: Ppu::new(),
            frame: Frame::new(),
        }
    }

    fn write(&mut self, addr: u16, v: u8) {
        let mut cart = CartBus {
            board: &mut self.board,
            rom: &self.rom,
        };
        self.ppu.cpu_write_register(&mut cart, addr, v);
    }

    fn read(&mut self, addr: u16) -> u8 {
        let mut cart = CartBus {
            board: &mut self.board,
            rom: &self.rom,
        };
        self.ppu.cpu_read_register(&mut cart, addr)
    }

    fn set_addr(&mut self, addr: u16) {
        let [hi, lo] = addr.to_be_bytes();
        self.write(0x2006, hi);
        self.write(0x2006, lo);
    }

    fn run(&mut self, dots: u64) -> bool {
        let mut cart = CartBus {
            board: &mut self.board,
            rom: &self.rom,
        };
        self.ppu.run(dots, &mut cart, &mut self.frame, 8)
    }

    fn run_to_vblank(&mut self) {
        let mut dots = 0;
        while !self.run(1) {
            dots += 1;
            assert!(dots < 2 * DOTS_PER_LINE as u64 * LINES_PER_FRAME as u64);
        }
    }
}

#[test]
fn vblank_starts_on_line_241_dot_1() {
    let mut rig = Rig::new();
    assert!(!rig.run(VBLANK_LINE as u64 * DOTS_PER_LINE as u64 + 1));
    assert!(!rig.ppu.status.contains(PpuStatus::VBLANK));
    assert!(rig.run(1));
    assert!(rig.ppu.status.contains(PpuStatus::VBLANK));
}

#[test]
fn status_read_clears_vblank() {
    let mut rig = Rig::new();
    rig.run_to_vblank();

    assert_ne!(rig.read(0x2002) & 0x80, 0);
    assert_eq!(rig.read(0x2002) & 0x80, 0);
}

#[test]
fn nmi_raised_at_vblank_when_enabled() {
    let mut rig = Rig::new();
    rig.write(0x2000, 0x80);
    rig.run_to_vblank();

    assert!(rig.ppu.take_nmi());
    assert!(!rig.ppu.take_nmi());
}

#[test]
fn enabling_nmi_inside_vblank_fires() {
    let mut rig = Rig::new();
    rig.run_to_vblank();
    assert!(!rig.ppu.take_nmi());

    rig.write(0x2000, 0x80);
    assert!(rig.ppu.take_nmi());
}

#[test]
fn vram_reads_are_buffered() {
    let mut rig = Rig::new();
    rig.set_addr(0x2000);
    rig.write(0x2007, 0x11);
    rig.write(0x2007, 0x22);

    rig.set_addr(0x2000);
    rig.read(0x2007);
    assert_eq!(rig.read(0x2007), 0x11);
    assert_eq!(rig.read(0x2007), 0x22);
}

#[test]
fn increment_32_steps_down_a_column() {
    let mut rig = Rig::new();
    rig.write(0x2000, 0x04);
    rig.set_addr(0x2000);
    rig.write(0x2007, 0x33);
    rig.write(0x2007, 0x44);

    rig.write(0x2000, 0x00);
    rig.set_addr(0x2020);
    rig.read(0x2007);
    assert_eq!(rig.read(0x2007), 0x44);
}

#[test]
fn palette_reads_are_immediate_and_mirrored() {
    let mut rig = Rig::new();
    rig.set_addr(0x3F10);
    rig.write(0x2007, 0x2A);

    rig.set_addr(0x3F00);
    assert_eq!(rig.read(0x2007), 0x2A);

    // Palette entries are six bits wide
    rig.set_addr(0x3F05);
    rig.write(0x2007, 0xFF);
    rig.set_addr(0x3F05);
    assert_eq!(rig.read(0x2007) & 0x3F, 0x3F);
}

#[test]
fn oam_address_and_data() {
    let mut rig = Rig::new();
    rig.write(0x2003, 0x10);
    rig.write(0x2004, 0xAB);
    rig.write(0x2004, 0xCD);

    rig.write(0x2003, 0x11);
    assert_eq!(rig.read(0x2004), 0xCD);
    assert_eq!(rig.ppu.oam[0x10], 0xAB);
}

#[test]
fn disabled_rendering_fills_with_backdrop() {
    let mut rig = Rig::new();
    rig.set_addr(0x3F00);
    rig.write(0x2007, 0x21);
    rig.run_to_vblank();

    let base = rig.frame.row(0)[0];
    assert!(rig.frame.row(HEIGHT - 1).iter().all(|&p| p == base));
    assert_eq!(rig.frame.palette[base as usize], 0x21);
}

#[test]
fn background_pixels_index_the_frame_palette() {
    let mut rig = Rig::new();

    rig.set_addr(0x3F00);
    for v in [0x0F, 0x21, 0x11, 0x01] {
        rig.write(0x2007, v);
    }
    // Tile 1 is solid color 1
    rig.set_addr(0x2000);
    for _ in 0..960 {
        rig.write(0x2007, 0x01);
    }
    rig.set_addr(0x2000);
    rig.write(0x2001, 0x0A);

    // The second frame starts from the scroll latched on the pre-render line
    rig.run_to_vblank();
    rig.run_to_vblank();

    for y in [0, 100, HEIGHT - 1] {
        let row = rig.frame.row(y);
        assert_eq!(row.len(), WIDTH);
        for &p in row {
            assert_eq!(rig.frame.palette[p as usize], 0x21);
        }
    }
}

#[test]
fn greyscale_and_emphasis_get_their_own_block() {
    let mut rig = Rig::new();
    rig.set_addr(0x3F00);
    rig.write(0x2007, 0x16);
    rig.write(0x2001, 0x21);
    rig.run_to_vblank();

    let p = rig.frame.row(10)[0];
    // Greyscale keeps the luma column, red emphasis is index 1
    assert_eq!(rig.frame.palette[p as usize], 0x10 | 1 << 6);
}
