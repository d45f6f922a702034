use std::sync::OnceLock;

/// One entry of the global color table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

// 2C02 master palette packed as 0xRRGGBB
const MASTER_PALETTE: [u32; 64] = [
    0x545454, 0x001E74, 0x081090, 0x300088, 0x440064, 0x5C0030, 0x540400, 0x3C1800, //
    0x202A00, 0x083A00, 0x004000, 0x003C00, 0x00323C, 0x000000, 0x000000, 0x000000, //
    0x989698, 0x084CC4, 0x3032EC, 0x5C1EE4, 0x8814B0, 0xA01464, 0x982220, 0x783C00, //
    0x545A00, 0x287200, 0x087C00, 0x007628, 0x006678, 0x000000, 0x000000, 0x000000, //
    0xECEEEC, 0x4C9AEC, 0x787CEC, 0xB062EC, 0xE454EC, 0xEC58B4, 0xEC6A64, 0xD48820, //
    0xA0AA00, 0x74C400, 0x4CD020, 0x38CC6C, 0x38B4CC, 0x3C3C3C, 0x000000, 0x000000, //
    0xECEEEC, 0xA8CCEC, 0xBCBCEC, 0xD4B2EC, 0xECAEEC, 0xECAED4, 0xECC4B0, 0xE4D4A0, //
    0xCCDCA0, 0xB4E4A0, 0xA8E4B4, 0xA0E4CC, 0xA0D4E4, 0xA0A2A0, 0x000000, 0x000000, //
];

/// Entries in the global color table: 64 colors for each of the 8 emphasis combinations.
pub const COLOR_COUNT: usize = 64 * 8;

/// Channel gain applied by each emphasis bit it does not select.
const EMPHASIS_ATTENUATION: f32 = 0.746;

/// The process-wide color table, indexed by `emphasis << 6 | color`.
///
/// Emphasis bit 0 boosts red, bit 1 green and bit 2 blue, which on the composite output
/// amounts to dimming the other two channels.
pub fn nes_colors() -> &'static [Rgb; COLOR_COUNT] {
    static COLORS: OnceLock<[Rgb; COLOR_COUNT]> = OnceLock::new();
    COLORS.get_or_init(build_colors)
}

fn build_colors() -> [Rgb; COLOR_COUNT] {
    let mut colors = [Rgb::default(); COLOR_COUNT];

    for (i, color) in colors.iter_mut().enumerate() {
        let emphasis = i >> 6;
        let [_, r, g, b] = MASTER_PALETTE[i & 0x3F].to_be_bytes();

        let mut gains = [1.0f32; 3];
        for bit in 0..3 {
            if emphasis & (1 << bit) != 0 {
                for (channel, gain) in gains.iter_mut().enumerate() {
                    if channel != bit {
                        *gain *= EMPHASIS_ATTENUATION;
                    }
                }
            }
        }

        let scale = |v: u8, gain: f32| (v as f32 * gain).round() as u8;
        *color = Rgb {
            red: scale(r, gains[0]),
            green: scale(g, gains[1]),
            blue: scale(b, gains[2]),
        };
    }

    colors
}

/// Slots in one palette block, one per palette RAM byte.
pub const BLOCK_SIZE: usize = 32;
/// Blocks that fit in the 256 entry lookup table of a frame.
pub const MAX_BLOCKS: usize = 256 / BLOCK_SIZE;

/// Hands out lookup table blocks for the palettes used during one frame.
///
/// Every distinct combination of palette RAM, greyscale and emphasis seen while rendering gets
/// its own block of 32 lookup entries, so mid-frame palette changes survive into the indexed
/// framebuffer. Pixels are written as `block base + palette RAM index`.
#[derive(Debug, Clone, Default)]
pub struct PaletteAllocator {
    blocks: Vec<([u8; BLOCK_SIZE], u8)>,
}

impl PaletteAllocator {
    pub fn new() -> Self {
        Self {
            blocks: Vec::with_capacity(MAX_BLOCKS),
        }
    }

    /// Forget the blocks of the previous frame.
    pub fn clear(&mut self) {
        self.blocks.clear();
    }

    pub fn blocks_used(&self) -> usize {
        self.blocks.len()
    }

    /// Return the base index of the block for `palette` rendered with PPUMASK `mask`, filling
    /// in `lut` when a new block is needed.
    ///
    /// Once all blocks are taken the last one is overwritten.
    pub fn block_for(&mut self, palette: &[u8; BLOCK_SIZE], mask: u8, lut: &mut [u16; 256]) -> u8 {
        // Greyscale and the three emphasis bits
        let mask = mask & 0xE1;

        if let Some(i) = self
            .blocks
            .iter()
            .position(|(p, m)| p == palette && *m == mask)
        {
            return (i * BLOCK_SIZE) as u8;
        }

        let i = if self.blocks.len() < MAX_BLOCKS {
            self.blocks.push((*palette, mask));
            self.blocks.len() - 1
        } else {
            log::trace!("palette blocks exhausted, reusing the last one");
            self.blocks[MAX_BLOCKS - 1] = (*palette, mask);
            MAX_BLOCKS - 1
        };

        let color_mask = if mask & 0x01 != 0 { 0x30 } else { 0x3F };
        let emphasis = (mask as u16 >> 5) << 6;
        let base = i * BLOCK_SIZE;
        for (slot, entry) in palette.iter().enumerate() {
            lut[base + slot] = (*entry & color_mask) as u16 | emphasis;
        }

        base as u8
    }
}
