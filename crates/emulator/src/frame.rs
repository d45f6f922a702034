use crate::{error::Error, palette::PaletteAllocator};

pub const WIDTH: usize = 256;
pub const HEIGHT: usize = 240;
/// Row stride of the indexed framebuffer unless the host asks for another one.
pub const DEFAULT_PITCH: usize = 272;

/// Output of the most recent frame step.
///
/// `pixels` holds palette lookup indices, `palette` maps them into
/// [`nes_colors`](crate::palette::nes_colors).
#[derive(Debug, Clone)]
pub struct Frame {
    pixels: Vec<u8>,
    pitch: usize,
    pub palette: [u16; 256],
    pub sample_count: usize,
    pub chan_count: usize,
    pub joypad_read_count: u32,
    pub(crate) palettes: PaletteAllocator,
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}

impl Frame {
    pub fn new() -> Self {
        Self {
            pixels: vec![0; DEFAULT_PITCH * HEIGHT],
            pitch: DEFAULT_PITCH,
            palette: [0; 256],
            sample_count: 0,
            chan_count: 1,
            joypad_read_count: 0,
            palettes: PaletteAllocator::new(),
        }
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pitch(&self) -> usize {
        self.pitch
    }

    /// Change the row stride, the contents are cleared.
    pub fn set_pitch(&mut self, pitch: usize) -> Result<(), Error> {
        if pitch < WIDTH {
            return Err(Error::PitchTooSmall {
                pitch,
                width: WIDTH,
            });
        }
        self.pitch = pitch;
        self.pixels = vec![0; pitch * HEIGHT];
        Ok(())
    }

    /// The visible part of row `y`.
    pub fn row(&self, y: usize) -> &[u8] {
        let start = y * self.pitch;
        &self.pixels[start..start + WIDTH]
    }

    pub(crate) fn row_mut(&mut self, y: usize) -> &mut [u8] {
        let start = y * self.pitch;
        &mut self.pixels[start..start + WIDTH]
    }

    /// Copy the visible area into `dest` using the row stride `pitch`.
    pub fn copy_indexed(&self, dest: &mut [u8], pitch: usize) {
        for (y, out) in dest.chunks_mut(pitch).take(HEIGHT).enumerate() {
            let n = out.len().min(WIDTH);
            out[..n].copy_from_slice(&self.row(y)[..n]);
        }
    }
}
