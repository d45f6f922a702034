use std::{ffi::CString, ptr::NonNull};

use nesbridge_emulator::{
    config::SpriteMode,
    frame::{Frame, HEIGHT, WIDTH},
    palette::nes_colors,
    Emulator,
};

use crate::{
    blit::{blit_indexed, IndexedImage, BYTES_PER_PIXEL},
    BridgeError,
};

/// Where an instance is in its life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No cartridge, or the last load failed
    Unloaded,
    /// A cartridge is in but no frame has been emulated since
    Loaded,
    Running,
}

/// A host owned destination for the indexed frame.
#[derive(Debug)]
struct PixelBinding {
    dest: NonNull<u8>,
    pitch: usize,
}

/// One emulator as the host sees it.
pub struct Instance {
    emulator: Emulator,
    phase: Phase,
    pixels: Option<PixelBinding>,
    /// Message of the last failed call through the C surface, alive until the next call
    pub(crate) last_error: Option<CString>,
}

impl Default for Instance {
    fn default() -> Self {
        Self::new()
    }
}

impl Instance {
    pub fn new() -> Self {
        Self {
            emulator: Emulator::new(),
            phase: Phase::Unloaded,
            pixels: None,
            last_error: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn emulator(&self) -> &Emulator {
        &self.emulator
    }

    pub(crate) fn emulator_mut(&mut self) -> &mut Emulator {
        &mut self.emulator
    }

    pub fn frame(&self) -> &Frame {
        self.emulator.frame()
    }

    pub fn load_ines(&mut self, data: &[u8]) -> Result<(), BridgeError> {
        self.phase = Phase::Unloaded;
        self.emulator.load_ines(data)?;
        self.phase = Phase::Loaded;
        Ok(())
    }

    /// Set the audio output rate, which also installs the standard NES equalizer.
    pub fn set_sample_rate(&mut self, rate: u32) -> Result<(), BridgeError> {
        self.emulator.set_sample_rate(rate)?;
        Ok(())
    }

    /// Width and height of the picture.
    pub fn dimensions(&self) -> (usize, usize) {
        (WIDTH, HEIGHT)
    }

    /// Have every frame step copy the indexed frame to `dest`, rows `pitch` bytes apart. A null
    /// `dest` removes the binding.
    ///
    /// # Safety
    ///
    /// Until the binding is replaced or removed, or the instance is dropped, `dest` must be
    /// valid for writes of `pitch * 240` bytes and not be accessed by anything else while a
    /// frame is stepped.
    pub unsafe fn bind_pixel_buffer(
        &mut self,
        dest: *mut u8,
        pitch: usize,
    ) -> Result<(), BridgeError> {
        let Some(dest) = NonNull::new(dest) else {
            self.pixels = None;
            return Ok(());
        };

        self.emulator.set_pixel_pitch(pitch)?;
        self.pixels = Some(PixelBinding { dest, pitch });
        Ok(())
    }

    /// Run one frame with the two controller bytes.
    pub fn emulate_frame(&mut self, pad1: u8, pad2: u8) -> Result<(), BridgeError> {
        self.emulator.emulate_frame(pad1, pad2)?;
        self.phase = Phase::Running;

        if let Some(binding) = &self.pixels {
            // SAFETY: the binding contract of `bind_pixel_buffer`
            let dest = unsafe {
                std::slice::from_raw_parts_mut(binding.dest.as_ptr(), binding.pitch * HEIGHT)
            };
            self.emulator.frame().copy_indexed(dest, binding.pitch);
        }
        Ok(())
    }

    /// Write the last frame to `dest` as packed BGRA, 256 x 240.
    pub fn blit(&self, dest: &mut [u8]) {
        let frame = self.emulator.frame();
        let image = IndexedImage {
            pixels: frame.pixels(),
            pitch: frame.pitch(),
            width: WIDTH,
            height: HEIGHT,
        };
        blit_indexed(&image, &frame.palette, nes_colors(), dest);
    }

    /// Size of the buffer [`Instance::blit`] fills completely.
    pub fn blit_len(&self) -> usize {
        WIDTH * HEIGHT * BYTES_PER_PIXEL
    }

    pub fn joypad_read_count(&self) -> u32 {
        self.emulator.frame().joypad_read_count
    }

    /// Samples produced by the last frame and the number of channels they are interleaved for.
    pub fn audio_info(&self) -> (usize, usize) {
        let frame = self.emulator.frame();
        (frame.sample_count, frame.chan_count)
    }

    pub fn read_samples(&mut self, dest: &mut [i16]) -> usize {
        self.emulator.read_samples(dest)
    }

    pub fn reset(&mut self, hard: bool) {
        self.emulator.reset(hard);
    }

    /// Accepts 0 (no sprites), 8 (hardware limit) or 64 (no per-line limit).
    pub fn set_sprite_mode(&mut self, n: i32) -> Result<(), BridgeError> {
        let mode = SpriteMode::try_from(n).map_err(BridgeError::InvalidSpriteMode)?;
        self.emulator.set_sprite_mode(mode);
        Ok(())
    }

    pub fn has_battery_ram(&self) -> bool {
        self.emulator.has_battery_ram()
    }
}
