use nesbridge_emulator::palette::Rgb;

/// Bytes per output pixel.
pub const BYTES_PER_PIXEL: usize = 4;

/// A borrowed indexed picture: `height` rows of `width` pixels, `pitch` bytes apart.
#[derive(Debug, Clone, Copy)]
pub struct IndexedImage<'a> {
    pub pixels: &'a [u8],
    pub pitch: usize,
    pub width: usize,
    pub height: usize,
}

/// Resolve every pixel through `lut` into `colors` and write it to `dest` as B, G, R, 0xFF.
///
/// `dest` is tightly packed, `width * height * 4` bytes. Pixel values and lookup entries are
/// trusted, an entry past the end of `colors` panics.
pub fn blit_indexed(src: &IndexedImage, lut: &[u16; 256], colors: &[Rgb], dest: &mut [u8]) {
    let rows = src.pixels.chunks(src.pitch).take(src.height);
    let out_rows = dest.chunks_exact_mut(src.width * BYTES_PER_PIXEL);

    for (row, out) in rows.zip(out_rows) {
        for (&p, px) in row[..src.width].iter().zip(out.chunks_exact_mut(BYTES_PER_PIXEL)) {
            let c = colors[lut[p as usize] as usize];
            px.copy_from_slice(&[c.blue, c.green, c.red, 0xFF]);
        }
    }
}
