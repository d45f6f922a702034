use bincode::{enc::write::Writer, error::EncodeError};

/// A writer that keeps nothing and only counts, used to size buffers before a real write.
#[derive(Debug, Default)]
pub struct SimWriter {
    size: usize,
}

impl SimWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes written so far.
    pub fn size(&self) -> usize {
        self.size
    }
}

impl Writer for SimWriter {
    fn write(&mut self, bytes: &[u8]) -> Result<(), EncodeError> {
        self.size += bytes.len();
        Ok(())
    }
}
