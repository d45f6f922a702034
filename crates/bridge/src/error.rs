use nesbridge_emulator::Error;
use thiserror::Error;

/// Errors reported across the host boundary. Display strings are what the host gets to see.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Core(#[from] Error),
    /// The serialized size differs from the buffer the host declared
    #[error("Buffer Underrun!")]
    BufferUnderrun { expected: usize, written: usize },
    #[error("Out of Memory!")]
    OutOfMemory,
    #[error("Invalid sprite limit {0}, expected 0, 8 or 64")]
    InvalidSpriteMode(i32),
}
