use thiserror::Error;

/// Everything the emulation core can fail with. Messages are meant to be shown to the user as
/// they are.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Rom(#[from] RomError),
    #[error(transparent)]
    State(#[from] StateError),
    #[error("No cartridge loaded")]
    NoCartridge,
    #[error("CPU jammed at {pc:#06x}")]
    CpuJam { pc: u16 },
    #[error("Unsupported sample rate: {0} Hz")]
    UnsupportedSampleRate(u32),
    #[error("Pixel pitch {pitch} is smaller than the frame width {width}")]
    PitchTooSmall { pitch: usize, width: usize },
    #[error("Battery RAM data too short: expected {expected} bytes, got {got}")]
    BatteryTooShort { expected: usize, got: usize },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RomError {
    #[error("File is too short to be an iNES image")]
    TooShort,
    #[error("Not an iNES file")]
    BadMagic,
    #[error("NES 2.0 images are not supported")]
    Nes2Unsupported,
    #[error("PlayChoice-10 images are not supported")]
    PlayChoiceUnsupported,
    #[error("Image truncated: {section} needs {expected} bytes, {got} available")]
    Truncated {
        section: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("Unsupported mapper {0}")]
    UnsupportedMapper(u8),
    #[error("Image has no PRG ROM")]
    NoPrgRom,
}

#[derive(Debug, Error)]
pub enum StateError {
    #[error("Not a save state")]
    BadMagic,
    #[error("Unsupported save state version {0}")]
    UnsupportedVersion(u16),
    #[error("Save state belongs to a different cartridge")]
    WrongCartridge,
    #[error("Save state does not match the cartridge memory layout")]
    LayoutMismatch,
    #[error("Corrupt save state: {0} out of range")]
    OutOfRange(&'static str),
    #[error("Corrupt save state: {0}")]
    Decode(#[from] bincode::error::DecodeError),
    #[error("Failed to write save state: {0}")]
    Encode(#[from] bincode::error::EncodeError),
}

/// `Ok` when `cond` holds, otherwise the state field `field` is reported as out of range.
pub(crate) fn ensure(cond: bool, field: &'static str) -> Result<(), StateError> {
    if cond {
        Ok(())
    } else {
        Err(StateError::OutOfRange(field))
    }
}
