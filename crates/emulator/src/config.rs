/// How many sprites the PPU draws on one scanline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpriteMode {
    /// No sprites at all
    Hidden = 0,
    /// Hardware behaviour, at most 8 per line
    #[default]
    Visible = 8,
    /// Removes the flicker of games that multiplex more than 8 sprites per line
    Enhanced = 64,
}

impl SpriteMode {
    pub fn limit(self) -> usize {
        self as usize
    }
}

impl TryFrom<i32> for SpriteMode {
    type Error = i32;

    fn try_from(v: i32) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(SpriteMode::Hidden),
            8 => Ok(SpriteMode::Visible),
            64 => Ok(SpriteMode::Enhanced),
            other => Err(other),
        }
    }
}

/// Output equalizer: a treble shelf in dB above 8 kHz and a bass cutoff frequency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Equalizer {
    pub treble_db: f32,
    pub bass_hz: u32,
}

impl Equalizer {
    pub const NES: Equalizer = Equalizer {
        treble_db: -1.0,
        bass_hz: 80,
    };
    pub const FAMICOM: Equalizer = Equalizer {
        treble_db: -15.0,
        bass_hz: 80,
    };
    pub const TV: Equalizer = Equalizer {
        treble_db: -12.0,
        bass_hz: 180,
    };
    pub const FLAT: Equalizer = Equalizer {
        treble_db: 0.0,
        bass_hz: 1,
    };
}

impl Default for Equalizer {
    fn default() -> Self {
        Self::NES
    }
}

pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;
pub const SAMPLE_RATES: std::ops::RangeInclusive<u32> = 8_000..=192_000;

/// Per-emulator settings, changed only through the setters on
/// [`Emulator`](crate::emulator::Emulator).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmulatorConfig {
    pub sprite_mode: SpriteMode,
    pub sample_rate: u32,
    pub equalizer: Equalizer,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            sprite_mode: SpriteMode::default(),
            sample_rate: DEFAULT_SAMPLE_RATE,
            equalizer: Equalizer::NES,
        }
    }
}
