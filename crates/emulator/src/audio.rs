use std::f32::consts::PI;

use crate::{
    config::{Equalizer, DEFAULT_SAMPLE_RATE, SAMPLE_RATES},
    error::Error,
};

/// NTSC CPU clock in Hz, the APU produces one level per CPU cycle.
pub const CPU_CLOCK: f64 = 1_789_773.0;

/// Corner frequency between the bass and treble bands of the equalizer.
const TREBLE_CORNER_HZ: f32 = 8_000.0;

const OUTPUT_GAIN: f32 = 32_767.0 * 1.5;

/// One-pole low-pass coefficient for a cutoff at `hz`.
fn lowpass_alpha(hz: f32, rate: u32) -> f32 {
    let rc = 1.0 / (2.0 * PI * hz);
    let dt = 1.0 / rate as f32;
    dt / (rc + dt)
}

/// Box-filters the per-cycle APU levels down to the output rate, then runs the equalizer.
#[derive(Debug, Clone)]
pub struct AudioOutput {
    rate: u32,
    equalizer: Equalizer,
    cycles_per_sample: f64,

    acc: f32,
    acc_count: u32,
    phase: f64,

    treble_alpha: f32,
    treble_gain: f32,
    treble_state: f32,
    bass_alpha: f32,
    bass_state: f32,

    samples: Vec<i16>,
}

impl Default for AudioOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioOutput {
    pub fn new() -> Self {
        let rate = DEFAULT_SAMPLE_RATE;
        let mut out = Self {
            rate,
            equalizer: Equalizer::NES,
            cycles_per_sample: CPU_CLOCK / rate as f64,
            acc: 0.0,
            acc_count: 0,
            phase: 0.0,
            treble_alpha: 0.0,
            treble_gain: 1.0,
            treble_state: 0.0,
            bass_alpha: 0.0,
            bass_state: 0.0,
            samples: Vec::with_capacity(rate as usize / 50),
        };
        out.set_equalizer(Equalizer::NES);
        out
    }

    pub fn set_rate(&mut self, rate: u32) -> Result<(), Error> {
        if !SAMPLE_RATES.contains(&rate) {
            return Err(Error::UnsupportedSampleRate(rate));
        }
        self.rate = rate;
        self.cycles_per_sample = CPU_CLOCK / rate as f64;
        self.samples = Vec::with_capacity(rate as usize / 50);
        self.set_equalizer(self.equalizer);
        Ok(())
    }

    pub fn set_equalizer(&mut self, equalizer: Equalizer) {
        self.equalizer = equalizer;

        // Treble corner cannot sit above Nyquist
        let corner = TREBLE_CORNER_HZ.min(self.rate as f32 * 0.45);
        self.treble_alpha = lowpass_alpha(corner, self.rate);
        self.treble_gain = 10f32.powf(equalizer.treble_db / 20.0);
        self.bass_alpha = lowpass_alpha(equalizer.bass_hz.max(1) as f32, self.rate);
    }

    /// Feed the mixer level of one CPU cycle.
    pub fn push_level(&mut self, level: f32) {
        self.acc += level;
        self.acc_count += 1;
        self.phase += 1.0;

        if self.phase >= self.cycles_per_sample {
            self.phase -= self.cycles_per_sample;
            let avg = self.acc / self.acc_count as f32;
            self.acc = 0.0;
            self.acc_count = 0;
            self.emit(avg);
        }
    }

    fn emit(&mut self, x: f32) {
        // Treble shelf: keep the band below the corner, scale the rest
        self.treble_state += self.treble_alpha * (x - self.treble_state);
        let x = self.treble_state + self.treble_gain * (x - self.treble_state);

        // Bass cut: subtract the band below the bass frequency
        self.bass_state += self.bass_alpha * (x - self.bass_state);
        let x = x - self.bass_state;

        let s = (x * OUTPUT_GAIN).clamp(i16::MIN as f32, i16::MAX as f32);
        self.samples.push(s as i16);
    }

    /// Samples produced since the last [`AudioOutput::begin_frame`] and not read yet.
    pub fn available(&self) -> usize {
        self.samples.len()
    }

    /// Drop whatever the host did not read of the previous frame.
    pub fn begin_frame(&mut self) {
        self.samples.clear();
    }

    /// Move up to `dest.len()` samples into `dest`, returns how many were written.
    pub fn read(&mut self, dest: &mut [i16]) -> usize {
        let n = dest.len().min(self.samples.len());
        dest[..n].copy_from_slice(&self.samples[..n]);
        self.samples.drain(..n);
        n
    }
}
