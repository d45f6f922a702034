//! The 2A03 sound generator: two pulse channels, a triangle and a noise channel sequenced by the
//! frame counter. The DMC is reduced to its directly written output level.

use crate::{
    audio::AudioOutput,
    error::{ensure, StateError},
};

const LENGTH_TABLE: [u8; 32] = [
    10, 254, 20, 2, 40, 4, 80, 6, 160, 8, 60, 10, 14, 12, 26, 14, //
    12, 16, 24, 18, 48, 20, 96, 22, 192, 24, 72, 26, 16, 28, 32, 30,
];

const DUTY_TABLE: [u8; 4] = [0b0100_0000, 0b0110_0000, 0b0111_1000, 0b1001_1111];

const TRIANGLE_TABLE: [u8; 32] = [
    15, 14, 13, 12, 11, 10, 9, 8, 7, 6, 5, 4, 3, 2, 1, 0, //
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15,
];

// Noise timer periods in CPU cycles
const NOISE_TABLE: [u16; 16] = [
    4, 8, 16, 32, 64, 96, 128, 160, 202, 254, 380, 508, 762, 1016, 2034, 4068,
];

// Frame counter steps in CPU cycles
const STEP_1: u32 = 7457;
const STEP_2: u32 = 14913;
const STEP_3: u32 = 22371;
const STEP_4: u32 = 29829;
const STEP_5: u32 = 37281;

#[derive(Debug, Clone, Default, bincode::Encode, bincode::Decode)]
struct Envelope {
    start: bool,
    decay: u8,
    divider: u8,
    /// Volume in constant mode, divider period otherwise
    volume: u8,
    constant: bool,
    looping: bool,
}

impl Envelope {
    fn write(&mut self, v: u8) {
        self.looping = v & 0x20 != 0;
        self.constant = v & 0x10 != 0;
        self.volume = v & 0x0F;
    }

    fn clock(&mut self) {
        if self.start {
            self.start = false;
            self.decay = 15;
            self.divider = self.volume;
        } else if self.divider > 0 {
            self.divider -= 1;
        } else {
            self.divider = self.volume;
            if self.decay > 0 {
                self.decay -= 1;
            } else if self.looping {
                self.decay = 15;
            }
        }
    }

    fn validate(&self) -> Result<(), StateError> {
        ensure(
            self.decay < 16 && self.divider < 16 && self.volume < 16,
            "APU envelope",
        )
    }

    fn output(&self) -> u8 {
        if self.constant {
            self.volume
        } else {
            self.decay
        }
    }
}

#[derive(Debug, Clone, Default, bincode::Encode, bincode::Decode)]
struct Pulse {
    /// Pulse 1 negates the sweep with ones' complement
    ones_complement: bool,
    enabled: bool,
    duty: u8,
    phase: u8,
    timer: u16,
    period: u16,
    length: u8,
    envelope: Envelope,

    sweep_enabled: bool,
    sweep_period: u8,
    sweep_negate: bool,
    sweep_shift: u8,
    sweep_divider: u8,
    sweep_reload: bool,
}

impl Pulse {
    fn new(ones_complement: bool) -> Self {
        Self {
            ones_complement,
            ..Default::default()
        }
    }

    fn write(&mut self, reg: u16, v: u8) {
        match reg {
            0 => {
                self.duty = v >> 6;
                self.envelope.write(v);
            }
            1 => {
                self.sweep_enabled = v & 0x80 != 0;
                self.sweep_period = (v >> 4) & 0x07;
                self.sweep_negate = v & 0x08 != 0;
                self.sweep_shift = v & 0x07;
                self.sweep_reload = true;
            }
            2 => self.period = (self.period & 0x0700) | v as u16,
            _ => {
                self.period = (self.period & 0x00FF) | ((v as u16 & 0x07) << 8);
                if self.enabled {
                    self.length = LENGTH_TABLE[(v >> 3) as usize];
                }
                self.phase = 0;
                self.envelope.start = true;
            }
        }
    }

    fn sweep_target(&self) -> u16 {
        let delta = self.period >> self.sweep_shift;
        if self.sweep_negate {
            let delta = delta + self.ones_complement as u16;
            self.period.saturating_sub(delta)
        } else {
            self.period + delta
        }
    }

    fn muted(&self) -> bool {
        self.period < 8 || self.sweep_target() > 0x07FF
    }

    /// Clocked every other CPU cycle.
    fn clock_timer(&mut self) {
        if self.timer == 0 {
            self.timer = self.period;
            self.phase = (self.phase + 1) & 7;
        } else {
            self.timer -= 1;
        }
    }

    fn clock_sweep(&mut self) {
        if self.sweep_divider == 0 && self.sweep_enabled && self.sweep_shift > 0 && !self.muted()
        {
            self.period = self.sweep_target();
        }
        if self.sweep_divider == 0 || self.sweep_reload {
            self.sweep_divider = self.sweep_period;
            self.sweep_reload = false;
        } else {
            self.sweep_divider -= 1;
        }
    }

    fn clock_length(&mut self) {
        if self.length > 0 && !self.envelope.looping {
            self.length -= 1;
        }
    }

    fn validate(&self) -> Result<(), StateError> {
        ensure(self.duty < 4, "pulse duty")?;
        ensure(self.phase < 8, "pulse sequencer step")?;
        ensure(self.period < 0x0800, "pulse period")?;
        ensure(self.sweep_shift < 8 && self.sweep_period < 8, "pulse sweep")?;
        self.envelope.validate()
    }

    fn output(&self) -> u8 {
        let high = DUTY_TABLE[self.duty as usize] & (0x80 >> self.phase) != 0;
        if self.length == 0 || self.muted() || !high {
            0
        } else {
            self.envelope.output()
        }
    }
}

#[derive(Debug, Clone, Default, bincode::Encode, bincode::Decode)]
struct Triangle {
    enabled: bool,
    control: bool,
    linear_reload_value: u8,
    linear: u8,
    linear_reload: bool,
    timer: u16,
    period: u16,
    step: u8,
    length: u8,
}

impl Triangle {
    fn write(&mut self, reg: u16, v: u8) {
        match reg {
            0 => {
                self.control = v & 0x80 != 0;
                self.linear_reload_value = v & 0x7F;
            }
            2 => self.period = (self.period & 0x0700) | v as u16,
            3 => {
                self.period = (self.period & 0x00FF) | ((v as u16 & 0x07) << 8);
                if self.enabled {
                    self.length = LENGTH_TABLE[(v >> 3) as usize];
                }
                self.linear_reload = true;
            }
            _ => {}
        }
    }

    /// Clocked every CPU cycle.
    fn clock_timer(&mut self) {
        if self.timer == 0 {
            self.timer = self.period;
            // Ultrasonic periods are silenced instead of aliasing
            if self.length > 0 && self.linear > 0 && self.period >= 2 {
                self.step = (self.step + 1) & 31;
            }
        } else {
            self.timer -= 1;
        }
    }

    fn clock_linear(&mut self) {
        if self.linear_reload {
            self.linear = self.linear_reload_value;
        } else if self.linear > 0 {
            self.linear -= 1;
        }
        if !self.control {
            self.linear_reload = false;
        }
    }

    fn clock_length(&mut self) {
        if self.length > 0 && !self.control {
            self.length -= 1;
        }
    }

    fn validate(&self) -> Result<(), StateError> {
        ensure(self.step < 32, "triangle sequencer step")?;
        ensure(self.period < 0x0800, "triangle period")
    }

    fn output(&self) -> u8 {
        TRIANGLE_TABLE[self.step as usize]
    }
}

#[derive(Debug, Clone, bincode::Encode, bincode::Decode)]
struct Noise {
    enabled: bool,
    short_mode: bool,
    timer: u16,
    period: u16,
    shift: u16,
    length: u8,
    envelope: Envelope,
}

impl Default for Noise {
    fn default() -> Self {
        Self {
            enabled: false,
            short_mode: false,
            timer: 0,
            period: NOISE_TABLE[0],
            shift: 1,
            length: 0,
            envelope: Envelope::default(),
        }
    }
}

impl Noise {
    fn write(&mut self, reg: u16, v: u8) {
        match reg {
            0 => self.envelope.write(v),
            2 => {
                self.short_mode = v & 0x80 != 0;
                self.period = NOISE_TABLE[(v & 0x0F) as usize];
            }
            3 => {
                if self.enabled {
                    self.length = LENGTH_TABLE[(v >> 3) as usize];
                }
                self.envelope.start = true;
            }
            _ => {}
        }
    }

    /// Clocked every CPU cycle.
    fn clock_timer(&mut self) {
        if self.timer == 0 {
            self.timer = self.period - 1;
            let tap = if self.short_mode { 6 } else { 1 };
            let feedback = (self.shift ^ (self.shift >> tap)) & 1;
            self.shift = (self.shift >> 1) | (feedback << 14);
        } else {
            self.timer -= 1;
        }
    }

    fn clock_length(&mut self) {
        if self.length > 0 && !self.envelope.looping {
            self.length -= 1;
        }
    }

    fn validate(&self) -> Result<(), StateError> {
        ensure(NOISE_TABLE.contains(&self.period), "noise period")?;
        self.envelope.validate()
    }

    fn output(&self) -> u8 {
        if self.length == 0 || self.shift & 1 != 0 {
            0
        } else {
            self.envelope.output()
        }
    }
}

#[derive(Debug, Clone, bincode::Encode, bincode::Decode)]
pub struct Apu {
    pulse: [Pulse; 2],
    triangle: Triangle,
    noise: Noise,
    /// Output level of the DMC, only settable through `$4011`
    dmc_level: u8,

    five_step: bool,
    irq_inhibit: bool,
    frame_irq: bool,
    frame_cycle: u32,
    odd_cycle: bool,
}

impl Default for Apu {
    fn default() -> Self {
        Self::new()
    }
}

impl Apu {
    pub fn new() -> Self {
        Self {
            pulse: [Pulse::new(true), Pulse::new(false)],
            triangle: Triangle::default(),
            noise: Noise::default(),
            dmc_level: 0,
            five_step: false,
            irq_inhibit: false,
            frame_irq: false,
            frame_cycle: 0,
            odd_cycle: false,
        }
    }

    /// Reset silences every channel, the frame counter mode survives.
    pub fn reset(&mut self) {
        self.write_register(0x4015, 0x00);
        self.triangle.step = 0;
        self.dmc_level &= 1;
        self.noise.shift = 1;
        self.frame_irq = false;
        self.frame_cycle = 0;
    }

    /// Check every channel after a save state was decoded.
    pub(crate) fn validate(&self) -> Result<(), StateError> {
        for pulse in &self.pulse {
            pulse.validate()?;
        }
        self.triangle.validate()?;
        self.noise.validate()?;
        ensure(self.dmc_level < 0x80, "DMC level")?;
        let frame_len = if self.five_step { STEP_5 } else { STEP_4 };
        ensure(self.frame_cycle < frame_len, "frame counter")
    }

    pub fn irq_pending(&self) -> bool {
        self.frame_irq
    }

    pub fn write_register(&mut self, addr: u16, v: u8) {
        match addr {
            0x4000..=0x4003 => self.pulse[0].write(addr & 3, v),
            0x4004..=0x4007 => self.pulse[1].write(addr & 3, v),
            0x4008..=0x400B => self.triangle.write(addr & 3, v),
            0x400C..=0x400F => self.noise.write(addr & 3, v),
            0x4011 => self.dmc_level = v & 0x7F,
            0x4015 => {
                self.pulse[0].enabled = v & 0x01 != 0;
                self.pulse[1].enabled = v & 0x02 != 0;
                self.triangle.enabled = v & 0x04 != 0;
                self.noise.enabled = v & 0x08 != 0;
                if !self.pulse[0].enabled {
                    self.pulse[0].length = 0;
                }
                if !self.pulse[1].enabled {
                    self.pulse[1].length = 0;
                }
                if !self.triangle.enabled {
                    self.triangle.length = 0;
                }
                if !self.noise.enabled {
                    self.noise.length = 0;
                }
            }
            0x4017 => {
                self.five_step = v & 0x80 != 0;
                self.irq_inhibit = v & 0x40 != 0;
                if self.irq_inhibit {
                    self.frame_irq = false;
                }
                self.frame_cycle = 0;
                if self.five_step {
                    self.quarter_frame();
                    self.half_frame();
                }
            }
            _ => {
                log::trace!("ignored APU write {v:#04x} to {addr:#06x}");
            }
        }
    }

    /// Read of `$4015`, clears the frame interrupt.
    pub fn read_status(&mut self) -> u8 {
        let mut v = 0;
        if self.pulse[0].length > 0 {
            v |= 0x01;
        }
        if self.pulse[1].length > 0 {
            v |= 0x02;
        }
        if self.triangle.length > 0 {
            v |= 0x04;
        }
        if self.noise.length > 0 {
            v |= 0x08;
        }
        if self.frame_irq {
            v |= 0x40;
        }
        self.frame_irq = false;
        v
    }

    fn quarter_frame(&mut self) {
        self.pulse[0].envelope.clock();
        self.pulse[1].envelope.clock();
        self.noise.envelope.clock();
        self.triangle.clock_linear();
    }

    fn half_frame(&mut self) {
        for pulse in &mut self.pulse {
            pulse.clock_length();
            pulse.clock_sweep();
        }
        self.triangle.clock_length();
        self.noise.clock_length();
    }

    fn clock_frame_counter(&mut self) {
        self.frame_cycle += 1;
        match (self.frame_cycle, self.five_step) {
            (STEP_1, _) | (STEP_3, _) => self.quarter_frame(),
            (STEP_2, _) => {
                self.quarter_frame();
                self.half_frame();
            }
            (STEP_4, false) => {
                self.quarter_frame();
                self.half_frame();
                if !self.irq_inhibit {
                    self.frame_irq = true;
                }
                self.frame_cycle = 0;
            }
            (STEP_5, true) => {
                self.quarter_frame();
                self.half_frame();
                self.frame_cycle = 0;
            }
            _ => {}
        }
    }

    /// Non-linear mix of all channels, in `0.0..1.0`.
    fn mix(&self) -> f32 {
        let p = (self.pulse[0].output() + self.pulse[1].output()) as f32;
        let pulse_out = if p == 0.0 {
            0.0
        } else {
            95.88 / (8128.0 / p + 100.0)
        };

        let t = self.triangle.output() as f32 / 8227.0;
        let n = self.noise.output() as f32 / 12241.0;
        let d = self.dmc_level as f32 / 22638.0;
        let tnd = t + n + d;
        let tnd_out = if tnd == 0.0 {
            0.0
        } else {
            159.79 / (1.0 / tnd + 100.0)
        };

        pulse_out + tnd_out
    }

    /// Run for `cycles` CPU cycles, feeding one level per cycle into `out`.
    pub fn step(&mut self, cycles: u64, out: &mut AudioOutput) {
        for _ in 0..cycles {
            self.clock_frame_counter();
            self.triangle.clock_timer();
            self.noise.clock_timer();
            if self.odd_cycle {
                self.pulse[0].clock_timer();
                self.pulse[1].clock_timer();
            }
            self.odd_cycle = !self.odd_cycle;
            out.push_level(self.mix());
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn power_on_state_is_in_range() {
        let mut apu = Apu::new();
        assert!(apu.validate().is_ok());
        apu.write_register(0x4017, 0x80);
        apu.write_register(0x4002, 0xFF);
        apu.write_register(0x4003, 0xFF);
        apu.write_register(0x400E, 0x0F);
        assert!(apu.validate().is_ok());
    }

    #[test]
    fn channel_fields_out_of_range_are_rejected() {
        let mut apu = Apu::new();
        apu.pulse[1].duty = 4;
        assert!(matches!(apu.validate(), Err(StateError::OutOfRange("pulse duty"))));

        let mut apu = Apu::new();
        apu.triangle.step = 32;
        assert!(matches!(
            apu.validate(),
            Err(StateError::OutOfRange("triangle sequencer step"))
        ));

        let mut apu = Apu::new();
        apu.noise.period = 5;
        assert!(matches!(apu.validate(), Err(StateError::OutOfRange("noise period"))));

        let mut apu = Apu::new();
        apu.pulse[0].envelope.volume = 16;
        assert!(matches!(apu.validate(), Err(StateError::OutOfRange("APU envelope"))));

        let mut apu = Apu::new();
        apu.frame_cycle = STEP_4;
        assert!(matches!(apu.validate(), Err(StateError::OutOfRange("frame counter"))));
        apu.five_step = true;
        assert!(apu.validate().is_ok());
    }
}
