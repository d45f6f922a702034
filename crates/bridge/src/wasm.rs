// wasm_bindgen exports look unused to rustc on native targets.
#![allow(unused)]

use nesbridge_emulator::controller::NesController;
use wasm_bindgen::prelude::*;

use crate::instance::Instance;

#[wasm_bindgen]
pub struct Nes {
    instance: Instance,
}

#[wasm_bindgen]
impl Nes {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Nes {
        Self {
            instance: Instance::new(),
        }
    }

    pub fn load_ines(&mut self, bin: &[u8]) -> Result<(), String> {
        self.instance.load_ines(bin).map_err(|e| e.to_string())
    }

    pub fn set_sample_rate(&mut self, rate: u32) -> Result<(), String> {
        self.instance.set_sample_rate(rate).map_err(|e| e.to_string())
    }

    pub fn emulate_frame(&mut self, pad1: &Controller, pad2: &Controller) -> Result<(), String> {
        self.instance
            .emulate_frame(pad1.bits(), pad2.bits())
            .map_err(|e| e.to_string())
    }

    /// The last frame as 256 x 240 BGRA pixels.
    pub fn blit(&self) -> Vec<u8> {
        let mut buf = vec![0; self.instance.blit_len()];
        self.instance.blit(&mut buf);
        buf
    }

    pub fn read_audio(&mut self, max: usize) -> Vec<i16> {
        let mut buf = vec![0; max];
        let n = self.instance.read_samples(&mut buf);
        buf.truncate(n);
        buf
    }

    pub fn joypad_read_count(&self) -> u32 {
        self.instance.joypad_read_count()
    }

    pub fn reset(&mut self, hard: bool) {
        self.instance.reset(hard);
    }

    pub fn save_state(&self) -> Result<Vec<u8>, String> {
        let size = self.instance.state_size().map_err(|e| e.to_string())?;
        let mut buf = vec![0; size];
        self.instance
            .save_state(&mut buf)
            .map_err(|e| e.to_string())?;
        Ok(buf)
    }

    pub fn load_state(&mut self, bin: &[u8]) -> Result<(), String> {
        self.instance.load_state(bin).map_err(|e| e.to_string())
    }

    pub fn has_battery_ram(&self) -> bool {
        self.instance.has_battery_ram()
    }

    pub fn save_battery_ram(&self) -> Result<Vec<u8>, String> {
        let size = self.instance.battery_ram_size().map_err(|e| e.to_string())?;
        let mut buf = vec![0; size];
        self.instance
            .save_battery_ram(&mut buf)
            .map_err(|e| e.to_string())?;
        Ok(buf)
    }

    pub fn load_battery_ram(&mut self, bin: &[u8]) -> Result<(), String> {
        self.instance
            .load_battery_ram(bin)
            .map_err(|e| e.to_string())
    }

    pub fn clear_battery_ram(&mut self) -> Result<(), String> {
        self.instance.clear_battery_ram().map_err(|e| e.to_string())
    }

    pub fn set_sprite_limit(&mut self, n: i32) -> Result<(), String> {
        self.instance.set_sprite_mode(n).map_err(|e| e.to_string())
    }
}

#[wasm_bindgen]
#[derive(Clone, Copy, Default)]
pub struct Controller {
    pub dpad_n: bool,
    pub dpad_s: bool,
    pub dpad_w: bool,
    pub dpad_e: bool,

    pub start: bool,
    pub select: bool,

    pub a: bool,
    pub b: bool,
}

#[wasm_bindgen]
impl Controller {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Controller {
        Controller::default()
    }
}

impl Controller {
    fn bits(&self) -> u8 {
        let mut pad = NesController::empty();
        pad.set(NesController::UP, self.dpad_n);
        pad.set(NesController::DOWN, self.dpad_s);
        pad.set(NesController::LEFT, self.dpad_w);
        pad.set(NesController::RIGHT, self.dpad_e);
        pad.set(NesController::START, self.start);
        pad.set(NesController::SELECT, self.select);
        pad.set(NesController::A, self.a);
        pad.set(NesController::B, self.b);
        pad.bits()
    }
}

#[wasm_bindgen]
pub fn set_panic_hook() {
    console_error_panic_hook::set_once();
}
