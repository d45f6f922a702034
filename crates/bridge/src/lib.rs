//! Host facing side of the emulator: a handle that owns one [`Emulator`], the BGRA blit, the
//! probe, save and load protocol for save states and battery RAM, and a C surface over all of it.
//!
//! [`Emulator`]: nesbridge_emulator::Emulator

pub mod blit;
pub mod error;
pub mod ffi;
pub mod instance;
mod persist;
pub mod sink;
#[cfg(feature = "wasm")]
pub mod wasm;

pub use error::BridgeError;
pub use instance::{Instance, Phase};
pub use sink::SimWriter;
