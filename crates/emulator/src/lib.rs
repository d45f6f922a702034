#![allow(clippy::new_without_default, clippy::single_match, clippy::identity_op)]

pub mod apu;
pub mod audio;
pub mod bus;
pub mod carts;
pub mod config;
pub mod controller;
pub mod cpu;
pub mod emulator;
pub mod error;
pub mod frame;
pub mod palette;
pub mod ppu;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use emulator::Emulator;
pub use error::Error;

#[cfg(test)]
mod test;
