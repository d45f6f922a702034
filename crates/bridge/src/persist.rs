//! Sizing, saving and loading of save states and battery RAM.
//!
//! Both blobs go through the same three steps: a dry run into a [`SimWriter`] tells the host
//! how large a buffer to allocate, the real write must then fill that buffer exactly, and a
//! load hands the bytes back to the emulator.

use bincode::{enc::write::SliceWriter, error::EncodeError};
use nesbridge_emulator::{error::StateError, Error};

use crate::{instance::Instance, sink::SimWriter, BridgeError};

fn probe<F>(serialize: F) -> Result<usize, BridgeError>
where
    F: FnOnce(&mut SimWriter) -> Result<(), Error>,
{
    let mut sim = SimWriter::new();
    serialize(&mut sim)?;
    Ok(sim.size())
}

/// Run `serialize` into `dest`, which it has to fill exactly.
fn save_exact<F>(dest: &mut [u8], serialize: F) -> Result<(), BridgeError>
where
    F: FnOnce(&mut SliceWriter) -> Result<(), Error>,
{
    let expected = dest.len();
    let mut writer = SliceWriter::new(dest);

    match serialize(&mut writer) {
        Ok(()) => {}
        Err(Error::State(StateError::Encode(EncodeError::UnexpectedEnd))) => {
            return Err(underrun(expected, writer.bytes_written()));
        }
        Err(e) => return Err(e.into()),
    }

    let written = writer.bytes_written();
    if written != expected {
        return Err(underrun(expected, written));
    }
    Ok(())
}

fn underrun(expected: usize, written: usize) -> BridgeError {
    log::warn!("serialized {written} bytes into a buffer of {expected}");
    BridgeError::BufferUnderrun { expected, written }
}

impl Instance {
    /// Size of the buffer [`Instance::save_state`] needs.
    pub fn state_size(&self) -> Result<usize, BridgeError> {
        probe(|w| self.emulator().save_state(w))
    }

    pub fn save_state(&self, dest: &mut [u8]) -> Result<(), BridgeError> {
        save_exact(dest, |w| self.emulator().save_state(w))
    }

    pub fn load_state(&mut self, src: &[u8]) -> Result<(), BridgeError> {
        self.emulator_mut().load_state(src)?;
        Ok(())
    }

    /// Size of the buffer [`Instance::save_battery_ram`] needs, 0 without battery RAM.
    pub fn battery_ram_size(&self) -> Result<usize, BridgeError> {
        probe(|w| self.emulator().save_battery_ram(w))
    }

    pub fn save_battery_ram(&self, dest: &mut [u8]) -> Result<(), BridgeError> {
        save_exact(dest, |w| self.emulator().save_battery_ram(w))
    }

    pub fn load_battery_ram(&mut self, src: &[u8]) -> Result<(), BridgeError> {
        self.emulator_mut().load_battery_ram(src)?;
        Ok(())
    }

    /// Erase battery RAM by loading a blob of `0xFF` bytes of the probed size.
    pub fn clear_battery_ram(&mut self) -> Result<(), BridgeError> {
        let size = self.battery_ram_size()?;

        let mut scratch = Vec::new();
        scratch
            .try_reserve_exact(size)
            .map_err(|_| BridgeError::OutOfMemory)?;
        scratch.resize(size, 0xFF);

        self.load_battery_ram(&scratch)
    }
}
