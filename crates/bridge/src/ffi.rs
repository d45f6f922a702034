//! Flat C surface over [`Instance`].
//!
//! Every function takes the handle returned by [`nb_new`] first. Functions that can fail return
//! a NUL terminated message, or null on success. A message stays valid until the next call on
//! the same handle. Null out pointers are skipped.

use std::{
    ffi::{c_char, c_int, c_void, CString},
    panic::{self, AssertUnwindSafe},
    ptr, slice,
};

use crate::{instance::Instance, BridgeError};

/// Opaque instance handle as the host holds it.
pub type NesHandle = *mut Instance;

const INTERNAL_ERROR: &str = "Internal error";
const NULL_HANDLE: &[u8] = b"Null handle\0";

/// Run `f` on the instance behind `h` and turn its outcome into a C error string.
unsafe fn report<F>(h: NesHandle, f: F) -> *const c_char
where
    F: FnOnce(&mut Instance) -> Result<(), BridgeError>,
{
    let Some(inst) = h.as_mut() else {
        return NULL_HANDLE.as_ptr().cast();
    };
    inst.last_error = None;

    let msg = match panic::catch_unwind(AssertUnwindSafe(|| f(&mut *inst))) {
        Ok(Ok(())) => return ptr::null(),
        Ok(Err(e)) => e.to_string(),
        Err(_) => INTERNAL_ERROR.to_owned(),
    };
    log::debug!("call failed: {msg}");

    let msg = CString::new(msg.replace('\0', " ")).unwrap_or_default();
    inst.last_error.insert(msg).as_ptr()
}

/// Run `f` for a value, `default` when the handle is null or `f` panics.
unsafe fn query<T, F>(h: NesHandle, default: T, f: F) -> T
where
    F: FnOnce(&mut Instance) -> T,
{
    let Some(inst) = h.as_mut() else {
        return default;
    };
    panic::catch_unwind(AssertUnwindSafe(|| f(inst))).unwrap_or_else(|_| {
        log::error!("panic in a C surface call");
        default
    })
}

unsafe fn bytes<'a>(data: *const c_void, len: c_int) -> &'a [u8] {
    match usize::try_from(len) {
        Ok(len) if !data.is_null() => slice::from_raw_parts(data.cast(), len),
        _ => &[],
    }
}

unsafe fn bytes_mut<'a>(data: *mut c_void, len: c_int) -> &'a mut [u8] {
    match usize::try_from(len) {
        Ok(len) if !data.is_null() => slice::from_raw_parts_mut(data.cast(), len),
        _ => &mut [],
    }
}

unsafe fn put(out: *mut c_int, v: usize) {
    if let Some(out) = out.as_mut() {
        *out = c_int::try_from(v).unwrap_or(c_int::MAX);
    }
}

#[no_mangle]
pub extern "C" fn nb_new() -> NesHandle {
    Box::into_raw(Box::new(Instance::new()))
}

/// # Safety
///
/// `h` must come from [`nb_new`] and not be used afterwards.
#[no_mangle]
pub unsafe extern "C" fn nb_delete(h: NesHandle) {
    if !h.is_null() {
        drop(Box::from_raw(h));
    }
}

/// # Safety
///
/// `data` must be valid for reads of `len` bytes.
#[no_mangle]
pub unsafe extern "C" fn nb_load_ines(
    h: NesHandle,
    data: *const c_void,
    len: c_int,
) -> *const c_char {
    let data = bytes(data, len);
    report(h, |inst| inst.load_ines(data))
}

/// # Safety
///
/// `h` must be a live handle.
#[no_mangle]
pub unsafe extern "C" fn nb_set_sample_rate(h: NesHandle, rate: c_int) -> *const c_char {
    report(h, |inst| inst.set_sample_rate(rate.max(0) as u32))
}

/// # Safety
///
/// `h` must be a live handle, the out pointers null or writable.
#[no_mangle]
pub unsafe extern "C" fn nb_get_image_dimensions(
    h: NesHandle,
    width: *mut c_int,
    height: *mut c_int,
) {
    let (w, hh) = query(h, (0, 0), |inst| inst.dimensions());
    put(width, w);
    put(height, hh);
}

/// Bind the buffer every frame step writes the indexed frame to, or unbind with a null `dest`.
///
/// # Safety
///
/// `dest` must stay valid for writes of `pitch * 240` bytes until it is unbound or the handle
/// is deleted.
#[no_mangle]
pub unsafe extern "C" fn nb_set_pixels(h: NesHandle, dest: *mut c_void, pitch: c_int) {
    let err = report(h, |inst| {
        inst.bind_pixel_buffer(dest.cast(), pitch.max(0) as usize)
    });
    if !err.is_null() {
        log::warn!("ignoring pixel buffer with pitch {pitch}");
    }
}

/// # Safety
///
/// `h` must be a live handle.
#[no_mangle]
pub unsafe extern "C" fn nb_emulate_frame(
    h: NesHandle,
    pad1: c_int,
    pad2: c_int,
) -> *const c_char {
    report(h, |inst| inst.emulate_frame(pad1 as u8, pad2 as u8))
}

/// Write the last frame as 256 x 240 BGRA pixels.
///
/// # Safety
///
/// `dest` must be valid for writes of 256 * 240 * 4 bytes.
#[no_mangle]
pub unsafe extern "C" fn nb_blit(h: NesHandle, dest: *mut c_void) {
    if dest.is_null() {
        return;
    }
    query(h, (), |inst| {
        let dest = slice::from_raw_parts_mut(dest.cast::<u8>(), inst.blit_len());
        inst.blit(dest);
    });
}

/// # Safety
///
/// `h` must be a live handle.
#[no_mangle]
pub unsafe extern "C" fn nb_get_joypad_read_count(h: NesHandle) -> c_int {
    query(h, 0, |inst| inst.joypad_read_count() as c_int)
}

/// # Safety
///
/// `h` must be a live handle, the out pointers null or writable.
#[no_mangle]
pub unsafe extern "C" fn nb_get_audio_info(
    h: NesHandle,
    sample_count: *mut c_int,
    chan_count: *mut c_int,
) {
    let (samples, chans) = query(h, (0, 0), |inst| inst.audio_info());
    put(sample_count, samples);
    put(chan_count, chans);
}

/// Move up to `max` samples of the last frame to `dest`, returns how many.
///
/// # Safety
///
/// `dest` must be valid for writes of `max` samples.
#[no_mangle]
pub unsafe extern "C" fn nb_read_audio(h: NesHandle, dest: *mut i16, max: c_int) -> c_int {
    let dest: &mut [i16] = match usize::try_from(max) {
        Ok(max) if !dest.is_null() => slice::from_raw_parts_mut(dest, max),
        _ => return 0,
    };
    query(h, 0, |inst| inst.read_samples(dest) as c_int)
}

/// # Safety
///
/// `h` must be a live handle.
#[no_mangle]
pub unsafe extern "C" fn nb_reset(h: NesHandle, hard: c_int) {
    query(h, (), |inst| inst.reset(hard != 0));
}

/// # Safety
///
/// `h` must be a live handle, `size` null or writable.
#[no_mangle]
pub unsafe extern "C" fn nb_state_size(h: NesHandle, size: *mut c_int) -> *const c_char {
    report(h, |inst| {
        put(size, inst.state_size()?);
        Ok(())
    })
}

/// # Safety
///
/// `dest` must be valid for writes of `size` bytes.
#[no_mangle]
pub unsafe extern "C" fn nb_state_save(
    h: NesHandle,
    dest: *mut c_void,
    size: c_int,
) -> *const c_char {
    let dest = bytes_mut(dest, size);
    report(h, |inst| inst.save_state(dest))
}

/// # Safety
///
/// `src` must be valid for reads of `size` bytes.
#[no_mangle]
pub unsafe extern "C" fn nb_state_load(
    h: NesHandle,
    src: *const c_void,
    size: c_int,
) -> *const c_char {
    let src = bytes(src, size);
    report(h, |inst| inst.load_state(src))
}

/// # Safety
///
/// `h` must be a live handle.
#[no_mangle]
pub unsafe extern "C" fn nb_has_battery_ram(h: NesHandle) -> c_int {
    query(h, 0, |inst| inst.has_battery_ram() as c_int)
}

/// # Safety
///
/// `h` must be a live handle, `size` null or writable.
#[no_mangle]
pub unsafe extern "C" fn nb_battery_ram_size(h: NesHandle, size: *mut c_int) -> *const c_char {
    report(h, |inst| {
        put(size, inst.battery_ram_size()?);
        Ok(())
    })
}

/// # Safety
///
/// `dest` must be valid for writes of `size` bytes.
#[no_mangle]
pub unsafe extern "C" fn nb_battery_ram_save(
    h: NesHandle,
    dest: *mut c_void,
    size: c_int,
) -> *const c_char {
    let dest = bytes_mut(dest, size);
    report(h, |inst| inst.save_battery_ram(dest))
}

/// # Safety
///
/// `src` must be valid for reads of `size` bytes.
#[no_mangle]
pub unsafe extern "C" fn nb_battery_ram_load(
    h: NesHandle,
    src: *const c_void,
    size: c_int,
) -> *const c_char {
    let src = bytes(src, size);
    report(h, |inst| inst.load_battery_ram(src))
}

/// # Safety
///
/// `h` must be a live handle.
#[no_mangle]
pub unsafe extern "C" fn nb_battery_ram_clear(h: NesHandle) -> *const c_char {
    report(h, |inst| inst.clear_battery_ram())
}

/// Set the per-line sprite limit: 0, 8 or 64. Other values are logged and ignored.
///
/// # Safety
///
/// `h` must be a live handle.
#[no_mangle]
pub unsafe extern "C" fn nb_set_sprite_limit(h: NesHandle, n: c_int) {
    query(h, (), |inst| {
        if let Err(e) = inst.set_sprite_mode(n) {
            log::warn!("{e}");
        }
    });
}
