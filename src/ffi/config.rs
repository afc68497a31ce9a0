#![allow(non_snake_case)]

use std::ffi::c_char;
use std::ptr;

use tracing::warn;

use super::{cptr_to_str, ffi_guard, integration, STATUS_FAILED, STATUS_OK};

/// Write the value of `key` (or `default_value`) into `out` as a
/// NUL-terminated string, truncated on a character boundary to fit
/// `capacity - 1` bytes. Returns the byte count written, excluding the NUL.
#[no_mangle]
pub extern "C" fn ImeIntegration_GetConfig(
    key: *const c_char,
    default_value: *const c_char,
    out: *mut c_char,
    capacity: i32,
) -> i32 {
    ffi_guard!(0;
        nonnull: out,
    );
    if capacity <= 0 {
        return 0;
    }
    let default = unsafe { cptr_to_str(default_value) }.unwrap_or("");
    let value = match unsafe { cptr_to_str(key) } {
        Some(key) => integration().get_config(key, default),
        None => default.to_string(),
    };

    let bytes = truncate_on_char_boundary(&value, capacity as usize - 1);
    unsafe {
        ptr::copy_nonoverlapping(bytes.as_ptr(), out.cast::<u8>(), bytes.len());
        *out.add(bytes.len()) = 0;
    }
    bytes.len() as i32
}

/// Returns 0 on success, -1 when not initialized or the engine refuses.
#[no_mangle]
pub extern "C" fn ImeIntegration_SetConfig(key: *const c_char, value: *const c_char) -> i32 {
    ffi_guard!(STATUS_FAILED;
        str: key = key,
        str: value = value,
    );
    match integration().set_config(key, value) {
        Ok(()) => STATUS_OK,
        Err(e) => {
            warn!(key, error = %e, "set config failed");
            STATUS_FAILED
        }
    }
}

pub(crate) fn truncate_on_char_boundary(s: &str, max_bytes: usize) -> &[u8] {
    if s.len() <= max_bytes {
        return s.as_bytes();
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s.as_bytes()[..end]
}
