#![allow(non_snake_case)]

use std::ffi::c_void;
use std::sync::Arc;

use suyan_session::{InputMode, ModeChange};
use tracing::warn;

use super::integration;

/// `previous` and `current` are mode codes (0 Primary, 1 Latin,
/// 2 TemporaryLatin).
pub type ImeModeChangedCallback =
    extern "C" fn(previous: i32, current: i32, user_data: *mut c_void);

#[no_mangle]
pub extern "C" fn ImeIntegration_GetInputMode() -> i32 {
    integration().input_mode().code()
}

/// Unknown codes are ignored.
#[no_mangle]
pub extern "C" fn ImeIntegration_SetInputMode(code: i32) {
    match InputMode::from_code(code) {
        Some(mode) => {
            integration().set_input_mode(mode);
        }
        None => warn!(code, "unknown input mode code ignored"),
    }
}

/// Returns the mode code after the toggle.
#[no_mangle]
pub extern "C" fn ImeIntegration_ToggleInputMode() -> i32 {
    integration().toggle_input_mode().code()
}

/// The engine flipped its ASCII flag on its own (non-zero = ASCII).
#[no_mangle]
pub extern "C" fn ImeIntegration_AsciiModeChanged(ascii: u8) {
    integration().ascii_mode_changed(ascii != 0);
}

/// Register the single mode-change callback; a null `callback` unregisters.
/// `user_data` is handed back untouched and must stay valid until replaced.
#[no_mangle]
pub extern "C" fn ImeIntegration_SetModeChangedCallback(
    callback: Option<ImeModeChangedCallback>,
    user_data: *mut c_void,
) {
    let Some(callback) = callback else {
        integration().set_mode_listener(None);
        return;
    };
    // Raw pointers are not Send; the caller owns the pointee's thread-safety.
    let user_data = user_data as usize;
    integration().set_mode_listener(Some(Arc::new(move |change: ModeChange| {
        callback(
            change.previous.code(),
            change.current.code(),
            user_data as *mut c_void,
        );
    })));
}
