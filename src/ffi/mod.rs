//! C ABI: each sub-module exposes one area of the `ImeIntegration_*` API.
//!
//! The process-wide façade lives here, in [`integration`]; nothing else in
//! the crate assumes a single instance. Helpers and macros shared across
//! sub-modules live here too.

use std::ffi::{c_char, CStr};
use std::sync::{Arc, OnceLock};

use crate::engine_bridge::LocalEngine;
use crate::integration::ImeIntegration;

pub mod candidates;
pub mod config;
pub mod lifecycle;
pub mod mode;
pub mod selection;


pub use candidates::*;
pub use config::*;
pub use lifecycle::*;
pub use mode::*;
pub use selection::*;

pub(crate) const STATUS_OK: i32 = 0;
pub(crate) const STATUS_FAILED: i32 = -1;

static INTEGRATION: OnceLock<ImeIntegration> = OnceLock::new();

/// The instance behind every `ImeIntegration_*` symbol, backed by
/// [`LocalEngine`].
pub(crate) fn integration() -> &'static ImeIntegration {
    INTEGRATION.get_or_init(|| ImeIntegration::new(Arc::new(LocalEngine::new())))
}

/// Safely convert a C string pointer to a `&str`.
/// Returns `None` if the pointer is null or contains invalid UTF-8.
pub(crate) unsafe fn cptr_to_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok()
}

/// Collect a NULL-terminated array of C strings.
///
/// # Safety
/// `array` must be null or point to a NULL-terminated array of valid,
/// NUL-terminated strings.
pub(crate) unsafe fn cstr_array<'a>(array: *const *const c_char) -> Vec<&'a CStr> {
    let mut items = Vec::new();
    if array.is_null() {
        return items;
    }
    let mut cursor = array;
    while !(*cursor).is_null() {
        items.push(CStr::from_ptr(*cursor));
        cursor = cursor.add(1);
    }
    items
}

// ---------------------------------------------------------------------------
// FFI boilerplate-reduction macros (crate-internal)
// ---------------------------------------------------------------------------

/// Validate one or more FFI arguments and bind them as safe Rust values,
/// returning `$on_err` from the **calling** function if any check fails.
///
/// | Syntax | What it does |
/// |--------|--------------|
/// | `str: $name = $ptr` | Null-check `$ptr: *const c_char`, convert via [`cptr_to_str`] to `&str`, bind as `$name`. |
/// | `nonnull: $ptr`      | Assert `$ptr` is non-null (no new binding is introduced). |
///
/// ```ignore
/// ffi_guard!(STATUS_FAILED;
///     str: key   = key_ptr,
///     str: value = value_ptr,
/// );
/// ```
macro_rules! ffi_guard {
    ($on_err:expr ; ) => {};

    ($on_err:expr ; str: $name:ident = $ptr:expr , $($rest:tt)*) => {
        let Some($name) = (unsafe { $crate::ffi::cptr_to_str($ptr) }) else {
            return $on_err;
        };
        $crate::ffi::ffi_guard!($on_err ; $($rest)*);
    };

    ($on_err:expr ; nonnull: $ptr:expr , $($rest:tt)*) => {
        if $ptr.is_null() {
            return $on_err;
        }
        $crate::ffi::ffi_guard!($on_err ; $($rest)*);
    };
}

pub(crate) use ffi_guard;
