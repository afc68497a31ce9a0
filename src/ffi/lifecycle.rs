#![allow(non_snake_case)]

use std::ffi::c_char;
use std::path::Path;

use tracing::warn;

use super::{ffi_guard, integration, STATUS_FAILED, STATUS_OK};

#[no_mangle]
pub extern "C" fn suyan_engine_version() -> *const c_char {
    c"0.1.0".as_ptr()
}

/// Start the JSON trace log in `log_dir`. Returns 0 when this call
/// installed it, -1 otherwise (already running, or built without `trace`).
#[no_mangle]
pub extern "C" fn suyan_trace_init(log_dir: *const c_char) -> i32 {
    ffi_guard!(STATUS_FAILED;
        str: dir = log_dir,
    );
    if crate::trace_init::init_tracing(Path::new(dir)) {
        STATUS_OK
    } else {
        STATUS_FAILED
    }
}

/// Returns 0 on success, -1 on failure. Calling it while already initialized
/// is a contract violation: the live state is kept and 0 is returned.
#[no_mangle]
pub extern "C" fn ImeIntegration_Initialize(
    user_path: *const c_char,
    shared_path: *const c_char,
) -> i32 {
    ffi_guard!(STATUS_FAILED;
        str: user = user_path,
        str: shared = shared_path,
    );
    match integration().initialize(Path::new(user), Path::new(shared)) {
        Ok(()) => STATUS_OK,
        Err(e) => {
            warn!(error = %e, "initialize failed");
            STATUS_FAILED
        }
    }
}

#[no_mangle]
pub extern "C" fn ImeIntegration_Shutdown() {
    integration().shutdown();
}
