#![allow(non_snake_case)]

use std::ffi::c_char;

use super::{ffi_guard, integration, STATUS_FAILED, STATUS_OK};

#[no_mangle]
#[allow(clippy::unused_unit)]
pub extern "C" fn ImeIntegration_RecordSelection(word: *const c_char, context: *const c_char) {
    ffi_guard!(();
        str: word = word,
        str: context = context,
    );
    integration().record_selection(word, context);
}

#[no_mangle]
#[allow(clippy::unused_unit)]
pub extern "C" fn ImeIntegration_RecordConsecutive(word: *const c_char, context: *const c_char) {
    ffi_guard!(();
        str: word = word,
        str: context = context,
    );
    integration().record_consecutive_selection(word, context);
}

#[no_mangle]
pub extern "C" fn ImeIntegration_BreakSequence() {
    integration().break_sequence();
}

#[no_mangle]
pub extern "C" fn ImeIntegration_OnCommit() {
    integration().on_commit_complete();
}

/// Forget a learned phrase and keep it from being learned again.
/// Returns 0 when an entry was removed, -1 otherwise.
#[no_mangle]
pub extern "C" fn ImeIntegration_RejectPhrase(word: *const c_char, context: *const c_char) -> i32 {
    ffi_guard!(STATUS_FAILED;
        str: word = word,
        str: context = context,
    );
    if integration().reject_phrase(word, context) {
        STATUS_OK
    } else {
        STATUS_FAILED
    }
}
