#![allow(non_snake_case)]

use std::ffi::{c_char, CString};
use std::ptr;

use tracing::debug;

use super::{cptr_to_str, cstr_array, integration};

/// Merge a NULL-terminated candidate array for `context` into `out`.
///
/// Writes at most `capacity` newly allocated strings and returns how many
/// were written. The caller releases them with
/// [`ImeIntegration_FreeMergedCandidates`]; the input array stays owned by
/// the caller. When `context` or any candidate is not valid UTF-8, the input
/// is copied through unchanged.
#[no_mangle]
pub extern "C" fn ImeIntegration_MergeCandidates(
    candidates: *const *const c_char,
    context: *const c_char,
    out: *mut *mut c_char,
    capacity: i32,
) -> i32 {
    if candidates.is_null() || out.is_null() || capacity <= 0 {
        return 0;
    }
    let capacity = capacity as usize;
    let input = unsafe { cstr_array(candidates) };
    let context = unsafe { cptr_to_str(context) };
    let words: Option<Vec<String>> = input
        .iter()
        .map(|c| c.to_str().ok().map(str::to_string))
        .collect();

    let merged: Vec<CString> = match (context, words) {
        (Some(context), Some(words)) => integration()
            .merge_candidates(&words, context, Some(capacity))
            .into_iter()
            .filter_map(|w| CString::new(w).ok())
            .collect(),
        _ => {
            debug!("candidates not UTF-8, passing through");
            input.iter().map(|&c| c.to_owned()).collect()
        }
    };

    let mut written = 0;
    for word in merged.into_iter().take(capacity) {
        unsafe { *out.add(written) = word.into_raw() };
        written += 1;
    }
    written as i32
}

/// Release `count` strings written by [`ImeIntegration_MergeCandidates`]
/// and null the slots.
#[no_mangle]
pub extern "C" fn ImeIntegration_FreeMergedCandidates(out: *mut *mut c_char, count: i32) {
    if out.is_null() || count <= 0 {
        return;
    }
    for i in 0..count as usize {
        unsafe {
            let slot = out.add(i);
            if !(*slot).is_null() {
                drop(CString::from_raw(*slot));
                *slot = ptr::null_mut();
            }
        }
    }
}
