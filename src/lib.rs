//! Learning layer for an input-method engine.
//!
//! [`ImeIntegration`] is the façade the engine bridge and the presentation
//! layer talk to. The C ABI in [`ffi`] owns one process-wide instance; the
//! UniFFI objects in [`api`] wrap their own.

// FFI functions perform null checks before dereferencing raw pointers.
// Clippy cannot verify this statically, so we allow it at crate level.
#![allow(clippy::not_unsafe_ptr_arg_deref)]

uniffi::setup_scaffolding!();

pub mod api;
pub mod engine_bridge;
pub mod ffi;
pub mod integration;
mod trace_init;

pub use engine_bridge::{BridgeError, EngineBridge, LocalEngine};
pub use integration::{ImeIntegration, IntegrationError};
pub use suyan_core::{LearnedPhrase, Settings};
pub use suyan_session::{EngineModeFlag, InputMode, ModeChange, ModeListener, ModeMirror};
