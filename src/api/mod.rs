//! UniFFI export layer: type-safe Swift bindings for the learning layer.
//!
//! Each public type here maps to a generated Swift class, struct, enum or
//! protocol.

mod integration;
mod types;

pub use integration::{SyEngineBridge, SyIntegration, SyModeObserver};
pub use types::{SyError, SyInputMode, SyLearnedPhrase, SyModeChange, SyModeOrigin};

use std::path::Path;

#[uniffi::export]
fn engine_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[uniffi::export]
fn settings_default_config() -> String {
    suyan_core::settings::default_toml().to_string()
}

/// `true` when this call started the trace log.
#[uniffi::export]
fn trace_init(log_dir: String) -> bool {
    crate::trace_init::init_tracing(Path::new(&log_dir))
}
