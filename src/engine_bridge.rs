//! Seam to the external candidate-generation engine.
//!
//! The façade never caches engine configuration: every `get_config` goes
//! through [`EngineBridge::config_value`]. [`LocalEngine`] is the in-process
//! implementation backing the C ABI; hosts with a real engine supply their
//! own bridge.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use suyan_session::EngineModeFlag;
use tracing::{debug, warn};

pub const ENGINE_CONFIG_FILE: &str = "suyan_engine.toml";

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("engine rejected config key {key:?}")]
    Rejected { key: String },
    #[error("engine I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("engine config serialization failed: {0}")]
    Serialize(String),
}

/// What the façade needs from the external engine.
pub trait EngineBridge: EngineModeFlag {
    /// Called once the façade has resolved its directories.
    fn on_initialize(&self, user_dir: &Path, shared_dir: &Path) -> Result<(), BridgeError>;
    fn on_shutdown(&self);
    fn config_value(&self, key: &str) -> Option<String>;
    fn set_config_value(&self, key: &str, value: &str) -> Result<(), BridgeError>;
}

#[derive(Default)]
struct LocalState {
    /// `None` until `on_initialize`.
    ascii: Option<bool>,
    config_path: Option<PathBuf>,
    options: BTreeMap<String, String>,
}

/// In-process engine state: the ASCII flag plus string options persisted to
/// `<user>/suyan_engine.toml`, written through on every set.
#[derive(Default)]
pub struct LocalEngine {
    state: Mutex<LocalState>,
}

impl LocalEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, LocalState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn load_options(path: &Path) -> BTreeMap<String, String> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return BTreeMap::new(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "engine config unreadable");
            return BTreeMap::new();
        }
    };
    match toml::from_str(&content) {
        Ok(options) => options,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "engine config invalid, starting empty");
            BTreeMap::new()
        }
    }
}

fn save_options(path: &Path, options: &BTreeMap<String, String>) -> Result<(), BridgeError> {
    let body = toml::to_string(options).map_err(|e| BridgeError::Serialize(e.to_string()))?;
    let tmp = path.with_extension("toml.tmp");
    fs::write(&tmp, body)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

impl EngineModeFlag for LocalEngine {
    fn ascii_mode(&self) -> Option<bool> {
        self.state().ascii
    }

    fn set_ascii_mode(&self, ascii: bool) {
        let mut state = self.state();
        if state.ascii.is_some() {
            state.ascii = Some(ascii);
        }
    }
}

impl EngineBridge for LocalEngine {
    fn on_initialize(&self, user_dir: &Path, _shared_dir: &Path) -> Result<(), BridgeError> {
        let path = user_dir.join(ENGINE_CONFIG_FILE);
        let options = load_options(&path);
        debug!(path = %path.display(), options = options.len(), "local engine ready");
        let mut state = self.state();
        state.options = options;
        state.config_path = Some(path);
        state.ascii.get_or_insert(false);
        Ok(())
    }

    fn on_shutdown(&self) {
        let mut state = self.state();
        state.ascii = None;
        state.config_path = None;
        state.options.clear();
    }

    fn config_value(&self, key: &str) -> Option<String> {
        self.state().options.get(key).cloned()
    }

    fn set_config_value(&self, key: &str, value: &str) -> Result<(), BridgeError> {
        if key.is_empty() {
            return Err(BridgeError::Rejected {
                key: key.to_string(),
            });
        }
        let mut state = self.state();
        let Some(path) = state.config_path.clone() else {
            return Err(BridgeError::Rejected {
                key: key.to_string(),
            });
        };
        let previous = state.options.insert(key.to_string(), value.to_string());
        if let Err(e) = save_options(&path, &state.options) {
            match previous {
                Some(old) => state.options.insert(key.to_string(), old),
                None => state.options.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }
}
