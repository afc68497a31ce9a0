//! Integration façade: the single entry point for the engine bridge and the
//! presentation layer.
//!
//! Owns the initialize/shutdown lifecycle and guards every component behind
//! it. While not initialized, merging is pass-through, recording and commit
//! are no-ops, config reads return the caller's default and config writes
//! fail with [`IntegrationError::NotInitialized`].


use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard};

use suyan_core::settings::{self, SettingsError};
use suyan_core::{
    CandidateMerger, FrequencyStore, LearnedPhrase, SelectionRecorder, Settings, StoreError,
};
use suyan_session::{InputMode, ModeChange, ModeListener, ModeMachine};
use tracing::{debug, debug_span, info, warn};

use crate::engine_bridge::{BridgeError, EngineBridge};

pub const FREQUENCY_FILE: &str = "user_frequency.syfq";
pub const SETTINGS_FILE: &str = "suyan_settings.toml";

#[derive(Debug, thiserror::Error)]
pub enum IntegrationError {
    #[error("integration not initialized")]
    NotInitialized,
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),
    #[error("engine bridge error: {0}")]
    Bridge(#[from] BridgeError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Everything that exists only between `initialize` and `shutdown`.
struct Live {
    store: FrequencyStore,
    recorder: Mutex<SelectionRecorder>,
    merger: CandidateMerger,
    settings: Settings,
}

pub struct ImeIntegration {
    engine: Arc<dyn EngineBridge>,
    mode: ModeMachine,
    live: RwLock<Option<Live>>,
    pinned_settings: RwLock<Option<Settings>>,
}

impl ImeIntegration {
    pub fn new(engine: Arc<dyn EngineBridge>) -> Self {
        let mode = ModeMachine::from_engine(&*engine);
        Self {
            engine,
            mode,
            live: RwLock::new(None),
            pinned_settings: RwLock::new(None),
        }
    }

    /// Use `settings` on every `initialize` instead of looking for files.
    pub fn with_settings(engine: Arc<dyn EngineBridge>, settings: Settings) -> Self {
        let integration = Self::new(engine);
        *integration
            .pinned_settings
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(settings);
        integration
    }

    /// Validate a settings file and pin it for the next `initialize`.
    pub fn load_settings_file(&self, path: &Path) -> Result<(), IntegrationError> {
        let content = fs::read_to_string(path)?;
        let parsed = settings::parse_settings_toml(&content)?;
        debug!(path = %path.display(), "settings pinned");
        *self
            .pinned_settings
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(parsed);
        Ok(())
    }

    /// Bring the learning layer up for `user_dir`.
    ///
    /// Calling this while already initialized is a contract violation: the
    /// live state is kept as is, a warning is logged and `Ok` is returned.
    /// Callers must `shutdown` first to switch directories.
    pub fn initialize(&self, user_dir: &Path, shared_dir: &Path) -> Result<(), IntegrationError> {
        let _span = debug_span!("initialize", user = %user_dir.display()).entered();
        let mut live = self.live.write().unwrap_or_else(PoisonError::into_inner);
        if live.is_some() {
            warn!("initialize called while live; keeping current state");
            return Ok(());
        }

        fs::create_dir_all(user_dir)?;
        let settings = self.resolve_settings(user_dir, shared_dir);
        self.engine.on_initialize(user_dir, shared_dir)?;

        let store = open_store(&user_dir.join(FREQUENCY_FILE), &settings);
        let recorder = SelectionRecorder::new(settings.learning.clone(), &settings.frequency);
        let merger = CandidateMerger::new(settings.merge.clone());
        *live = Some(Live {
            store,
            recorder: Mutex::new(recorder),
            merger,
            settings,
        });
        drop(live);

        let mode = self.mode.resync(&*self.engine);
        info!(mode = %mode, "integration initialized");
        Ok(())
    }

    /// Discard the pending phrase, persist the store and release the engine.
    /// The mode then follows the released engine (normally `Primary`), with
    /// an [`ModeOrigin::Engine`](suyan_session::ModeOrigin::Engine) change
    /// reported when it moves. A no-op when not initialized.
    pub fn shutdown(&self) {
        let _span = debug_span!("shutdown").entered();
        let Some(live) = self
            .live
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        else {
            return;
        };
        if let Err(e) = live.store.close() {
            warn!(error = %e, "frequency store close failed");
        }
        self.engine.on_shutdown();
        // The engine is no longer ready; observers hear about the collapse.
        self.mode.sync_from_engine(&*self.engine);
        info!(mode = %self.mode.current(), "integration shut down");
    }

    pub fn is_initialized(&self) -> bool {
        self.live().is_some()
    }

    /// Re-rank `candidates` for `context`. Pass-through when not initialized.
    pub fn merge_candidates(
        &self,
        candidates: &[String],
        context: &str,
        capacity: Option<usize>,
    ) -> Vec<String> {
        match &*self.live() {
            Some(live) => live
                .merger
                .merge(&live.store, candidates, context, capacity),
            None => candidates.to_vec(),
        }
    }

    pub fn record_selection(&self, word: &str, context: &str) {
        if let Some(live) = &*self.live() {
            live.recorder().record_selection(&live.store, word, context);
        }
    }

    pub fn record_consecutive_selection(&self, word: &str, context: &str) {
        if let Some(live) = &*self.live() {
            live.recorder()
                .record_consecutive(&live.store, word, context);
        }
    }

    /// The explicit "not consecutive" signal: drop the pending phrase.
    pub fn break_sequence(&self) {
        if let Some(live) = &*self.live() {
            live.recorder().break_sequence();
        }
    }

    /// Learn the pending phrase, if any, and revert a one-shot Latin mode.
    pub fn on_commit_complete(&self) -> Option<LearnedPhrase> {
        let (learned, revert) = {
            let guard = self.live();
            let live = guard.as_ref()?;
            let pair = (
                live.recorder().on_commit_complete(&live.store),
                live.settings.mode.revert_temporary_on_commit,
            );
            pair
        };
        if revert {
            self.mode.revert_temporary(&*self.engine);
        }
        learned
    }

    /// Remove a learned phrase and stop it from being learned again while
    /// live. Returns whether a learned entry was removed.
    pub fn reject_phrase(&self, word: &str, context: &str) -> bool {
        match &*self.live() {
            Some(live) => live.recorder().reject_phrase(&live.store, word, context),
            None => false,
        }
    }

    /// Buffered segments awaiting the next commit.
    pub fn pending_segments(&self) -> usize {
        self.live()
            .as_ref()
            .map_or(0, |live| live.recorder().pending_len())
    }

    /// Learned score for observers; 0 when not initialized.
    pub fn frequency(&self, context: &str, word: &str) -> u64 {
        self.live()
            .as_ref()
            .map_or(0, |live| live.store.get(context, word))
    }

    /// Force a checkpoint of the live store.
    pub fn flush(&self) -> Result<(), IntegrationError> {
        match &*self.live() {
            Some(live) => Ok(live.store.flush()?),
            None => Err(IntegrationError::NotInitialized),
        }
    }

    pub fn input_mode(&self) -> InputMode {
        self.mode.current()
    }

    pub fn set_input_mode(&self, mode: InputMode) -> Option<ModeChange> {
        if !self.is_initialized() {
            return None;
        }
        self.mode.set(mode, &*self.engine)
    }

    /// Returns the mode after the toggle.
    pub fn toggle_input_mode(&self) -> InputMode {
        if self.is_initialized() {
            self.mode.toggle(&*self.engine);
        }
        self.mode.current()
    }

    /// The engine changed its ASCII flag on its own.
    pub fn ascii_mode_changed(&self, ascii: bool) -> Option<ModeChange> {
        if !self.is_initialized() {
            return None;
        }
        self.mode.ascii_mode_changed(ascii)
    }

    /// Register the single mode-change callback. `None` unregisters.
    pub fn set_mode_listener(&self, listener: Option<ModeListener>) {
        self.mode.set_listener(listener);
    }

    /// Authoritative mode for observers keeping a
    /// [`ModeMirror`](suyan_session::ModeMirror).
    pub fn mode_machine(&self) -> &ModeMachine {
        &self.mode
    }

    pub fn engine(&self) -> &dyn EngineBridge {
        &*self.engine
    }

    /// Read straight from the engine; nothing is cached here.
    pub fn get_config(&self, key: &str, default: &str) -> String {
        if !self.is_initialized() {
            return default.to_string();
        }
        self.engine
            .config_value(key)
            .unwrap_or_else(|| default.to_string())
    }

    pub fn set_config(&self, key: &str, value: &str) -> Result<(), IntegrationError> {
        if !self.is_initialized() {
            return Err(IntegrationError::NotInitialized);
        }
        self.engine.set_config_value(key, value).map_err(|e| {
            warn!(key, error = %e, "config write failed");
            IntegrationError::from(e)
        })
    }

    fn live(&self) -> RwLockReadGuard<'_, Option<Live>> {
        self.live.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn resolve_settings(&self, user_dir: &Path, shared_dir: &Path) -> Settings {
        if let Some(pinned) = &*self
            .pinned_settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
        {
            return pinned.clone();
        }
        let candidates: [PathBuf; 2] = [
            user_dir.join(SETTINGS_FILE),
            shared_dir.join(SETTINGS_FILE),
        ];
        let (settings, source) = settings::load_first(&candidates);
        match source {
            Some(path) => debug!(path = %path.display(), "using settings file"),
            None => debug!("using embedded settings"),
        }
        settings
    }
}

impl Drop for ImeIntegration {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl Live {
    fn recorder(&self) -> std::sync::MutexGuard<'_, SelectionRecorder> {
        self.recorder.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A store that cannot be opened degrades to an unavailable one: reads are
/// 0 and writes are dropped, so merging becomes pass-through ordering.
fn open_store(path: &Path, settings: &Settings) -> FrequencyStore {
    match FrequencyStore::open(path, &settings.frequency) {
        Ok(store) => store,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "frequency store unavailable");
            FrequencyStore::unavailable()
        }
    }
}
