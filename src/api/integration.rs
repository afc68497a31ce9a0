use std::io;
use std::path::Path;
use std::sync::Arc;

use suyan_session::{EngineModeFlag, ModeChange};

use crate::engine_bridge::{BridgeError, EngineBridge, LocalEngine};
use crate::integration::ImeIntegration;

use super::{SyError, SyInputMode, SyLearnedPhrase, SyModeChange};

/// Engine bridge implemented on the host side (Swift, Kotlin, ...).
#[uniffi::export(with_foreign)]
pub trait SyEngineBridge: Send + Sync {
    /// `None` while the engine is not ready.
    fn ascii_mode(&self) -> Option<bool>;
    fn set_ascii_mode(&self, ascii: bool);
    fn on_initialize(&self, user_dir: String, shared_dir: String) -> Result<(), SyError>;
    fn on_shutdown(&self);
    fn config_value(&self, key: String) -> Option<String>;
    fn set_config_value(&self, key: String, value: String) -> Result<(), SyError>;
}

/// Receives every effective mode transition.
#[uniffi::export(with_foreign)]
pub trait SyModeObserver: Send + Sync {
    fn on_mode_changed(&self, change: SyModeChange);
}

/// Adapts a host-side bridge to [`EngineBridge`].
struct ForeignEngine(Arc<dyn SyEngineBridge>);

impl EngineModeFlag for ForeignEngine {
    fn ascii_mode(&self) -> Option<bool> {
        self.0.ascii_mode()
    }

    fn set_ascii_mode(&self, ascii: bool) {
        self.0.set_ascii_mode(ascii);
    }
}

impl EngineBridge for ForeignEngine {
    fn on_initialize(&self, user_dir: &Path, shared_dir: &Path) -> Result<(), BridgeError> {
        self.0
            .on_initialize(
                user_dir.to_string_lossy().into_owned(),
                shared_dir.to_string_lossy().into_owned(),
            )
            .map_err(|e| BridgeError::Io(io::Error::other(e.to_string())))
    }

    fn on_shutdown(&self) {
        self.0.on_shutdown();
    }

    fn config_value(&self, key: &str) -> Option<String> {
        self.0.config_value(key.to_string())
    }

    fn set_config_value(&self, key: &str, value: &str) -> Result<(), BridgeError> {
        self.0
            .set_config_value(key.to_string(), value.to_string())
            .map_err(|_| BridgeError::Rejected {
                key: key.to_string(),
            })
    }
}

#[derive(uniffi::Object)]
pub struct SyIntegration {
    inner: ImeIntegration,
}

#[uniffi::export]
impl SyIntegration {
    /// Without a host bridge the in-process engine is used.
    #[uniffi::constructor]
    fn new(bridge: Option<Arc<dyn SyEngineBridge>>) -> Arc<Self> {
        let engine: Arc<dyn EngineBridge> = match bridge {
            Some(bridge) => Arc::new(ForeignEngine(bridge)),
            None => Arc::new(LocalEngine::new()),
        };
        Arc::new(Self {
            inner: ImeIntegration::new(engine),
        })
    }

    fn initialize(&self, user_dir: String, shared_dir: String) -> Result<(), SyError> {
        Ok(self
            .inner
            .initialize(Path::new(&user_dir), Path::new(&shared_dir))?)
    }

    fn shutdown(&self) {
        self.inner.shutdown();
    }

    fn is_initialized(&self) -> bool {
        self.inner.is_initialized()
    }

    /// Pin a settings file for the next `initialize`.
    fn load_settings(&self, path: String) -> Result<(), SyError> {
        Ok(self.inner.load_settings_file(Path::new(&path))?)
    }

    fn merge_candidates(
        &self,
        candidates: Vec<String>,
        context: String,
        capacity: Option<u32>,
    ) -> Vec<String> {
        self.inner
            .merge_candidates(&candidates, &context, capacity.map(|c| c as usize))
    }

    fn record_selection(&self, word: String, context: String) {
        self.inner.record_selection(&word, &context);
    }

    fn record_consecutive_selection(&self, word: String, context: String) {
        self.inner.record_consecutive_selection(&word, &context);
    }

    fn break_sequence(&self) {
        self.inner.break_sequence();
    }

    fn on_commit_complete(&self) -> Option<SyLearnedPhrase> {
        self.inner.on_commit_complete().map(Into::into)
    }

    /// Remove a learned phrase and keep it from being learned again.
    fn reject_phrase(&self, word: String, context: String) -> bool {
        self.inner.reject_phrase(&word, &context)
    }

    fn frequency(&self, context: String, word: String) -> u64 {
        self.inner.frequency(&context, &word)
    }

    fn flush(&self) -> Result<(), SyError> {
        Ok(self.inner.flush()?)
    }

    fn input_mode(&self) -> SyInputMode {
        self.inner.input_mode().into()
    }

    fn set_input_mode(&self, mode: SyInputMode) {
        self.inner.set_input_mode(mode.into());
    }

    fn toggle_input_mode(&self) -> SyInputMode {
        self.inner.toggle_input_mode().into()
    }

    fn ascii_mode_changed(&self, ascii: bool) {
        self.inner.ascii_mode_changed(ascii);
    }

    /// `None` unregisters the current observer.
    fn set_mode_observer(&self, observer: Option<Arc<dyn SyModeObserver>>) {
        let listener = observer.map(|observer| {
            Arc::new(move |change: ModeChange| observer.on_mode_changed(change.into()))
                as suyan_session::ModeListener
        });
        self.inner.set_mode_listener(listener);
    }

    fn get_config(&self, key: String, default_value: String) -> String {
        self.inner.get_config(&key, &default_value)
    }

    fn set_config(&self, key: String, value: String) -> Result<(), SyError> {
        Ok(self.inner.set_config(&key, &value)?)
    }
}
