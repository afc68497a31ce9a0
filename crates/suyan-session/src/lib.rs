//! Input-mode state machine.
//!
//! `ModeMachine` holds the one authoritative mode value. Readers load an
//! atomic and never block; transitions are serialized by a mutex, pushed to
//! the engine's ASCII flag, and reported to the single registered listener
//! exactly once. Observers that keep their own copy use [`ModeMirror`] and
//! must treat it as advisory.

mod mirror;
mod types;

#[cfg(test)]
mod tests;

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tracing::{debug, debug_span};

pub use mirror::ModeMirror;
pub use types::{InputMode, ModeChange, ModeOrigin};

/// The external engine's own mode flag.
pub trait EngineModeFlag: Send + Sync {
    /// Current ASCII flag, or `None` while the engine is not ready.
    fn ascii_mode(&self) -> Option<bool>;
    fn set_ascii_mode(&self, ascii: bool);
}

pub type ModeListener = Arc<dyn Fn(ModeChange) + Send + Sync>;

pub struct ModeMachine {
    current: AtomicU8,
    transition: Mutex<()>,
    listener: RwLock<Option<ModeListener>>,
}

impl Default for ModeMachine {
    fn default() -> Self {
        Self::new(InputMode::Primary)
    }
}

impl ModeMachine {
    pub fn new(initial: InputMode) -> Self {
        Self {
            current: AtomicU8::new(initial as u8),
            transition: Mutex::new(()),
            listener: RwLock::new(None),
        }
    }

    /// Start from whatever the engine reports, `Primary` if it is not ready.
    pub fn from_engine<E: EngineModeFlag + ?Sized>(engine: &E) -> Self {
        Self::new(initial_from(engine))
    }

    pub fn current(&self) -> InputMode {
        InputMode::from_u8(self.current.load(Ordering::Acquire))
    }

    /// Replace the change listener. `None` unregisters.
    pub fn set_listener(&self, listener: Option<ModeListener>) {
        let mut slot = self
            .listener
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *slot = listener;
    }

    pub fn toggle<E: EngineModeFlag + ?Sized>(&self, engine: &E) -> Option<ModeChange> {
        self.transition(ModeOrigin::Toggle, InputMode::toggled, |ascii| {
            engine.set_ascii_mode(ascii)
        })
    }

    /// Direct transition. Setting the current mode is ignored.
    pub fn set<E: EngineModeFlag + ?Sized>(
        &self,
        mode: InputMode,
        engine: &E,
    ) -> Option<ModeChange> {
        self.transition(ModeOrigin::Api, |_| mode, |ascii| {
            engine.set_ascii_mode(ascii)
        })
    }

    /// The engine changed its ASCII flag on its own. The engine already holds
    /// the new value, so nothing is pushed back.
    pub fn ascii_mode_changed(&self, ascii: bool) -> Option<ModeChange> {
        self.transition(ModeOrigin::Engine, |_| InputMode::from_ascii(ascii), |_| {})
    }

    /// Collapse `TemporaryLatin` to `Primary`; other modes are kept.
    pub fn revert_temporary<E: EngineModeFlag + ?Sized>(&self, engine: &E) -> Option<ModeChange> {
        self.transition(
            ModeOrigin::Commit,
            |mode| match mode {
                InputMode::TemporaryLatin => InputMode::Primary,
                other => other,
            },
            |ascii| engine.set_ascii_mode(ascii),
        )
    }

    /// Re-read the engine's flag without notifying. Used when the owner is
    /// (re)initialized and there is no previous state worth reporting.
    pub fn resync<E: EngineModeFlag + ?Sized>(&self, engine: &E) -> InputMode {
        let _guard = self
            .transition
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let mode = initial_from(engine);
        self.current.store(mode as u8, Ordering::Release);
        debug!(mode = %mode, "mode resynced from engine");
        mode
    }

    /// Adopt the engine's flag as an engine-originated transition, notifying
    /// the listener when the mode actually changes. An engine that is not
    /// ready reads as `Primary`.
    pub fn sync_from_engine<E: EngineModeFlag + ?Sized>(&self, engine: &E) -> Option<ModeChange> {
        self.transition(ModeOrigin::Engine, |_| initial_from(engine), |_| {})
    }

    /// `push` forwards the new ASCII flag to the engine while the
    /// transition lock is held.
    fn transition(
        &self,
        origin: ModeOrigin,
        next: impl FnOnce(InputMode) -> InputMode,
        push: impl FnOnce(bool),
    ) -> Option<ModeChange> {
        let _span = debug_span!("mode_transition", ?origin).entered();
        let change = {
            let _guard = self
                .transition
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let previous = self.current();
            let current = next(previous);
            if previous == current {
                return None;
            }
            self.current.store(current as u8, Ordering::Release);
            push(current.is_ascii());
            ModeChange {
                previous,
                current,
                origin,
            }
        };
        debug!(previous = %change.previous, current = %change.current, "mode changed");
        self.notify(change);
        Some(change)
    }

    fn notify(&self, change: ModeChange) {
        let listener = self
            .listener
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(listener) = listener {
            listener(change);
        }
    }
}

fn initial_from<E: EngineModeFlag + ?Sized>(engine: &E) -> InputMode {
    engine
        .ascii_mode()
        .map_or(InputMode::Primary, InputMode::from_ascii)
}
