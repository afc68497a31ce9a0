
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::{EngineModeFlag, ModeChange, ModeListener, ModeMachine};

/// Engine stand-in recording every flag push.
#[derive(Default)]
pub(super) struct FakeEngine {
    ascii: Mutex<Option<bool>>,
    pushes: AtomicUsize,
}

impl FakeEngine {
    pub fn ready(ascii: bool) -> Self {
        Self {
            ascii: Mutex::new(Some(ascii)),
            pushes: AtomicUsize::new(0),
        }
    }

    /// Simulate the engine flipping its own flag (e.g. Shift key handling).
    pub fn flip_externally(&self, ascii: bool) {
        *self.ascii.lock().unwrap() = Some(ascii);
    }

    pub fn pushes(&self) -> usize {
        self.pushes.load(Ordering::SeqCst)
    }
}

impl EngineModeFlag for FakeEngine {
    fn ascii_mode(&self) -> Option<bool> {
        *self.ascii.lock().unwrap()
    }

    fn set_ascii_mode(&self, ascii: bool) {
        *self.ascii.lock().unwrap() = Some(ascii);
        self.pushes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Attach a listener that records every change it receives.
pub(super) fn record_changes(machine: &ModeMachine) -> Arc<Mutex<Vec<ModeChange>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&log);
    let listener: ModeListener =
        Arc::new(move |change: ModeChange| sink.lock().unwrap().push(change));
    machine.set_listener(Some(listener));
    log
}
