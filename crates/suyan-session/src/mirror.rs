use std::sync::atomic::{AtomicU8, Ordering};

use crate::{EngineModeFlag, InputMode, ModeChange, ModeMachine};

/// Observer-side copy of the mode (menu items, status icons).
///
/// The cached value may be stale. Anything that decides based on the mode
/// goes through [`ModeMirror::refresh`] or [`ModeMirror::toggle_through`].
pub struct ModeMirror {
    cached: AtomicU8,
}

impl ModeMirror {
    pub fn new(machine: &ModeMachine) -> Self {
        Self {
            cached: AtomicU8::new(machine.current() as u8),
        }
    }

    /// Last known value, for display only.
    pub fn cached(&self) -> InputMode {
        InputMode::from_u8(self.cached.load(Ordering::Acquire))
    }

    pub fn refresh(&self, machine: &ModeMachine) -> InputMode {
        let mode = machine.current();
        self.cached.store(mode as u8, Ordering::Release);
        mode
    }

    /// Apply a pushed change notification.
    pub fn observe(&self, change: &ModeChange) {
        self.cached.store(change.current as u8, Ordering::Release);
    }

    /// Toggle on the authoritative machine, never on the cached copy.
    pub fn toggle_through<E: EngineModeFlag + ?Sized>(
        &self,
        machine: &ModeMachine,
        engine: &E,
    ) -> Option<ModeChange> {
        let change = machine.toggle(engine);
        self.refresh(machine);
        change
    }
}
