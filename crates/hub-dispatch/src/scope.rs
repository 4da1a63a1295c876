//! The executing-component scope.
//!
//! Holds the option of the component currently being dispatched. Dispatch
//! enters a new scope through a guard that restores the previous value when
//! dropped, so the scope is restored on every exit path.

use std::sync::{Arc, Mutex};

/// Shared single-slot scope.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    current: Arc<Mutex<Option<String>>>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<String> {
        self.current.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Sets the scope to `option` until the returned guard drops.
    #[must_use = "the previous scope is restored when the guard drops"]
    pub fn enter(&self, option: impl Into<String>) -> ScopeGuard {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        let previous = current.replace(option.into());
        ScopeGuard {
            scope: self.clone(),
            previous,
        }
    }
}

/// Restores the previous scope on drop.
#[derive(Debug)]
pub struct ScopeGuard {
    scope: Scope,
    previous: Option<String>,
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        let mut current = self.scope.current.lock().unwrap_or_else(|e| e.into_inner());
        *current = self.previous.take();
    }
}
