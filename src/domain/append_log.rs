//! Append-only, thread-safe record sequence.

use std::sync::{Mutex, MutexGuard};

/// A sequence that only grows. Appends from several threads are atomic
/// with respect to each other.
#[derive(Debug)]
pub struct AppendLog<T> {
    entries: Mutex<Vec<T>>,
}

impl<T: Clone> Default for AppendLog<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> AppendLog<T> {
    pub fn new() -> Self {
        AppendLog {
            entries: Mutex::new(Vec::new()),
        }
    }

    pub fn append(&self, entry: T) {
        self.lock().push(entry);
    }

    /// Copy of every entry, in append order.
    pub fn snapshot(&self) -> Vec<T> {
        self.lock().clone()
    }

    // A panic elsewhere cannot leave a half-pushed Vec, so poisoned data is still valid.
    fn lock(&self) -> MutexGuard<'_, Vec<T>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
