//! Change fan-out to mounted views
//!
//! Each view registers a callback under its own [`ObserverId`]. A view that
//! dispatches a command passes its id as the publish source and is skipped,
//! so it never re-processes its own change.
//!
//! Versions only move forward: a change older than one already published is
//! not delivered, including the rest of an outer publish interrupted by a
//! callback that dispatched a newer change.

use parking_lot::{Mutex, RwLock};
use reclist_editor::Change;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObserverId(String);

impl ObserverId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ObserverId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub type ObserverCallback = Arc<dyn Fn(&Change) + Send + Sync>;

/// Registry of change observers, called in registration order
#[derive(Default)]
pub struct ChangeObserverHub {
    observers: RwLock<Vec<(ObserverId, ObserverCallback)>>,
    /// Highest version handed to `publish`
    published: Mutex<u64>,
}

impl ChangeObserverHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback`, replacing any callback already under `id`
    pub fn add<F>(&self, id: impl Into<ObserverId>, callback: F)
    where
        F: Fn(&Change) + Send + Sync + 'static,
    {
        let id = id.into();
        let callback: ObserverCallback = Arc::new(callback);
        let mut observers = self.observers.write();

        match observers.iter_mut().find(|(existing, _)| *existing == id) {
            Some(slot) => {
                debug!(observer = %id, "observer replaced");
                slot.1 = callback;
            }
            None => {
                debug!(observer = %id, "observer added");
                observers.push((id, callback));
            }
        }
    }

    /// Returns true if an observer was removed
    pub fn remove(&self, id: &ObserverId) -> bool {
        let mut observers = self.observers.write();
        let before = observers.len();
        observers.retain(|(existing, _)| existing != id);
        let removed = observers.len() != before;
        if removed {
            debug!(observer = %id, "observer removed");
        }
        removed
    }

    pub fn contains(&self, id: &ObserverId) -> bool {
        self.observers.read().iter().any(|(existing, _)| existing == id)
    }

    pub fn len(&self) -> usize {
        self.observers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Call every observer except `source`. Returns how many were called.
    ///
    /// Callbacks run after the registry lock is released, so a callback may
    /// add or remove observers.
    pub fn publish(&self, change: &Change, source: Option<&ObserverId>) -> usize {
        {
            let mut published = self.published.lock();
            if change.version < *published {
                debug!(version = change.version, latest = *published, "stale change not published");
                return 0;
            }
            *published = change.version;
        }

        let targets: Vec<(ObserverId, ObserverCallback)> = self
            .observers
            .read()
            .iter()
            .filter(|(id, _)| Some(id) != source)
            .cloned()
            .collect();

        let mut notified = 0;
        for (id, callback) in &targets {
            if change.version < *self.published.lock() {
                debug!(version = change.version, "newer change published during delivery");
                break;
            }
            trace!(observer = %id, version = change.version, "notifying observer");
            callback(change);
            notified += 1;
        }

        notified
    }
}
