//! Active call bookkeeping for one account
//!
//! [`CallRegistry`] maps engine call ids to [`Call`] handles. Every operation
//! takes the internal lock only for the duration of the map operation, so
//! readers on the application side always observe a consistent snapshot and
//! never block the engine's callbacks for long.
//!
//! Removing or looking up an unknown id is not an error: duplicate teardown
//! notifications are a normal protocol race.

use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;

use crate::call::{Call, CallId};

/// Mapping from call id to call for one account
#[derive(Debug, Default)]
pub struct CallRegistry {
    calls: RwLock<HashMap<CallId, Call>>,
}

impl CallRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or overwrite the entry for `call_id`
    pub fn insert(&self, call_id: CallId, call: Call) {
        self.calls.write().insert(call_id, call);
    }

    /// Remove the entry for `call_id`, returning it if it was present
    pub fn remove(&self, call_id: CallId) -> Option<Call> {
        self.calls.write().remove(&call_id)
    }

    /// Look up a call
    pub fn get(&self, call_id: CallId) -> Option<Call> {
        self.calls.read().get(&call_id).cloned()
    }

    /// Whether `call_id` is active
    pub fn contains(&self, call_id: CallId) -> bool {
        self.calls.read().contains_key(&call_id)
    }

    /// Snapshot of the active call ids
    pub fn ids(&self) -> HashSet<CallId> {
        self.calls.read().keys().copied().collect()
    }

    /// Snapshot of the active calls
    pub fn calls(&self) -> Vec<Call> {
        self.calls.read().values().cloned().collect()
    }

    /// Number of active calls
    pub fn count(&self) -> usize {
        self.calls.read().len()
    }

    /// Whether there are no active calls
    pub fn is_empty(&self) -> bool {
        self.calls.read().is_empty()
    }

    /// Drop every entry, returning how many were removed
    pub fn clear(&self) -> usize {
        let mut calls = self.calls.write();
        let removed = calls.len();
        calls.clear();
        removed
    }
}
