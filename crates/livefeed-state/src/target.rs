//! Target seams
//!
//! The object graph is owned by the host. The engine only looks nodes up by
//! name and never creates or destroys them.

use std::collections::HashMap;
use std::sync::Arc;

use livefeed_wire::{StateMap, UpdateEntry};

/// Addressable node of the host graph
pub trait Target: Send + Sync {
    /// Current observable state, consulted fresh for every message
    fn current_state(&self) -> StateMap;

    /// Write an accepted entry. Must be idempotent.
    fn apply(&self, entry: &UpdateEntry);
}

/// Name-based lookup into the host graph
pub trait TargetResolver: Send + Sync {
    /// At most one node per key; `None` is an ordinary outcome
    fn resolve(&self, key: &str) -> Option<Arc<dyn Target>>;
}

impl<R: TargetResolver + ?Sized> TargetResolver for Arc<R> {
    fn resolve(&self, key: &str) -> Option<Arc<dyn Target>> {
        (**self).resolve(key)
    }
}

impl TargetResolver for HashMap<String, Arc<dyn Target>> {
    fn resolve(&self, key: &str) -> Option<Arc<dyn Target>> {
        self.get(key).cloned()
    }
}
