//! In-memory target graph

use std::collections::HashMap;
use std::sync::Arc;

use livefeed_wire::{StateMap, UpdateEntry};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;

use crate::{Target, TargetResolver};

/// Node whose state is a plain field map.
/// Applying an entry merges its fields into the state.
#[derive(Debug, Default)]
pub struct MemoryNode {
    name: String,
    state: RwLock<StateMap>,
    /// Every entry handed to `apply`, in order
    applied: Mutex<Vec<UpdateEntry>>,
}

impl MemoryNode {
    pub fn new(name: impl Into<String>) -> Self {
        MemoryNode {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_state(name: impl Into<String>, state: StateMap) -> Self {
        MemoryNode {
            name: name.into(),
            state: RwLock::new(state),
            applied: Mutex::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set one field directly, bypassing the engine
    pub fn set_field(&self, field: impl Into<String>, value: impl Into<Value>) {
        self.state.write().insert(field.into(), value.into());
    }

    pub fn field(&self, field: &str) -> Option<Value> {
        self.state.read().get(field).cloned()
    }

    pub fn snapshot(&self) -> StateMap {
        self.state.read().clone()
    }

    pub fn applied(&self) -> Vec<UpdateEntry> {
        self.applied.lock().clone()
    }

    pub fn apply_count(&self) -> usize {
        self.applied.lock().len()
    }
}

impl Target for MemoryNode {
    fn current_state(&self) -> StateMap {
        self.snapshot()
    }

    fn apply(&self, entry: &UpdateEntry) {
        {
            let mut state = self.state.write();
            for (field, value) in entry.fields() {
                state.insert(field.clone(), value.clone());
            }
        }
        self.applied.lock().push(entry.clone());
    }
}

/// Graph of named memory nodes
#[derive(Debug, Default)]
pub struct MemoryGraph {
    nodes: RwLock<HashMap<String, Arc<MemoryNode>>>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        MemoryGraph::default()
    }

    /// Insert a node, replacing any node with the same name
    pub fn insert(&self, node: MemoryNode) -> Arc<MemoryNode> {
        let node = Arc::new(node);
        self.nodes
            .write()
            .insert(node.name().to_owned(), Arc::clone(&node));
        node
    }

    /// Insert an empty node
    pub fn add(&self, name: impl Into<String>) -> Arc<MemoryNode> {
        self.insert(MemoryNode::new(name))
    }

    pub fn node(&self, name: &str) -> Option<Arc<MemoryNode>> {
        self.nodes.read().get(name).cloned()
    }

    pub fn remove(&self, name: &str) -> Option<Arc<MemoryNode>> {
        self.nodes.write().remove(name)
    }

    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.read().is_empty()
    }

    /// Current state of every node, keyed by name
    pub fn snapshot(&self) -> HashMap<String, StateMap> {
        self.nodes
            .read()
            .iter()
            .map(|(name, node)| (name.clone(), node.snapshot()))
            .collect()
    }
}

impl TargetResolver for MemoryGraph {
    fn resolve(&self, key: &str) -> Option<Arc<dyn Target>> {
        self.node(key).map(|node| node as Arc<dyn Target>)
    }
}
