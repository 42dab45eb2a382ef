// SPDX-License-Identifier: MIT

use super::builtin;
use crate::kit::error::RegistryError;
use crate::weft::graph::{IdAllocator, Node, NodeId, Position};
use std::collections::HashMap;

/// Builds a node with fresh socket ids and default config
pub type NodeFactory = fn(NodeId, Position, &IdAllocator) -> Node;

/// Maps node type names to factories.
///
/// Built once at startup and passed by reference to whatever creates nodes.
#[derive(Clone)]
pub struct NodeRegistry {
    factories: HashMap<String, NodeFactory>,
}

impl NodeRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// A registry holding every built-in node type
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        let builtins: [(&str, NodeFactory); 7] = [
            ("Text", builtin::text),
            ("Number", builtin::number),
            ("Boolean", builtin::boolean),
            ("Image", builtin::image),
            ("Chat", builtin::chat),
            ("Add", builtin::add),
            ("Join", builtin::join),
        ];
        for (name, factory) in builtins {
            registry.factories.insert(name.to_string(), factory);
        }
        registry
    }

    pub fn register(&mut self, name: &str, factory: NodeFactory) -> Result<(), RegistryError> {
        if self.factories.contains_key(name) {
            return Err(RegistryError::AlreadyRegistered(name.to_string()));
        }
        self.factories.insert(name.to_string(), factory);
        Ok(())
    }

    /// Create a node of a registered type. Unknown names never fall back to a default type.
    pub fn create(
        &self,
        name: &str,
        id: NodeId,
        position: Position,
        ids: &IdAllocator,
    ) -> Result<Node, RegistryError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| RegistryError::NotRegistered(name.to_string()))?;
        Ok(factory(id, position, ids))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered type names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}
