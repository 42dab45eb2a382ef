// SPDX-License-Identifier: MIT

//! Incremental graph assembly by type name and socket title

use serde_json::Map;

use super::ids::{IdAllocator, NodeId, SocketId};
use super::store::Graph;
use super::types::{Connection, Node, Position};
use crate::kit::error::{GraphError, WeftError};
use crate::weft::nodes::NodeRegistry;

pub struct GraphBuilder<'a> {
    registry: &'a NodeRegistry,
    ids: IdAllocator,
    nodes: Vec<Node>,
    connections: Vec<Connection>,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(registry: &'a NodeRegistry) -> Self {
        Self {
            registry,
            ids: IdAllocator::new(),
            nodes: Vec::new(),
            connections: Vec::new(),
        }
    }

    /// Create a node of a registered type with a freshly allocated id
    pub fn add(&mut self, type_name: &str, position: Position) -> Result<NodeId, WeftError> {
        let id = self.ids.next_node();
        self.push(id, type_name, position)
    }

    /// Create a node under a caller-chosen id, as documents do
    pub fn add_with_id(
        &mut self,
        id: NodeId,
        type_name: &str,
        position: Position,
    ) -> Result<NodeId, WeftError> {
        if self.nodes.iter().any(|n| n.id == id) {
            return Err(GraphError::DuplicateNode(id).into());
        }
        self.ids.reserve_node(id);
        self.push(id, type_name, position)
    }

    fn push(&mut self, id: NodeId, type_name: &str, position: Position) -> Result<NodeId, WeftError> {
        let node = self.registry.create(type_name, id, position, &self.ids)?;
        self.nodes.push(node);
        Ok(id)
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, GraphError> {
        self.nodes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or(GraphError::UnknownNode(id))
    }

    pub fn set_title(&mut self, id: NodeId, title: &str) -> Result<(), GraphError> {
        self.node_mut(id)?.title = title.to_string();
        Ok(())
    }

    /// Apply a JSON object of config keys to a node
    pub fn configure(&mut self, id: NodeId, config: serde_json::Value) -> Result<(), GraphError> {
        match config {
            serde_json::Value::Object(map) => self.configure_map(id, &map),
            _ => Err(GraphError::InvalidConfig {
                node: id,
                key: "config".to_string(),
                message: "expected an object".to_string(),
            }),
        }
    }

    pub fn configure_map(
        &mut self,
        id: NodeId,
        config: &Map<String, serde_json::Value>,
    ) -> Result<(), GraphError> {
        let index = self
            .nodes
            .iter()
            .position(|n| n.id == id)
            .ok_or(GraphError::UnknownNode(id))?;
        self.nodes[index].configure(config, &self.ids)
    }

    /// The id of the socket titled `title` on node `id`
    pub fn socket(&self, id: NodeId, title: &str) -> Result<SocketId, GraphError> {
        let node = self
            .nodes
            .iter()
            .find(|n| n.id == id)
            .ok_or(GraphError::UnknownNode(id))?;
        node.socket_named(title)
            .map(|s| s.id)
            .ok_or_else(|| GraphError::SocketNotFound {
                node: id,
                title: title.to_string(),
            })
    }

    /// Connect an output of one node to an input of another, by socket title
    pub fn connect(
        &mut self,
        from: NodeId,
        from_socket: &str,
        to: NodeId,
        to_socket: &str,
    ) -> Result<(), GraphError> {
        let from = self.socket(from, from_socket)?;
        let to = self.socket(to, to_socket)?;
        self.connect_sockets(from, to);
        Ok(())
    }

    /// Record a connection between socket ids; validated by [`GraphBuilder::build`]
    pub fn connect_sockets(&mut self, from: SocketId, to: SocketId) {
        self.connections.push(Connection::new(from, to));
    }

    pub fn build(self) -> Result<Graph, GraphError> {
        Graph::new(self.nodes, self.connections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kit::error::RegistryError;
    use serde_json::json;

    #[test]
    fn test_unknown_type_is_rejected() {
        let registry = NodeRegistry::with_builtin();
        let mut b = GraphBuilder::new(&registry);
        let err = b.add("Teleport", Position::default()).unwrap_err();
        assert!(matches!(
            err,
            WeftError::Registry(RegistryError::NotRegistered(name)) if name == "Teleport"
        ));
    }

    #[test]
    fn test_explicit_ids_are_reserved() {
        let registry = NodeRegistry::with_builtin();
        let mut b = GraphBuilder::new(&registry);
        b.add_with_id(NodeId::new(5), "Text", Position::default())
            .unwrap();
        let next = b.add("Text", Position::default()).unwrap();
        assert_eq!(next, NodeId::new(6));

        assert!(b
            .add_with_id(NodeId::new(5), "Number", Position::default())
            .is_err());
    }

    #[test]
    fn test_input_fan_in_is_rejected() {
        let registry = NodeRegistry::with_builtin();
        let mut b = GraphBuilder::new(&registry);
        let a = b.add("Text", Position::default()).unwrap();
        let c = b.add("Text", Position::default()).unwrap();
        let d = b.add("Text", Position::default()).unwrap();
        b.connect(a, "Output", d, "Input").unwrap();
        b.connect(c, "Output", d, "Input").unwrap();

        let input = b.socket(d, "Input").unwrap();
        let err = b.build().unwrap_err();
        assert_eq!(err, GraphError::InputAlreadyConnected(input));
    }

    #[test]
    fn test_output_into_output_is_rejected() {
        let registry = NodeRegistry::with_builtin();
        let mut b = GraphBuilder::new(&registry);
        let a = b.add("Text", Position::default()).unwrap();
        let c = b.add("Text", Position::default()).unwrap();
        b.connect(a, "Output", c, "Output").unwrap();
        assert!(matches!(
            b.build(),
            Err(GraphError::DirectionMismatch { .. })
        ));
    }

    #[test]
    fn test_dangling_socket_is_rejected() {
        let registry = NodeRegistry::with_builtin();
        let mut b = GraphBuilder::new(&registry);
        let a = b.add("Text", Position::default()).unwrap();
        let out = b.socket(a, "Output").unwrap();
        b.connect_sockets(out, SocketId::new(999));
        assert_eq!(
            b.build().unwrap_err(),
            GraphError::UnknownSocket(SocketId::new(999))
        );
    }

    #[test]
    fn test_missing_socket_title() {
        let registry = NodeRegistry::with_builtin();
        let mut b = GraphBuilder::new(&registry);
        let a = b.add("Add", Position::default()).unwrap();
        let err = b.socket(a, "C").unwrap_err();
        assert!(matches!(err, GraphError::SocketNotFound { title, .. } if title == "C"));
    }

    #[test]
    fn test_configure_requires_object() {
        let registry = NodeRegistry::with_builtin();
        let mut b = GraphBuilder::new(&registry);
        let a = b.add("Text", Position::default()).unwrap();
        assert!(b.configure(a, json!("Sci-Fi")).is_err());
        assert!(b.configure(a, json!({"value": "Sci-Fi"})).is_ok());
    }

    #[test]
    fn test_dependencies_and_outgoing() {
        let registry = NodeRegistry::with_builtin();
        let mut b = GraphBuilder::new(&registry);
        let chat = b.add("Chat", Position::default()).unwrap();
        let join = b.add("Join", Position::default()).unwrap();
        b.set_title(join, "Summary").unwrap();
        b.connect(chat, "Response", join, "Input 1").unwrap();
        b.connect(chat, "Tokens", join, "Input 2").unwrap();
        let response = b.socket(chat, "Response").unwrap();
        let graph = b.build().unwrap();

        assert_eq!(graph.dependencies_of(join), vec![chat]);
        assert!(graph.dependencies_of(chat).is_empty());
        assert_eq!(graph.outgoing(response).count(), 1);
        assert_eq!(graph.node(join).unwrap().title, "Summary");
        assert_eq!(graph.connections().len(), 2);
    }
}
