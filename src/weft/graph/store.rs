// SPDX-License-Identifier: MIT

//! Validated, read-only graph snapshot

use std::collections::{HashMap, HashSet};

use super::ids::{NodeId, SocketId};
use super::types::{Connection, Direction, Node, Socket};
use crate::kit::error::GraphError;

/// Nodes plus connections, indexed for the engine.
///
/// Rebuilt for every execution request and never mutated afterwards.
/// Cycles are accepted here; they are a run-time concern.
#[derive(Debug, Clone)]
pub struct Graph {
    nodes: Vec<Node>,
    connections: Vec<Connection>,
    node_index: HashMap<NodeId, usize>,
    /// socket id -> (node index, socket index)
    socket_index: HashMap<SocketId, (usize, usize)>,
    /// input socket id -> connection index
    incoming: HashMap<SocketId, usize>,
}

impl Graph {
    pub fn new(nodes: Vec<Node>, connections: Vec<Connection>) -> Result<Self, GraphError> {
        let mut node_index = HashMap::with_capacity(nodes.len());
        let mut socket_index = HashMap::new();

        for (ni, node) in nodes.iter().enumerate() {
            if node_index.insert(node.id, ni).is_some() {
                return Err(GraphError::DuplicateNode(node.id));
            }
            for (si, socket) in node.sockets.iter().enumerate() {
                if socket_index.insert(socket.id, (ni, si)).is_some() {
                    return Err(GraphError::DuplicateSocket(socket.id));
                }
            }
        }

        let mut incoming = HashMap::with_capacity(connections.len());
        for (ci, conn) in connections.iter().enumerate() {
            let from = Self::lookup(&nodes, &socket_index, conn.from)?;
            let to = Self::lookup(&nodes, &socket_index, conn.to)?;

            if from.direction != Direction::Output || to.direction != Direction::Input {
                return Err(GraphError::DirectionMismatch {
                    from: conn.from,
                    to: conn.to,
                });
            }
            if incoming.insert(conn.to, ci).is_some() {
                return Err(GraphError::InputAlreadyConnected(conn.to));
            }
        }

        Ok(Self {
            nodes,
            connections,
            node_index,
            socket_index,
            incoming,
        })
    }

    fn lookup<'a>(
        nodes: &'a [Node],
        socket_index: &HashMap<SocketId, (usize, usize)>,
        id: SocketId,
    ) -> Result<&'a Socket, GraphError> {
        socket_index
            .get(&id)
            .map(|&(ni, si)| &nodes[ni].sockets[si])
            .ok_or(GraphError::UnknownSocket(id))
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.node_index.get(&id).map(|&i| &self.nodes[i])
    }

    pub fn socket(&self, id: SocketId) -> Option<&Socket> {
        self.socket_index
            .get(&id)
            .map(|&(ni, si)| &self.nodes[ni].sockets[si])
    }

    /// The connection terminating at an input socket, if any
    pub fn incoming(&self, input: SocketId) -> Option<&Connection> {
        self.incoming.get(&input).map(|&i| &self.connections[i])
    }

    pub fn outgoing(&self, output: SocketId) -> impl Iterator<Item = &Connection> {
        self.connections.iter().filter(move |c| c.from == output)
    }

    /// Distinct upstream nodes of `id`, in input socket order
    pub fn dependencies_of(&self, id: NodeId) -> Vec<NodeId> {
        let Some(node) = self.node(id) else {
            return Vec::new();
        };

        let mut seen = HashSet::new();
        node.inputs()
            .filter_map(|input| self.incoming(input.id))
            .filter_map(|conn| self.socket(conn.from))
            .map(|socket| socket.owner)
            .filter(|owner| seen.insert(*owner))
            .collect()
    }
}
