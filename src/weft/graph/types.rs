// SPDX-License-Identifier: MIT

//! Node, socket and connection types

use serde::{Deserialize, Serialize};

use super::ids::{NodeId, SocketId};
use crate::weft::nodes::NodeKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Input,
    Output,
}

/// Declared data type of a socket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Text,
    Number,
    Boolean,
    Image,
    Any,
}

/// Canvas position; only the resolver's fallback ordering reads it
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A directional port owned by exactly one node
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Socket {
    pub id: SocketId,
    pub title: String,
    pub direction: Direction,
    pub owner: NodeId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_type: Option<DataType>,
}

impl Socket {
    pub fn input(id: SocketId, owner: NodeId, title: &str, data_type: DataType) -> Self {
        Self {
            id,
            title: title.to_string(),
            direction: Direction::Input,
            owner,
            data_type: Some(data_type),
        }
    }

    pub fn output(id: SocketId, owner: NodeId, title: &str, data_type: DataType) -> Self {
        Self {
            id,
            title: title.to_string(),
            direction: Direction::Output,
            owner,
            data_type: Some(data_type),
        }
    }
}

/// A directed edge from an output socket to an input socket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
    pub from: SocketId,
    pub to: SocketId,
}

impl Connection {
    pub fn new(from: SocketId, to: SocketId) -> Self {
        Self { from, to }
    }
}

/// A typed unit of computation
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub title: String,
    pub position: Position,
    pub kind: NodeKind,
    pub sockets: Vec<Socket>,
}

impl Node {
    pub fn inputs(&self) -> impl Iterator<Item = &Socket> {
        self.sockets
            .iter()
            .filter(|s| s.direction == Direction::Input)
    }

    pub fn outputs(&self) -> impl Iterator<Item = &Socket> {
        self.sockets
            .iter()
            .filter(|s| s.direction == Direction::Output)
    }

    pub fn input_at(&self, index: usize) -> Option<&Socket> {
        self.inputs().nth(index)
    }

    pub fn output_at(&self, index: usize) -> Option<&Socket> {
        self.outputs().nth(index)
    }

    pub fn socket_named(&self, title: &str) -> Option<&Socket> {
        self.sockets.iter().find(|s| s.title == title)
    }

    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }
}
