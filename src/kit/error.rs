// SPDX-License-Identifier: MIT

//! Typed error handling for weft-rs
//!
//! Construction-time problems (registry, graph shape) are separate from
//! run-time problems (execution) so callers can tell a broken document
//! from a broken branch.

use crate::weft::graph::{NodeId, SocketId};
use std::time::Duration;
use thiserror::Error;

/// Top-level error type for weft-rs
#[derive(Debug, Error)]
pub enum WeftError {
    /// Node type lookup failures
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Graph shape and configuration errors
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// Configuration errors (malformed env vars, invalid settings)
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

/// Node type registry errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// No factory registered under this type name
    #[error("Node type '{0}' is not registered")]
    NotRegistered(String),

    /// A factory with this type name already exists
    #[error("Node type '{0}' is already registered")]
    AlreadyRegistered(String),
}

/// Errors raised while assembling or validating a graph
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    #[error("Duplicate node id {0}")]
    DuplicateNode(NodeId),

    #[error("Duplicate socket id {0}")]
    DuplicateSocket(SocketId),

    #[error("Unknown node {0}")]
    UnknownNode(NodeId),

    #[error("Unknown socket {0}")]
    UnknownSocket(SocketId),

    /// A socket lookup by title failed
    #[error("Node {node} has no socket titled '{title}'")]
    SocketNotFound { node: NodeId, title: String },

    /// A connection must run from an output socket into an input socket
    #[error("Connection {from} -> {to} must run from an output into an input")]
    DirectionMismatch { from: SocketId, to: SocketId },

    /// Fan-in is limited to one connection per input socket
    #[error("Input socket {0} already has an incoming connection")]
    InputAlreadyConnected(SocketId),

    #[error("Invalid config '{key}' on node {node}: {message}")]
    InvalidConfig {
        node: NodeId,
        key: String,
        message: String,
    },
}

/// Errors produced while evaluating a node.
///
/// These are the output type of shared per-node futures, hence `Clone`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecutionError {
    #[error("Unknown node {0}")]
    UnknownNode(NodeId),

    /// The requested node depends on itself through this path
    #[error("Cyclic graph: {}", format_cycle(.0))]
    CyclicGraph(Vec<NodeId>),

    /// A node's process step failed
    #[error("Node {node} failed: {message}")]
    ProcessFailure { node: NodeId, message: String },

    /// The run owning this node was dropped before it settled
    #[error("Run dropped before node {0} settled")]
    Cancelled(NodeId),
}

/// Chat provider errors. Never escape a chat node; they become in-band text.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("No chat provider configured (set OPENAI_API_KEY)")]
    ApiKeyMissing,

    #[error("Chat API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Chat transport error: {0}")]
    Transport(String),

    #[error("Invalid response from chat API: {0}")]
    InvalidResponse(String),

    #[error("Chat request timed out after {0:?}")]
    Timeout(Duration),
}

impl ExecutionError {
    /// Create a process failure for a node
    pub fn process(node: NodeId, message: impl Into<String>) -> Self {
        Self::ProcessFailure {
            node,
            message: message.into(),
        }
    }
}

impl WeftError {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

fn format_cycle(path: &[NodeId]) -> String {
    path.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message_lists_path() {
        let err = ExecutionError::CyclicGraph(vec![NodeId::new(1), NodeId::new(2), NodeId::new(1)]);
        assert_eq!(err.to_string(), "Cyclic graph: 1 -> 2 -> 1");
    }

    #[test]
    fn test_registry_error_converts_to_top_level() {
        let err: WeftError = RegistryError::NotRegistered("Foo".to_string()).into();
        assert!(err.to_string().contains("'Foo' is not registered"));
    }
}
