// SPDX-License-Identifier: MIT

//! Node types
//!
//! Every node type is a variant of [`NodeKind`] carrying its own config, and
//! every per-type behavior is an exhaustive match over it:
//! - [builtin] - factories producing sockets and defaults
//! - [process] - what each type computes
//! - [registry] - name -> factory lookup
//! - [template] - `{{input}}` substitution and separator unescaping

pub mod builtin;
pub mod process;
pub mod registry;
pub mod template;

pub use registry::{NodeFactory, NodeRegistry};

use serde::Serialize;
use serde_json::Map;

use crate::kit::error::GraphError;
use crate::weft::graph::{DataType, Direction, IdAllocator, Node, NodeId, Socket};

/// Upper bound for a `Join` node's `inputs` config
pub const MAX_JOIN_INPUTS: usize = 64;

/// The closed set of node types with their config
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum NodeKind {
    Text { value: String },
    Number { value: String },
    Boolean { value: String },
    Image { source: String },
    Chat {
        model: String,
        system: String,
        prompt: String,
    },
    Add { a: f64, b: f64 },
    Join { separator: String },
}

impl NodeKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            NodeKind::Text { .. } => "Text",
            NodeKind::Number { .. } => "Number",
            NodeKind::Boolean { .. } => "Boolean",
            NodeKind::Image { .. } => "Image",
            NodeKind::Chat { .. } => "Chat",
            NodeKind::Add { .. } => "Add",
            NodeKind::Join { .. } => "Join",
        }
    }
}

impl Node {
    /// Apply document config to this node.
    ///
    /// Unknown keys are ignored with a warning. `Join` accepts `inputs` to
    /// change its number of input sockets, allocating ids from `ids`.
    /// On error the node is left unchanged.
    pub fn configure(
        &mut self,
        config: &Map<String, serde_json::Value>,
        ids: &IdAllocator,
    ) -> Result<(), GraphError> {
        let node = self.id;
        let mut kind = self.kind.clone();
        let mut join_inputs = None;

        for (key, value) in config {
            let applied = match (&mut kind, key.as_str()) {
                (NodeKind::Text { value: v }, "value")
                | (NodeKind::Number { value: v }, "value")
                | (NodeKind::Boolean { value: v }, "value") => {
                    *v = scalar_string(node, key, value)?;
                    true
                }
                (NodeKind::Image { source }, "source") => {
                    *source = string(node, key, value)?;
                    true
                }
                (NodeKind::Chat { model, .. }, "model") => {
                    *model = string(node, key, value)?;
                    true
                }
                (NodeKind::Chat { system, .. }, "system") => {
                    *system = string(node, key, value)?;
                    true
                }
                (NodeKind::Chat { prompt, .. }, "prompt") => {
                    *prompt = string(node, key, value)?;
                    true
                }
                (NodeKind::Add { a, .. }, "a") => {
                    *a = number(node, key, value)?;
                    true
                }
                (NodeKind::Add { b, .. }, "b") => {
                    *b = number(node, key, value)?;
                    true
                }
                (NodeKind::Join { separator }, "separator") => {
                    *separator = string(node, key, value)?;
                    true
                }
                (NodeKind::Join { .. }, "inputs") => {
                    join_inputs = Some(input_count(node, key, value)?);
                    true
                }
                _ => false,
            };

            if !applied {
                log::warn!(
                    "Ignoring unknown config key '{}' on {} node {}",
                    key,
                    kind.type_name(),
                    node
                );
            }
        }

        self.kind = kind;
        if let Some(count) = join_inputs {
            self.resize_inputs(count, ids);
        }

        Ok(())
    }

    fn resize_inputs(&mut self, count: usize, ids: &IdAllocator) {
        let (mut inputs, outputs): (Vec<Socket>, Vec<Socket>) = self
            .sockets
            .drain(..)
            .partition(|s| s.direction == Direction::Input);

        inputs.truncate(count);
        while inputs.len() < count {
            let title = format!("Input {}", inputs.len() + 1);
            inputs.push(Socket::input(
                ids.next_socket(),
                self.id,
                &title,
                DataType::Any,
            ));
        }

        inputs.extend(outputs);
        self.sockets = inputs;
    }
}

fn invalid(node: NodeId, key: &str, message: &str) -> GraphError {
    GraphError::InvalidConfig {
        node,
        key: key.to_string(),
        message: message.to_string(),
    }
}

fn string(
    node: NodeId,
    key: &str,
    value: &serde_json::Value,
) -> Result<String, GraphError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| invalid(node, key, "expected a string"))
}

/// Text-like values also accept numbers and booleans as typed in documents
fn scalar_string(
    node: NodeId,
    key: &str,
    value: &serde_json::Value,
) -> Result<String, GraphError> {
    match value {
        serde_json::Value::String(s) => Ok(s.clone()),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Bool(b) => Ok(b.to_string()),
        _ => Err(invalid(node, key, "expected a string, number or boolean")),
    }
}

fn number(
    node: NodeId,
    key: &str,
    value: &serde_json::Value,
) -> Result<f64, GraphError> {
    value
        .as_f64()
        .ok_or_else(|| invalid(node, key, "expected a number"))
}

fn input_count(
    node: NodeId,
    key: &str,
    value: &serde_json::Value,
) -> Result<usize, GraphError> {
    match value.as_u64().and_then(|n| usize::try_from(n).ok()) {
        Some(n) if (1..=MAX_JOIN_INPUTS).contains(&n) => Ok(n),
        _ => Err(invalid(
            node,
            key,
            &format!("expected an integer from 1 to {}", MAX_JOIN_INPUTS),
        )),
    }
}
