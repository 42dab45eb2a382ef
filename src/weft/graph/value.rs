// SPDX-License-Identifier: MIT

//! Values flowing between nodes

use serde::Serialize;
use std::collections::BTreeMap;

use super::ids::SocketId;

/// The resolved value of a node.
///
/// A node with more than one output resolves to [`Value::Outputs`], keyed by
/// its own output socket ids; consumers pick the entry for the socket that
/// feeds them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Text(String),
    Number(f64),
    Boolean(bool),
    Image(String),
    Outputs(BTreeMap<SocketId, Value>),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }

    /// Route a node result to the consumer fed by `socket`.
    ///
    /// An `Outputs` map without that key is returned whole.
    pub fn select(self, socket: SocketId) -> Value {
        match self {
            Value::Outputs(mut outputs) => match outputs.remove(&socket) {
                Some(v) => v,
                None => Value::Outputs(outputs),
            },
            scalar => scalar,
        }
    }

    /// String form used by templates and joins
    pub fn to_text(&self) -> String {
        match self {
            Value::Text(s) | Value::Image(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Outputs(_) => serde_json::to_string(self).unwrap_or_default(),
        }
    }

    pub fn to_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(s) => s.trim().parse().ok(),
            Value::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Image(_) | Value::Outputs(_) => None,
        }
    }
}
