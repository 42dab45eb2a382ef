// SPDX-License-Identifier: MIT

//! End-node selection and per-sink reports

use serde::Serialize;

use super::cache::NodeResult;
use crate::weft::graph::{Graph, NodeId, Value};

/// Nodes whose every output socket has no outgoing connection, in graph order
pub fn end_nodes(graph: &Graph) -> Vec<NodeId> {
    graph
        .nodes()
        .iter()
        .filter(|n| n.outputs().all(|s| graph.outgoing(s.id).next().is_none()))
        .map(|n| n.id)
        .collect()
}

/// Outcome of one requested sink
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SinkReport {
    pub node_id: NodeId,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SinkReport {
    pub fn new(graph: &Graph, node_id: NodeId, outcome: NodeResult) -> Self {
        let title = graph
            .node(node_id)
            .map(|n| n.title.clone())
            .unwrap_or_default();

        match outcome {
            Ok(value) => Self {
                node_id,
                title,
                result: Some(value),
                error: None,
            },
            Err(e) => Self {
                node_id,
                title,
                result: None,
                error: Some(e.to_string()),
            },
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Progress of a streamed run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ExecutionEvent {
    Sink(SinkReport),
    Finished { succeeded: usize, failed: usize },
}
