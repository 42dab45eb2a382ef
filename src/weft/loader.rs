// SPDX-License-Identifier: MIT

//! Graph document loader
//!
//! Turns a YAML or JSON graph description into a validated [`Graph`]
//! through the node registry:
//!
//! ```yaml
//! nodes:
//!   - id: 1
//!     type: Text
//!     config: { value: "Sci-Fi" }
//!   - id: 2
//!     type: Text
//!     config: { value: "prefix-{{input}}-suffix" }
//! connections:
//!   - from: { node: 1, socket: Output }
//!     to: { node: 2, socket: Input }
//! sinks: [2]
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Map;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::kit::error::WeftError;
use crate::weft::engine::end_nodes;
use crate::weft::graph::{Graph, GraphBuilder, NodeId, Position};
use crate::weft::nodes::NodeRegistry;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphDocument {
    pub nodes: Vec<NodeDocument>,
    #[serde(default)]
    pub connections: Vec<ConnectionDocument>,
    /// Nodes to execute; the graph's end nodes when absent
    #[serde(default)]
    pub sinks: Option<Vec<NodeId>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDocument {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub node_type: String,
    /// Defaults to the type name
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub config: Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionDocument {
    pub from: Endpoint,
    pub to: Endpoint,
}

/// A socket addressed by its node and title
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Endpoint {
    pub node: NodeId,
    pub socket: String,
}

/// A built graph plus the sinks to run
#[derive(Debug, Clone)]
pub struct LoadedGraph {
    pub graph: Arc<Graph>,
    pub sinks: Vec<NodeId>,
}

pub struct GraphLoader<'a> {
    registry: &'a NodeRegistry,
}

impl<'a> GraphLoader<'a> {
    pub fn new(registry: &'a NodeRegistry) -> Self {
        Self { registry }
    }

    pub fn parse_yaml(content: &str) -> Result<GraphDocument, WeftError> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn parse_json(content: &str) -> Result<GraphDocument, WeftError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Read a document from disk; `.json` files are parsed as JSON, anything else as YAML
    pub fn load_document<P: AsRef<Path>>(path: P) -> Result<GraphDocument, WeftError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Self::parse_json(&content)
        } else {
            Self::parse_yaml(&content)
        }
    }

    pub fn build(&self, doc: &GraphDocument) -> Result<LoadedGraph, WeftError> {
        let mut builder = GraphBuilder::new(self.registry);

        for node in &doc.nodes {
            builder.add_with_id(node.id, &node.node_type, node.position)?;
            if let Some(title) = &node.title {
                builder.set_title(node.id, title)?;
            }
            builder.configure_map(node.id, &node.config)?;
        }

        for conn in &doc.connections {
            builder.connect(
                conn.from.node,
                &conn.from.socket,
                conn.to.node,
                &conn.to.socket,
            )?;
        }

        let graph = Arc::new(builder.build()?);
        let sinks = match &doc.sinks {
            Some(sinks) => sinks.clone(),
            None => end_nodes(&graph),
        };

        log::debug!(
            "Loaded graph with {} nodes, {} connections, {} sinks",
            graph.nodes().len(),
            graph.connections().len(),
            sinks.len()
        );
        Ok(LoadedGraph { graph, sinks })
    }

    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<LoadedGraph, WeftError> {
        let doc = Self::load_document(path)?;
        self.build(&doc)
    }
}
