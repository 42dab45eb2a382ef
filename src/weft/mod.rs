// SPDX-License-Identifier: MIT

//! Node graph execution
//!
//! - [graph] - the graph model and builder
//! - [nodes] - node types, their config and what they compute
//! - [engine] - memoized execution, ordering and sink reports
//! - [loader] - graph documents
//! - [config] - environment settings
//! - [server] - HTTP surface

pub mod config;
pub mod engine;
pub mod graph;
pub mod loader;
pub mod nodes;
pub mod server;
