// SPDX-License-Identifier: MIT

//! Execution engine
//!
//! - [executor] - memoized pull-based evaluation and per-sink runs
//! - [cache] - the per-run memo shared by concurrent traversals
//! - [resolver] - dependency order and the cycle detector
//! - [sinks] - end-node selection and reports

pub mod cache;
pub mod executor;
pub mod resolver;
pub mod sinks;

pub use cache::{ExecutionCache, NodeResult, SharedResult, WeakCache};
pub use executor::{Engine, ProcessContext, DEFAULT_CHAT_TIMEOUT};
pub use resolver::{find_cycle_from, resolve_order, topological_order, ExecutionOrder};
pub use sinks::{end_nodes, ExecutionEvent, SinkReport};
