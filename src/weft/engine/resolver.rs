// SPDX-License-Identifier: MIT

//! Dependency ordering and cycle detection
//!
//! Node A depends on node B iff a connection routes one of B's outputs
//! into one of A's inputs.

use std::collections::HashMap;

use crate::kit::error::ExecutionError;
use crate::weft::graph::{Graph, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

/// Result of ordering a whole graph
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionOrder {
    pub nodes: Vec<NodeId>,
    /// The cycle that forced the position fallback, if any
    pub cycle: Option<Vec<NodeId>>,
}

/// node -> the nodes it depends on
pub fn dependency_map(graph: &Graph) -> HashMap<NodeId, Vec<NodeId>> {
    graph
        .nodes()
        .iter()
        .map(|n| (n.id, graph.dependencies_of(n.id)))
        .collect()
}

/// Depth-first search with three-state coloring; absent from `marks` means unvisited.
///
/// Iterative, with an explicit stack of (node, next dependency index), so
/// chain depth is bounded by heap rather than call stack.
struct Dfs {
    deps: HashMap<NodeId, Vec<NodeId>>,
    marks: HashMap<NodeId, Mark>,
    order: Vec<NodeId>,
}

impl Dfs {
    fn new(graph: &Graph) -> Self {
        Self {
            deps: dependency_map(graph),
            marks: HashMap::new(),
            order: Vec::new(),
        }
    }

    fn next_dep(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.deps.get(&id).and_then(|d| d.get(index)).copied()
    }

    /// Err carries the cycle as a path that starts and ends on the same node
    fn visit(&mut self, root: NodeId) -> Result<(), Vec<NodeId>> {
        if self.marks.contains_key(&root) {
            return Ok(());
        }

        // The stack is the current path; its nodes are exactly the in-progress ones
        let mut stack: Vec<(NodeId, usize)> = vec![(root, 0)];
        self.marks.insert(root, Mark::InProgress);

        while let Some(&(id, index)) = stack.last() {
            let Some(dep) = self.next_dep(id, index) else {
                stack.pop();
                self.marks.insert(id, Mark::Done);
                self.order.push(id);
                continue;
            };
            if let Some(top) = stack.last_mut() {
                top.1 += 1;
            }

            match self.marks.get(&dep) {
                Some(Mark::Done) => {}
                Some(Mark::InProgress) => {
                    let start = stack.iter().position(|(n, _)| *n == dep).unwrap_or(0);
                    let mut cycle: Vec<NodeId> = stack[start..].iter().map(|(n, _)| *n).collect();
                    cycle.push(dep);
                    return Err(cycle);
                }
                None => {
                    self.marks.insert(dep, Mark::InProgress);
                    stack.push((dep, 0));
                }
            }
        }
        Ok(())
    }
}

/// Dependencies-first order of every node, or the first cycle found
pub fn try_topological_order(graph: &Graph) -> Result<Vec<NodeId>, ExecutionError> {
    let mut dfs = Dfs::new(graph);
    for node in graph.nodes() {
        dfs.visit(node.id).map_err(ExecutionError::CyclicGraph)?;
    }
    Ok(dfs.order)
}

/// Order the whole graph, falling back to ascending x position on a cycle
pub fn resolve_order(graph: &Graph) -> ExecutionOrder {
    match try_topological_order(graph) {
        Ok(nodes) => ExecutionOrder { nodes, cycle: None },
        Err(err) => {
            log::warn!("{}; falling back to position order", err);
            let cycle = match err {
                ExecutionError::CyclicGraph(path) => Some(path),
                _ => None,
            };
            ExecutionOrder {
                nodes: position_order(graph),
                cycle,
            }
        }
    }
}

pub fn topological_order(graph: &Graph) -> Vec<NodeId> {
    resolve_order(graph).nodes
}

fn position_order(graph: &Graph) -> Vec<NodeId> {
    let mut nodes: Vec<_> = graph.nodes().iter().collect();
    nodes.sort_by(|a, b| a.position.x.total_cmp(&b.position.x));
    nodes.into_iter().map(|n| n.id).collect()
}

/// A cycle reachable upstream of `root`, if any
pub fn find_cycle_from(graph: &Graph, root: NodeId) -> Option<Vec<NodeId>> {
    Dfs::new(graph).visit(root).err()
}
