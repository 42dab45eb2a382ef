// SPDX-License-Identifier: MIT

//! Node and socket identifiers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SocketId(u64);

impl NodeId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl SocketId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for SocketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out node and socket ids from two independent counters.
///
/// Socket ids carry no information about their owner; ownership lives on
/// the socket itself.
#[derive(Debug)]
pub struct IdAllocator {
    next_node: AtomicU64,
    next_socket: AtomicU64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self {
            next_node: AtomicU64::new(1),
            next_socket: AtomicU64::new(1),
        }
    }

    pub fn next_node(&self) -> NodeId {
        NodeId(self.next_node.fetch_add(1, Ordering::Relaxed))
    }

    pub fn next_socket(&self) -> SocketId {
        SocketId(self.next_socket.fetch_add(1, Ordering::Relaxed))
    }

    /// Mark an explicitly chosen node id as taken.
    ///
    /// `u64::MAX` leaves the counter alone; allocation never reaches it.
    pub fn reserve_node(&self, id: NodeId) {
        if let Some(next) = id.0.checked_add(1) {
            self.next_node.fetch_max(next, Ordering::Relaxed);
        }
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
