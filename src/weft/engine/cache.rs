// SPDX-License-Identifier: MIT

//! Per-run execution cache

use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::kit::error::ExecutionError;
use crate::weft::graph::{NodeId, Value};

pub type NodeResult = Result<Value, ExecutionError>;

/// A node's evaluation, awaitable by any number of consumers
pub type SharedResult = Shared<BoxFuture<'static, NodeResult>>;

type Entries = Mutex<HashMap<NodeId, SharedResult>>;

/// Memo of node id -> in-flight or settled evaluation.
///
/// Cloning yields a handle to the same table. Each id is written at most
/// once per cache. Dropping the last strong handle drops every entry.
#[derive(Clone, Default)]
pub struct ExecutionCache {
    entries: Arc<Entries>,
}

/// Non-owning handle held by in-flight node evaluations
#[derive(Clone)]
pub struct WeakCache(Weak<Entries>);

impl WeakCache {
    pub fn upgrade(&self) -> Option<ExecutionCache> {
        self.0.upgrade().map(|entries| ExecutionCache { entries })
    }
}

impl ExecutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn downgrade(&self) -> WeakCache {
        WeakCache(Arc::downgrade(&self.entries))
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<NodeId, SharedResult>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the registered evaluation for `id`, or register the one built by `make`.
    ///
    /// Lookup and insert happen under a single lock with no await in between,
    /// so a concurrent request for the same node always sees the first
    /// registration. `make` runs under the lock, so it must not block.
    pub fn get_or_register<F>(&self, id: NodeId, make: F) -> SharedResult
    where
        F: FnOnce() -> BoxFuture<'static, NodeResult>,
    {
        let mut entries = self.lock();
        if let Some(existing) = entries.get(&id) {
            log::debug!("Cache hit for node {}", id);
            return existing.clone();
        }

        let shared = make().shared();
        entries.insert(id, shared.clone());
        shared
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl fmt::Debug for ExecutionCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionCache")
            .field("entries", &self.len())
            .finish()
    }
}
