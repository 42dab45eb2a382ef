// SPDX-License-Identifier: MIT

//! Graph executor
//!
//! Evaluation is pull-based: asking for a node resolves exactly the
//! upstream nodes it reads, each at most once per [`ExecutionCache`].
//!
//! Every node evaluates in its own tokio task, so the depth of a dependency
//! chain never shows up as call stack depth. Tasks are aborted once nothing
//! awaits them any more, which happens when the run's cache is dropped.

use futures::future::{self, join_all, FutureExt};
use futures::stream::{FuturesUnordered, StreamExt};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::cache::{ExecutionCache, NodeResult, SharedResult, WeakCache};
use super::resolver;
use super::sinks::{ExecutionEvent, SinkReport};
use crate::kit::chat::ChatModel;
use crate::kit::error::{ExecutionError, WeftError};
use crate::weft::config::Settings;
use crate::weft::graph::{Graph, Node, NodeId, SocketId, Value};
use crate::weft::nodes::process;

pub const DEFAULT_CHAT_TIMEOUT: Duration = Duration::from_secs(60);

/// Evaluates nodes of a graph. Holds no per-run state.
#[derive(Clone)]
pub struct Engine {
    chat: Option<Arc<dyn ChatModel>>,
    chat_timeout: Duration,
}

impl Engine {
    /// An engine without a chat provider; chat nodes report an in-band error
    pub fn new() -> Self {
        Self {
            chat: None,
            chat_timeout: DEFAULT_CHAT_TIMEOUT,
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, WeftError> {
        let engine = Self::new().with_chat_timeout(settings.chat_timeout);
        match settings.chat_model()? {
            Some(model) => Ok(engine.with_chat(model)),
            None => {
                log::warn!("OPENAI_API_KEY not set; chat nodes will report an error");
                Ok(engine)
            }
        }
    }

    pub fn with_chat(mut self, model: Arc<dyn ChatModel>) -> Self {
        self.chat = Some(model);
        self
    }

    pub fn with_chat_timeout(mut self, timeout: Duration) -> Self {
        self.chat_timeout = timeout;
        self
    }

    /// Resolve the value of `node`.
    ///
    /// Without a `cache` a fresh one is used. Passing the same cache to
    /// several calls evaluates every shared ancestor once across all of
    /// them. A cycle in the node's upstream closure is rejected before
    /// anything runs. Must be called from within a tokio runtime.
    pub async fn execute_node(
        &self,
        graph: &Arc<Graph>,
        node: NodeId,
        cache: Option<&ExecutionCache>,
    ) -> NodeResult {
        if graph.node(node).is_none() {
            return Err(ExecutionError::UnknownNode(node));
        }
        if let Some(cycle) = resolver::find_cycle_from(graph, node) {
            log::error!("Refusing to execute node {}: upstream cycle", node);
            return Err(ExecutionError::CyclicGraph(cycle));
        }

        // Node tasks only hold a weak handle; this one keeps the table alive
        let cache = cache.cloned().unwrap_or_default();
        let run = Run {
            engine: self.clone(),
            graph: Arc::clone(graph),
            cache: cache.downgrade(),
        };
        let result = run.resolve(node).await;
        drop(cache);
        result
    }

    /// Execute every sink concurrently over one shared cache.
    ///
    /// Each sink is isolated: a failure is reported for that sink only.
    /// Reports come back in the order of `sinks`.
    pub async fn run_sinks(&self, graph: &Arc<Graph>, sinks: &[NodeId]) -> Vec<SinkReport> {
        let cache = ExecutionCache::new();
        log::info!("Running {} sinks", sinks.len());

        let reports = join_all(sinks.iter().map(|&id| self.report(graph, id, &cache))).await;

        log::info!(
            "Run finished: {} of {} sinks failed ({} nodes evaluated)",
            reports.iter().filter(|r| !r.is_ok()).count(),
            reports.len(),
            cache.len()
        );
        reports
    }

    /// Like [`Engine::run_sinks`], sending each report as soon as it settles.
    ///
    /// Ends with [`ExecutionEvent::Finished`].
    pub async fn stream_sinks(
        &self,
        graph: &Arc<Graph>,
        sinks: &[NodeId],
        tx: mpsc::Sender<ExecutionEvent>,
    ) {
        let cache = ExecutionCache::new();
        let mut pending: FuturesUnordered<_> = sinks
            .iter()
            .map(|&id| self.report(graph, id, &cache))
            .collect();

        let (mut succeeded, mut failed) = (0, 0);
        while let Some(report) = pending.next().await {
            if report.is_ok() {
                succeeded += 1;
            } else {
                failed += 1;
            }
            let _ = tx.send(ExecutionEvent::Sink(report)).await;
        }

        let _ = tx
            .send(ExecutionEvent::Finished { succeeded, failed })
            .await;
    }

    async fn report(&self, graph: &Arc<Graph>, id: NodeId, cache: &ExecutionCache) -> SinkReport {
        let outcome = self.execute_node(graph, id, Some(cache)).await;
        if let Err(e) = &outcome {
            log::error!("Sink {} failed: {}", id, e);
        }
        SinkReport::new(graph, id, outcome)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything one traversal needs, cheap to clone into node tasks
#[derive(Clone)]
struct Run {
    engine: Engine,
    graph: Arc<Graph>,
    cache: WeakCache,
}

impl Run {
    /// Registered before the task is first polled; see [`ExecutionCache::get_or_register`]
    fn resolve(&self, id: NodeId) -> SharedResult {
        let Some(cache) = self.cache.upgrade() else {
            return future::ready(Err(ExecutionError::Cancelled(id)))
                .boxed()
                .shared();
        };

        cache.get_or_register(id, || {
            let run = self.clone();
            let handle = tokio::spawn(async move { run.evaluate(id).await });
            NodeTask { node: id, handle }.boxed()
        })
    }

    async fn evaluate(&self, id: NodeId) -> NodeResult {
        let node = self
            .graph
            .node(id)
            .ok_or(ExecutionError::UnknownNode(id))?;

        log::info!("Executing node {} ({})", id, node.type_name());
        let ctx = ProcessContext { run: self, node };
        let result = process::process(node, &ctx).await;

        match &result {
            Ok(_) => log::info!("Node {} completed", id),
            Err(e) => log::warn!("Node {} rejected: {}", id, e),
        }
        result
    }
}

/// A spawned node evaluation, aborted when dropped
struct NodeTask {
    node: NodeId,
    handle: JoinHandle<NodeResult>,
}

impl Future for NodeTask {
    type Output = NodeResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<NodeResult> {
        let node = self.node;
        Pin::new(&mut self.handle).poll(cx).map(|joined| {
            joined.unwrap_or_else(|e| {
                Err(ExecutionError::process(node, format!("task failed: {}", e)))
            })
        })
    }
}

impl Drop for NodeTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// What a node's process step can reach: its inputs and the chat client
pub struct ProcessContext<'a> {
    run: &'a Run,
    node: &'a Node,
}

impl ProcessContext<'_> {
    /// The value feeding an input socket, `None` when nothing is connected.
    ///
    /// A multi-output upstream delivers the entry for the feeding socket.
    /// An upstream failure is returned as the error.
    pub async fn input(&self, socket: SocketId) -> Result<Option<Value>, ExecutionError> {
        let graph = &self.run.graph;
        let Some(conn) = graph.incoming(socket) else {
            return Ok(None);
        };
        let Some(source) = graph.socket(conn.from) else {
            return Ok(None);
        };

        let value = self.run.resolve(source.owner).await?;
        Ok(Some(value.select(conn.from)))
    }

    /// The value feeding the node's `index`-th input socket
    pub async fn input_at(&self, index: usize) -> Result<Option<Value>, ExecutionError> {
        match self.node.input_at(index) {
            Some(socket) => self.input(socket.id).await,
            None => Ok(None),
        }
    }

    pub fn chat(&self) -> Option<&Arc<dyn ChatModel>> {
        self.run.engine.chat.as_ref()
    }

    pub fn chat_timeout(&self) -> Duration {
        self.run.engine.chat_timeout
    }
}
