// SPDX-License-Identifier: MIT

//! HTTP surface for editors and other external collaborators

use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::kit::error::WeftError;
use crate::weft::engine::{resolve_order, Engine, ExecutionEvent};
use crate::weft::graph::{IdAllocator, NodeId, Position, Socket};
use crate::weft::loader::{GraphDocument, GraphLoader, LoadedGraph};
use crate::weft::nodes::NodeRegistry;

#[derive(Clone)]
pub struct AppState {
    registry: Arc<NodeRegistry>,
    engine: Engine,
}

impl AppState {
    pub fn new(registry: NodeRegistry, engine: Engine) -> Self {
        Self {
            registry: Arc::new(registry),
            engine,
        }
    }

    fn load(&self, doc: &GraphDocument) -> Result<LoadedGraph, WeftError> {
        GraphLoader::new(&self.registry).build(doc)
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/node-types", get(list_node_types))
        .route("/api/executions", post(create_execution))
        .route("/api/executions/stream", post(stream_execution))
        .route("/api/order", post(execution_order))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(port: u16, state: AppState) -> Result<(), WeftError> {
    let app = router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    log::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn bad_request(e: WeftError) -> (StatusCode, Json<Value>) {
    log::warn!("Rejected graph document: {}", e);
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": e.to_string() })),
    )
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Every registered type with its sockets and default config
async fn list_node_types(State(state): State<AppState>) -> Json<Value> {
    let ids = IdAllocator::new();
    let types: Vec<Value> = state
        .registry
        .names()
        .into_iter()
        .filter_map(|name| {
            let node = state
                .registry
                .create(name, NodeId::new(0), Position::default(), &ids)
                .ok()?;
            Some(json!({
                "type": name,
                "inputs": describe(node.inputs()),
                "outputs": describe(node.outputs()),
                "defaults": node.kind,
            }))
        })
        .collect();
    Json(json!(types))
}

fn describe<'a>(sockets: impl Iterator<Item = &'a Socket>) -> Vec<Value> {
    sockets
        .map(|s| json!({ "title": s.title, "dataType": s.data_type }))
        .collect()
}

async fn create_execution(
    State(state): State<AppState>,
    Json(doc): Json<GraphDocument>,
) -> (StatusCode, Json<Value>) {
    let loaded = match state.load(&doc) {
        Ok(loaded) => loaded,
        Err(e) => return bad_request(e),
    };

    let run_id = Uuid::new_v4();
    log::info!("Run {} started with {} sinks", run_id, loaded.sinks.len());

    let results = state.engine.run_sinks(&loaded.graph, &loaded.sinks).await;
    let status = if results.iter().all(|r| r.is_ok()) {
        "completed"
    } else {
        "partial"
    };
    log::info!("Run {} {}", run_id, status);

    (
        StatusCode::OK,
        Json(json!({ "runId": run_id, "status": status, "results": results })),
    )
}

async fn stream_execution(
    State(state): State<AppState>,
    Json(doc): Json<GraphDocument>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, (StatusCode, Json<Value>)> {
    let loaded = state.load(&doc).map_err(bad_request)?;
    let run_id = Uuid::new_v4();
    let (tx, rx) = mpsc::channel(100);

    tokio::spawn(async move {
        log::info!(
            "Starting streaming run {} with {} sinks",
            run_id,
            loaded.sinks.len()
        );
        state
            .engine
            .stream_sinks(&loaded.graph, &loaded.sinks, tx)
            .await;
        log::info!("Streaming run {} finished", run_id);
    });

    let started = Event::default().event("run").data(run_id.to_string());
    let stream = tokio_stream::once(Ok(started)).chain(ReceiverStream::new(rx).map(to_event));

    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(1))))
}

fn to_event(event: ExecutionEvent) -> Result<Event, Infallible> {
    Ok(Event::default().json_data(&event).unwrap_or_else(|e| {
        log::error!("Failed to encode execution event: {}", e);
        Event::default().event("error").data(e.to_string())
    }))
}

async fn execution_order(
    State(state): State<AppState>,
    Json(doc): Json<GraphDocument>,
) -> (StatusCode, Json<Value>) {
    let loaded = match state.load(&doc) {
        Ok(loaded) => loaded,
        Err(e) => return bad_request(e),
    };

    let order = resolve_order(&loaded.graph);
    (
        StatusCode::OK,
        Json(json!({
            "order": order.nodes,
            "cyclic": order.cycle.is_some(),
            "cycle": order.cycle,
        })),
    )
}
