//! Integration tests for graph loading and execution
//!
//! These tests drive the public API end to end (document -> graph -> run)
//! with a mock chat provider.

use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use weft_rs::kit::chat::{ChatCompletion, ChatModel, ChatRequest};
use weft_rs::kit::error::{ChatError, ExecutionError};
use weft_rs::weft::engine::{resolve_order, Engine, ExecutionCache};
use weft_rs::weft::graph::{Graph, GraphBuilder, NodeId, Position, Value};
use weft_rs::weft::loader::GraphLoader;
use weft_rs::weft::nodes::NodeRegistry;

// ============================================================================
// Mock Components
// ============================================================================

/// Mock chat provider that counts calls
struct CountingChat {
    reply: String,
    tokens: u64,
    calls: AtomicUsize,
}

impl CountingChat {
    fn new(reply: &str, tokens: u64) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            tokens,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatModel for CountingChat {
    async fn complete(&self, _request: &ChatRequest) -> Result<ChatCompletion, ChatError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        // Give concurrent consumers a chance to race for the same node
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        Ok(ChatCompletion {
            text: self.reply.clone(),
            total_tokens: self.tokens,
        })
    }
}

fn at(x: f32) -> Position {
    Position::new(x, 0.0)
}

fn text(b: &mut GraphBuilder<'_>, x: f32, value: &str) -> NodeId {
    let id = b.add("Text", at(x)).unwrap();
    b.configure(id, json!({ "value": value })).unwrap();
    id
}

// ============================================================================
// Memoization and isolation
// ============================================================================

#[tokio::test]
async fn test_diamond_runs_shared_ancestor_once() {
    let registry = NodeRegistry::with_builtin();
    let mut b = GraphBuilder::new(&registry);
    let a = b.add("Chat", at(0.0)).unwrap();
    let left = text(&mut b, 1.0, "left {{input}}");
    let right = text(&mut b, 1.0, "right {{input}}");
    let d = b.add("Join", at(2.0)).unwrap();
    b.configure(d, json!({ "separator": " | " })).unwrap();
    b.connect(a, "Response", left, "Input").unwrap();
    b.connect(a, "Response", right, "Input").unwrap();
    b.connect(left, "Output", d, "Input 1").unwrap();
    b.connect(right, "Output", d, "Input 2").unwrap();
    let graph = Arc::new(b.build().unwrap());

    let chat = CountingChat::new("story", 10);
    let engine = Engine::new().with_chat(chat.clone());
    let value = engine.execute_node(&graph, d, None).await.unwrap();

    assert_eq!(value, Value::text("left story | right story"));
    assert_eq!(chat.calls(), 1);
}

#[tokio::test]
async fn test_cache_spans_separate_requests() {
    let registry = NodeRegistry::with_builtin();
    let mut b = GraphBuilder::new(&registry);
    let a = b.add("Chat", at(0.0)).unwrap();
    let left = text(&mut b, 1.0, "{{input}}!");
    b.connect(a, "Response", left, "Input").unwrap();
    let graph = Arc::new(b.build().unwrap());

    let chat = CountingChat::new("hi", 1);
    let engine = Engine::new().with_chat(chat.clone());
    let cache = ExecutionCache::new();

    engine.execute_node(&graph, left, Some(&cache)).await.unwrap();
    engine.execute_node(&graph, left, Some(&cache)).await.unwrap();
    assert_eq!(chat.calls(), 1);

    // A fresh cache evaluates again
    engine.execute_node(&graph, left, None).await.unwrap();
    assert_eq!(chat.calls(), 2);
}

#[tokio::test]
async fn test_failing_branch_does_not_affect_other_sink() {
    let registry = NodeRegistry::with_builtin();
    let mut b = GraphBuilder::new(&registry);
    let bad = b.add("Number", at(0.0)).unwrap();
    b.configure(bad, json!({ "value": "not-a-number" })).unwrap();
    let e1 = b.add("Add", at(1.0)).unwrap();
    b.connect(bad, "Output", e1, "A").unwrap();

    let source = text(&mut b, 0.0, "fine");
    let e2 = text(&mut b, 1.0, "still {{input}}");
    b.connect(source, "Output", e2, "Input").unwrap();
    let graph = Arc::new(b.build().unwrap());

    let reports = Engine::new().run_sinks(&graph, &[e1, e2]).await;

    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].node_id, e1);
    assert!(!reports[0].is_ok());
    assert!(reports[0]
        .error
        .as_deref()
        .unwrap()
        .contains("'not-a-number' is not a number"));
    assert_eq!(reports[1].node_id, e2);
    assert_eq!(reports[1].result, Some(Value::text("still fine")));
}

// ============================================================================
// Routing and node semantics
// ============================================================================

#[tokio::test]
async fn test_multi_output_routes_per_socket() {
    let registry = NodeRegistry::with_builtin();
    let mut b = GraphBuilder::new(&registry);
    let chat = b.add("Chat", at(0.0)).unwrap();
    let words = text(&mut b, 1.0, "said: {{input}}");
    let tokens = b.add("Number", at(1.0)).unwrap();
    b.configure(tokens, json!({ "value": "{{input}}" })).unwrap();
    b.connect(chat, "Response", words, "Input").unwrap();
    b.connect(chat, "Tokens", tokens, "Input").unwrap();
    let graph = Arc::new(b.build().unwrap());

    let mock = CountingChat::new("hello", 42);
    let engine = Engine::new().with_chat(mock.clone());
    let reports = engine.run_sinks(&graph, &[words, tokens]).await;

    assert_eq!(reports[0].result, Some(Value::text("said: hello")));
    assert_eq!(reports[1].result, Some(Value::Number(42.0)));
    assert_eq!(mock.calls(), 1);
}

#[tokio::test]
async fn test_join_omits_unconnected_input() {
    let registry = NodeRegistry::with_builtin();
    let mut b = GraphBuilder::new(&registry);
    let only = text(&mut b, 0.0, "alone");
    let join = b.add("Join", at(1.0)).unwrap();
    b.connect(only, "Output", join, "Input 2").unwrap();
    let graph = Arc::new(b.build().unwrap());

    let value = Engine::new().execute_node(&graph, join, None).await.unwrap();
    assert_eq!(value, Value::text("alone"));
    assert!(!value.to_text().contains("undefined"));
}

async fn join_with(separator: &str) -> Value {
    let registry = NodeRegistry::with_builtin();
    let mut b = GraphBuilder::new(&registry);
    let first = text(&mut b, 0.0, "first");
    let second = text(&mut b, 0.0, "second");
    let join = b.add("Join", at(1.0)).unwrap();
    b.configure(join, json!({ "separator": separator })).unwrap();
    b.connect(first, "Output", join, "Input 1").unwrap();
    b.connect(second, "Output", join, "Input 2").unwrap();
    let graph = Arc::new(b.build().unwrap());

    Engine::new().execute_node(&graph, join, None).await.unwrap()
}

#[tokio::test]
async fn test_join_separator_escapes() {
    assert_eq!(join_with("(new line)").await, Value::text("first\nsecond"));
    assert_eq!(join_with("\\n").await, Value::text("first\nsecond"));
    assert_eq!(join_with(", ").await, Value::text("first, second"));
}

#[tokio::test]
async fn test_add_with_missing_operand() {
    let registry = NodeRegistry::with_builtin();
    let mut b = GraphBuilder::new(&registry);
    let five = b.add("Number", at(0.0)).unwrap();
    b.configure(five, json!({ "value": "5" })).unwrap();
    let sum = b.add("Add", at(1.0)).unwrap();
    b.connect(five, "Output", sum, "B").unwrap();
    let graph = Arc::new(b.build().unwrap());

    let value = Engine::new().execute_node(&graph, sum, None).await.unwrap();
    assert_eq!(value, Value::Number(5.0));
}

#[tokio::test]
async fn test_template_with_and_without_upstream() {
    let registry = NodeRegistry::with_builtin();
    let mut b = GraphBuilder::new(&registry);
    let x = text(&mut b, 0.0, "X");
    let fed = text(&mut b, 1.0, "prefix-{{input}}-suffix");
    let unfed = text(&mut b, 1.0, "prefix-{{input}}-suffix");
    b.connect(x, "Output", fed, "Input").unwrap();
    let graph = Arc::new(b.build().unwrap());

    let engine = Engine::new();
    assert_eq!(
        engine.execute_node(&graph, fed, None).await.unwrap(),
        Value::text("prefix-X-suffix")
    );
    assert_eq!(
        engine.execute_node(&graph, unfed, None).await.unwrap(),
        Value::text("prefix--suffix")
    );
}

// ============================================================================
// Ordering and cycles
// ============================================================================

fn three_cycle(registry: &NodeRegistry) -> (Graph, [NodeId; 3]) {
    let mut b = GraphBuilder::new(registry);
    let a = text(&mut b, 300.0, "{{input}}");
    let bb = text(&mut b, 100.0, "{{input}}");
    let c = text(&mut b, 200.0, "{{input}}");
    b.connect(a, "Output", bb, "Input").unwrap();
    b.connect(bb, "Output", c, "Input").unwrap();
    b.connect(c, "Output", a, "Input").unwrap();
    (b.build().unwrap(), [a, bb, c])
}

#[test]
fn test_cycle_falls_back_to_position_order() {
    let registry = NodeRegistry::with_builtin();
    let (graph, [a, b, c]) = three_cycle(&registry);

    let order = resolve_order(&graph);
    assert!(order.cycle.is_some());
    assert_eq!(order.nodes, vec![b, c, a]);
}

#[tokio::test]
async fn test_cycle_fails_execution_instead_of_hanging() {
    let registry = NodeRegistry::with_builtin();
    let (graph, [a, _, _]) = three_cycle(&registry);
    let graph = Arc::new(graph);

    let err = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        Engine::new().execute_node(&graph, a, None),
    )
    .await
    .expect("execution must not hang")
    .unwrap_err();
    assert!(matches!(err, ExecutionError::CyclicGraph(path) if path.len() == 4));
}

// ============================================================================
// End to end from a document
// ============================================================================

const STORY_GRAPH: &str = r#"
nodes:
  - id: 1
    type: Text
    title: Genre
    position: { x: 0, y: 0 }
    config: { value: "Sci-Fi" }
  - id: 2
    type: Text
    title: Title
    position: { x: 200, y: 0 }
    config: { value: "prefix-{{input}}-suffix" }
  - id: 3
    type: Add
    position: { x: 0, y: 200 }
    config: { a: 3, b: 4 }
connections:
  - from: { node: 1, socket: Output }
    to: { node: 2, socket: Input }
"#;

#[tokio::test]
async fn test_document_end_to_end() {
    let registry = NodeRegistry::with_builtin();
    let doc = GraphLoader::parse_yaml(STORY_GRAPH).unwrap();
    let loaded = GraphLoader::new(&registry).build(&doc).unwrap();

    assert_eq!(loaded.sinks, vec![NodeId::new(2), NodeId::new(3)]);

    let reports = Engine::new().run_sinks(&loaded.graph, &loaded.sinks).await;
    assert_eq!(reports[0].title, "Title");
    assert_eq!(reports[0].result, Some(Value::text("prefix-Sci-Fi-suffix")));
    assert_eq!(reports[1].result, Some(Value::Number(7.0)));

    let json = serde_json::to_value(&reports).unwrap();
    assert_eq!(
        json,
        json!([
            { "nodeId": 2, "title": "Title", "result": "prefix-Sci-Fi-suffix" },
            { "nodeId": 3, "title": "Add", "result": 7.0 }
        ])
    );
}

#[tokio::test]
async fn test_independent_branch_executes_alone() {
    let registry = NodeRegistry::with_builtin();
    let doc = GraphLoader::parse_yaml(STORY_GRAPH).unwrap();
    let loaded = GraphLoader::new(&registry).build(&doc).unwrap();

    let cache = ExecutionCache::new();
    let value = Engine::new()
        .execute_node(&loaded.graph, NodeId::new(3), Some(&cache))
        .await
        .unwrap();

    assert_eq!(value, Value::Number(7.0));
    assert_eq!(cache.len(), 1);
}

// ============================================================================
// Scale
// ============================================================================

#[tokio::test]
async fn test_long_chain_executes() {
    let registry = NodeRegistry::with_builtin();
    let mut b = GraphBuilder::new(&registry);
    let mut prev = text(&mut b, 0.0, "x");
    for i in 1..5000 {
        let next = text(&mut b, i as f32, "{{input}}");
        b.connect(prev, "Output", next, "Input").unwrap();
        prev = next;
    }
    let graph = Arc::new(b.build().unwrap());

    let cache = ExecutionCache::new();
    let value = Engine::new()
        .execute_node(&graph, prev, Some(&cache))
        .await
        .unwrap();

    assert_eq!(value, Value::text("x"));
    assert_eq!(cache.len(), 5000);
}
