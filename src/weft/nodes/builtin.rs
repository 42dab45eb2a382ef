// SPDX-License-Identifier: MIT

//! Built-in node factories

use super::NodeKind;
use crate::weft::graph::{DataType, IdAllocator, Node, NodeId, Position, Socket};

pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_JOIN_SEPARATOR: &str = " ";

fn node(id: NodeId, position: Position, kind: NodeKind, sockets: Vec<Socket>) -> Node {
    Node {
        id,
        title: kind.type_name().to_string(),
        position,
        kind,
        sockets,
    }
}

/// One templated input, one output of the given type
fn value_node(
    id: NodeId,
    position: Position,
    ids: &IdAllocator,
    kind: NodeKind,
    data_type: DataType,
) -> Node {
    let sockets = vec![
        Socket::input(ids.next_socket(), id, "Input", DataType::Any),
        Socket::output(ids.next_socket(), id, "Output", data_type),
    ];
    node(id, position, kind, sockets)
}

pub fn text(id: NodeId, position: Position, ids: &IdAllocator) -> Node {
    let kind = NodeKind::Text {
        value: String::new(),
    };
    value_node(id, position, ids, kind, DataType::Text)
}

pub fn number(id: NodeId, position: Position, ids: &IdAllocator) -> Node {
    let kind = NodeKind::Number {
        value: "0".to_string(),
    };
    value_node(id, position, ids, kind, DataType::Number)
}

pub fn boolean(id: NodeId, position: Position, ids: &IdAllocator) -> Node {
    let kind = NodeKind::Boolean {
        value: "false".to_string(),
    };
    value_node(id, position, ids, kind, DataType::Boolean)
}

pub fn image(id: NodeId, position: Position, ids: &IdAllocator) -> Node {
    let kind = NodeKind::Image {
        source: String::new(),
    };
    let sockets = vec![Socket::output(ids.next_socket(), id, "Output", DataType::Image)];
    node(id, position, kind, sockets)
}

/// Inputs: System, Prompt. Outputs: Response, Tokens.
pub fn chat(id: NodeId, position: Position, ids: &IdAllocator) -> Node {
    let kind = NodeKind::Chat {
        model: DEFAULT_CHAT_MODEL.to_string(),
        system: String::new(),
        prompt: String::new(),
    };
    let sockets = vec![
        Socket::input(ids.next_socket(), id, "System", DataType::Text),
        Socket::input(ids.next_socket(), id, "Prompt", DataType::Text),
        Socket::output(ids.next_socket(), id, "Response", DataType::Text),
        Socket::output(ids.next_socket(), id, "Tokens", DataType::Number),
    ];
    node(id, position, kind, sockets)
}

pub fn add(id: NodeId, position: Position, ids: &IdAllocator) -> Node {
    let kind = NodeKind::Add { a: 0.0, b: 0.0 };
    let sockets = vec![
        Socket::input(ids.next_socket(), id, "A", DataType::Number),
        Socket::input(ids.next_socket(), id, "B", DataType::Number),
        Socket::output(ids.next_socket(), id, "Sum", DataType::Number),
    ];
    node(id, position, kind, sockets)
}

pub fn join(id: NodeId, position: Position, ids: &IdAllocator) -> Node {
    let kind = NodeKind::Join {
        separator: DEFAULT_JOIN_SEPARATOR.to_string(),
    };
    let sockets = vec![
        Socket::input(ids.next_socket(), id, "Input 1", DataType::Any),
        Socket::input(ids.next_socket(), id, "Input 2", DataType::Any),
        Socket::output(ids.next_socket(), id, "Output", DataType::Text),
    ];
    node(id, position, kind, sockets)
}
