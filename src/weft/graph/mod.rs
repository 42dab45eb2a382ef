// SPDX-License-Identifier: MIT

//! Graph model: nodes, sockets, connections and the values between them

mod builder;
mod ids;
mod store;
mod types;
mod value;

pub use builder::GraphBuilder;
pub use ids::{IdAllocator, NodeId, SocketId};
pub use store::Graph;
pub use types::{Connection, DataType, Direction, Node, Position, Socket};
pub use value::Value;
