//! Flowgraph Config
//!
//! This crate contains the serializable request types for flowgraph. A request
//! describes one execution: the nodes of a graph, the data edges between them,
//! and the literal values supplied for its input nodes.
//!
//! Requests are accepted from:
//! - JSON files (via CLI with `flowgraph run request.json`)
//! - Newline-delimited JSON on stdin (via `flowgraph serve`)
//!
//! The engine takes these types, indexes them into an immutable flow, and
//! evaluates the nodes that feed its sinks.

mod edge;
mod input;
mod node;
mod request;

pub use edge::EdgeDef;
pub use input::{InputValue, InputValues};
pub use node::{NodeData, NodeDef, NodeKind};
pub use request::FlowRequest;
