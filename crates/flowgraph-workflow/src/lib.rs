//! Flowgraph Workflow
//!
//! This crate provides the per-run representation of a submitted graph.
//! A [`Flow`] is built once from a [`FlowRequest`](flowgraph_config::FlowRequest)
//! and never mutated afterwards.
//!
//! Key differences from `flowgraph-config`:
//! - Nodes are indexed by id
//! - Incoming edges are indexed per target node, in edge-list order
//! - Edges terminating at sink nodes are identified up front
//! - Structural problems (dangling edges, duplicate ids) are reported as
//!   diagnostics instead of rejecting the request

mod error;
mod flow;
mod graph;

pub use error::WorkflowError;
pub use flow::Flow;
pub use graph::Graph;

pub use flowgraph_config::{EdgeDef, NodeDef, NodeKind};
