//! Execution events and notifiers.
//!
//! Events mirror the tracing output of a run so tests and embedding hosts can
//! observe progress without parsing logs.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Events emitted during a flow run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExecutionEvent {
  /// A run has started.
  FlowStarted {
    execution_id: String,
    sink_edges: usize,
  },

  /// An operation was invoked and returned a value.
  NodeResolved {
    execution_id: String,
    node_id: String,
    operation: String,
  },

  /// A node was recorded as unavailable.
  NodeUnavailable {
    execution_id: String,
    node_id: String,
    reason: String,
  },

  /// A result message was sent for a sink edge.
  SinkEmitted {
    execution_id: String,
    result_node: String,
  },

  /// The run finished and sent its completion message.
  FlowCompleted {
    execution_id: String,
    results: usize,
  },

  /// The run ended with an error message.
  FlowFailed { execution_id: String, error: String },
}

/// Receives execution events.
pub trait ExecutionNotifier: Send + Sync {
  fn notify(&self, event: ExecutionEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl ExecutionNotifier for NoopNotifier {
  fn notify(&self, _event: ExecutionEvent) {}
}

/// Forwards events to an unbounded channel.
///
/// Unbounded so a slow consumer never stalls resolution.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  sender: mpsc::UnboundedSender<ExecutionEvent>,
}

impl ChannelNotifier {
  pub fn new(sender: mpsc::UnboundedSender<ExecutionEvent>) -> Self {
    Self { sender }
  }
}

impl ExecutionNotifier for ChannelNotifier {
  fn notify(&self, event: ExecutionEvent) {
    // The receiver may have been dropped.
    let _ = self.sender.send(event);
  }
}
