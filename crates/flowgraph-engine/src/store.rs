//! Per-run value store.

use std::collections::{HashMap, HashSet};

use flowgraph_registry::Instance;
use flowgraph_value::Value;

/// Why a node has no value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Unavailable {
  #[error("unknown operation '{operation}'")]
  UnknownOperation { operation: String },

  #[error("operation failed: {message}")]
  OperationFailed { message: String },

  /// The function node received no inputs at all.
  #[error("missing inputs")]
  MissingInputs,

  /// An input node with no supplied value.
  #[error("no input value")]
  NoInputValue,

  /// The id does not name a node of this flow.
  #[error("unknown node")]
  UnknownNode,

  #[error("cyclic dependency")]
  CyclicDependency,

  #[error("invalid media: {message}")]
  InvalidMedia { message: String },

  /// A node kind the engine never computes, e.g. a sink feeding another node.
  #[error("not computed")]
  NotComputed,
}

/// What resolving a node produced.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeOutcome {
  Ready(Value),
  Unavailable(Unavailable),
}

impl NodeOutcome {
  /// The value seen by consumers; [`Value::Null`] when unavailable.
  pub fn value(&self) -> Value {
    match self {
      NodeOutcome::Ready(value) => value.clone(),
      NodeOutcome::Unavailable(_) => Value::Null,
    }
  }

  pub fn is_ready(&self) -> bool {
    matches!(self, NodeOutcome::Ready(_))
  }

  pub fn reason(&self) -> Option<&Unavailable> {
    match self {
      NodeOutcome::Ready(_) => None,
      NodeOutcome::Unavailable(reason) => Some(reason),
    }
  }
}

impl From<Unavailable> for NodeOutcome {
  fn from(reason: Unavailable) -> Self {
    NodeOutcome::Unavailable(reason)
  }
}

/// State of one execution: values, the processed marker set, the nodes
/// currently being resolved and the group instances created so far.
///
/// A context is never shared between runs.
#[derive(Default)]
pub struct RunContext {
  values: HashMap<String, NodeOutcome>,
  processed: HashSet<String>,
  resolving: HashSet<String>,
  instances: HashMap<String, Box<Instance>>,
}

impl RunContext {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self, node_id: &str) -> Option<&NodeOutcome> {
    self.values.get(node_id)
  }

  pub fn set(&mut self, node_id: impl Into<String>, outcome: NodeOutcome) {
    self.values.insert(node_id.into(), outcome);
  }

  pub fn mark_processed(&mut self, node_id: impl Into<String>) {
    self.processed.insert(node_id.into());
  }

  pub fn is_processed(&self, node_id: &str) -> bool {
    self.processed.contains(node_id)
  }

  /// Record a final outcome for a function node.
  pub(crate) fn finish(&mut self, node_id: &str, outcome: NodeOutcome) {
    self.resolving.remove(node_id);
    self.set(node_id, outcome);
    self.mark_processed(node_id);
  }

  /// Returns false when `node_id` is already being resolved.
  pub(crate) fn enter(&mut self, node_id: &str) -> bool {
    self.resolving.insert(node_id.to_string())
  }

  pub(crate) fn leave(&mut self, node_id: &str) {
    self.resolving.remove(node_id);
  }

  /// The run's instance for `group`, created on first use.
  pub(crate) fn instance(
    &mut self,
    group: &str,
    create: impl FnOnce() -> Option<Box<Instance>>,
  ) -> Option<&mut Instance> {
    if !self.instances.contains_key(group) {
      let instance = create()?;
      self.instances.insert(group.to_string(), instance);
    }
    self.instances.get_mut(group).map(|instance| instance.as_mut())
  }

  /// Drop the run's instance for `group`; the next call creates a fresh one.
  pub(crate) fn discard_instance(&mut self, group: &str) {
    self.instances.remove(group);
  }

  /// Number of group instances currently held by this run.
  pub fn instance_count(&self) -> usize {
    self.instances.len()
  }

  /// Number of nodes with a recorded outcome.
  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }
}

impl std::fmt::Debug for RunContext {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("RunContext")
      .field("values", &self.values)
      .field("processed", &self.processed)
      .field("resolving", &self.resolving)
      .field("instances", &self.instances.keys().collect::<Vec<_>>())
      .finish()
  }
}
