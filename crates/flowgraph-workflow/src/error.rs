use thiserror::Error;

/// Structural problems found while indexing a flow.
///
/// None of these abort a run: the engine logs them and resolves the affected
/// edges as unavailable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
  #[error("edge references unknown node: from={from}, to={to}")]
  InvalidEdge { from: String, to: String },

  #[error("duplicate node id: {0}")]
  DuplicateNode(String),
}
