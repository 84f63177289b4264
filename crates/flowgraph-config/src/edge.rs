use serde::{Deserialize, Serialize};

/// A directed data dependency from one node's output to another node's input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeDef {
  pub source: String,
  pub target: String,
  /// Formal parameter of the target operation this edge feeds.
  #[serde(
    rename = "targetHandle",
    default,
    skip_serializing_if = "Option::is_none"
  )]
  pub target_handle: Option<String>,
}

impl EdgeDef {
  pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
    Self {
      source: source.into(),
      target: target.into(),
      target_handle: None,
    }
  }

  /// Set the target handle.
  pub fn with_handle(mut self, handle: impl Into<String>) -> Self {
    self.target_handle = Some(handle.into());
    self
  }

  /// The target handle, treating an empty string the same as no handle.
  pub fn handle(&self) -> Option<&str> {
    self.target_handle.as_deref().filter(|h| !h.is_empty())
  }
}
