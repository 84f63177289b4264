use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDef {
  pub id: String,
  #[serde(rename = "type")]
  pub kind: NodeKind,
  #[serde(default)]
  pub data: NodeData,
  /// Inline literal for an input node, used when the request carries no entry
  /// for it in `inputValues`.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub value: Option<serde_json::Value>,
}

impl NodeDef {
  /// Create an input node.
  pub fn input(id: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      kind: NodeKind::Input,
      data: NodeData::default(),
      value: None,
    }
  }

  /// Create a function node invoking `operation`.
  pub fn function(id: impl Into<String>, operation: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      kind: NodeKind::Function,
      data: NodeData::operation(operation),
      value: None,
    }
  }

  /// Create a result node.
  pub fn result(id: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      kind: NodeKind::Result,
      data: NodeData::default(),
      value: None,
    }
  }

  /// Attach a static parameter to the node's data.
  pub fn with_param(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
    self.data.params.insert(name.into(), value);
    self
  }
}

/// The role a node plays in a flow.
///
/// Serialized as the node's `type` string. Any kind the engine does not know is
/// kept verbatim in [`NodeKind::Other`] and treated as a sink.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeKind {
  /// `inputNode`
  Input,
  /// `imageInputNode`
  ImageInput,
  /// `functionNode`
  Function,
  /// `resultNode`
  Result,
  /// Any other sink-like kind, e.g. an intermediate region-of-interest node.
  Other(String),
}

impl NodeKind {
  pub fn as_str(&self) -> &str {
    match self {
      NodeKind::Input => "inputNode",
      NodeKind::ImageInput => "imageInputNode",
      NodeKind::Function => "functionNode",
      NodeKind::Result => "resultNode",
      NodeKind::Other(kind) => kind,
    }
  }

  pub fn is_input(&self) -> bool {
    matches!(self, NodeKind::Input | NodeKind::ImageInput)
  }

  pub fn is_function(&self) -> bool {
    matches!(self, NodeKind::Function)
  }

  /// Everything that is neither an input nor a function consumes values.
  pub fn is_sink(&self) -> bool {
    !self.is_input() && !self.is_function()
  }
}

impl From<String> for NodeKind {
  fn from(kind: String) -> Self {
    match kind.as_str() {
      "inputNode" => NodeKind::Input,
      "imageInputNode" => NodeKind::ImageInput,
      "functionNode" => NodeKind::Function,
      "resultNode" => NodeKind::Result,
      _ => NodeKind::Other(kind),
    }
  }
}

impl From<NodeKind> for String {
  fn from(kind: NodeKind) -> Self {
    kind.as_str().to_string()
  }
}

/// Node payload: the operation name plus any static parameters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
  #[serde(alias = "func", default, skip_serializing_if = "Option::is_none")]
  pub operation: Option<String>,
  #[serde(flatten)]
  pub params: serde_json::Map<String, serde_json::Value>,
}

impl NodeData {
  pub fn operation(operation: impl Into<String>) -> Self {
    Self {
      operation: Some(operation.into()),
      params: serde_json::Map::new(),
    }
  }

  /// The operation to invoke, falling back to a legacy `func` entry.
  pub fn operation_name(&self) -> Option<&str> {
    self
      .operation
      .as_deref()
      .or_else(|| self.params.get("func").and_then(|v| v.as_str()))
  }
}
