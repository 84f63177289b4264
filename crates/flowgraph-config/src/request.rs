use serde::{Deserialize, Serialize};

use crate::edge::EdgeDef;
use crate::input::InputValues;
use crate::node::NodeDef;

/// One execution request: a graph plus the values for its input nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlowRequest {
  #[serde(default)]
  pub nodes: Vec<NodeDef>,
  #[serde(default)]
  pub edges: Vec<EdgeDef>,
  #[serde(rename = "inputValues", default)]
  pub input_values: InputValues,
}
