//! Serializable listing of registered operations.

use serde::Serialize;

use crate::descriptor::OperationDescriptor;

/// One declared parameter as shown to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamInfo {
  pub name: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub default: Option<serde_json::Value>,
}

/// Public description of a registered operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationInfo {
  pub name: String,
  pub provider: String,
  pub inputs: usize,
  pub params: Vec<ParamInfo>,
  pub binding: &'static str,
  pub requires_instance: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub group: Option<String>,
}

impl From<&OperationDescriptor> for OperationInfo {
  fn from(descriptor: &OperationDescriptor) -> Self {
    Self {
      name: descriptor.name.clone(),
      provider: descriptor.provider.clone(),
      inputs: descriptor.params.len(),
      params: descriptor
        .params
        .iter()
        .map(|p| ParamInfo {
          name: p.name.clone(),
          default: p.default.as_ref().and_then(|d| d.to_json().ok()),
        })
        .collect(),
      binding: descriptor.binding.as_str(),
      requires_instance: descriptor.requires_instance(),
      group: descriptor.group().map(str::to_string),
    }
  }
}
