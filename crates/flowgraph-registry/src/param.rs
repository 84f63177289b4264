//! Parameter schemas and argument binding.

use flowgraph_value::{Media, Value};
use indexmap::IndexMap;

use crate::error::OperationError;

/// One declared parameter of an operation.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
  pub name: String,
  /// Used when neither an edge nor a static node parameter supplies a value.
  pub default: Option<Value>,
}

impl ParamSpec {
  pub fn required(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      default: None,
    }
  }

  pub fn optional(name: impl Into<String>, default: impl Into<Value>) -> Self {
    Self {
      name: name.into(),
      default: Some(default.into()),
    }
  }

  /// Required parameters for each name, in order.
  pub fn list(names: &[&str]) -> Vec<Self> {
    names.iter().map(|n| Self::required(*n)).collect()
  }
}

/// How keyed arguments are matched to declared parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Binding {
  /// Keys naming a parameter bind by name; every other entry fills the next
  /// unbound parameter in arrival order.
  #[default]
  Positional,
  /// Only keys naming a parameter bind; everything else is dropped.
  Keyword,
}

impl Binding {
  pub fn as_str(&self) -> &'static str {
    match self {
      Binding::Positional => "positional",
      Binding::Keyword => "keyword",
    }
  }
}

/// Keyed values gathered from a node's incoming edges, in edge order.
///
/// Keys are the edge's target handle, or the source node id when the edge
/// names no handle.
pub type ArgumentBag = IndexMap<String, Value>;

/// Project a bag onto declared parameters.
///
/// Per parameter the first available source wins: bag entry (by name, then by
/// position when `binding` allows), static node parameter, declared default,
/// then [`Value::Null`].
pub(crate) fn project(
  params: &[ParamSpec],
  binding: Binding,
  bag: &ArgumentBag,
  statics: &serde_json::Map<String, serde_json::Value>,
) -> Vec<Value> {
  let mut slots: Vec<Option<Value>> = vec![None; params.len()];
  let mut leftovers = Vec::new();

  for (key, value) in bag {
    match params.iter().position(|p| &p.name == key) {
      Some(index) => slots[index] = Some(value.clone()),
      None => leftovers.push(value),
    }
  }

  if binding == Binding::Positional {
    let mut free = slots.iter_mut().filter(|slot| slot.is_none());
    for value in leftovers {
      match free.next() {
        Some(slot) => *slot = Some(value.clone()),
        None => break,
      }
    }
  }

  slots
    .into_iter()
    .zip(params)
    .map(|(slot, param)| {
      slot
        .or_else(|| statics.get(&param.name).cloned().map(Value::from_json))
        .or_else(|| param.default.clone())
        .unwrap_or(Value::Null)
    })
    .collect()
}

/// Bound arguments handed to an operation, one per declared parameter.
#[derive(Debug)]
pub struct Arguments<'a> {
  params: &'a [ParamSpec],
  values: Vec<Value>,
}

impl<'a> Arguments<'a> {
  pub fn new(params: &'a [ParamSpec], values: Vec<Value>) -> Self {
    Self { params, values }
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }

  /// The raw value at `index`; [`Value::Null`] when out of range.
  pub fn get(&self, index: usize) -> &Value {
    const NULL: &Value = &Value::Null;
    self.values.get(index).unwrap_or(NULL)
  }

  pub fn values(&self) -> &[Value] {
    &self.values
  }

  fn param_name(&self, index: usize) -> String {
    self
      .params
      .get(index)
      .map(|p| p.name.clone())
      .unwrap_or_else(|| format!("#{index}"))
  }

  /// A non-null value at `index`.
  pub fn require(&self, index: usize) -> Result<&Value, OperationError> {
    match self.get(index) {
      Value::Null => Err(OperationError::missing(self.param_name(index))),
      value => Ok(value),
    }
  }

  /// A type mismatch error for the parameter at `index`.
  pub fn mismatch(&self, index: usize, expected: &'static str) -> OperationError {
    OperationError::TypeMismatch {
      param: self.param_name(index),
      expected,
      found: self.get(index).type_name(),
    }
  }

  /// An int or float at `index`, as `f64`.
  pub fn number(&self, index: usize) -> Result<f64, OperationError> {
    let value = self.require(index)?;
    value.as_f64().ok_or_else(|| self.mismatch(index, "number"))
  }

  /// An int at `index`. Floats with no fractional part are accepted when they
  /// fit in an `i64`.
  pub fn int(&self, index: usize) -> Result<i64, OperationError> {
    const MIN: f64 = i64::MIN as f64;
    const MAX: f64 = i64::MAX as f64;
    match self.require(index)? {
      Value::Int(i) => Ok(*i),
      Value::Float(f) if f.fract() == 0.0 && (MIN..MAX).contains(f) => Ok(*f as i64),
      _ => Err(self.mismatch(index, "int")),
    }
  }

  pub fn text(&self, index: usize) -> Result<&str, OperationError> {
    let value = self.require(index)?;
    value.as_str().ok_or_else(|| self.mismatch(index, "text"))
  }

  pub fn media(&self, index: usize) -> Result<&Media, OperationError> {
    let value = self.require(index)?;
    value.as_media().ok_or_else(|| self.mismatch(index, "media"))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn bag(entries: &[(&str, Value)]) -> ArgumentBag {
    entries
      .iter()
      .map(|(k, v)| (k.to_string(), v.clone()))
      .collect()
  }

  #[test]
  fn test_positional_fills_in_arrival_order() {
    let params = ParamSpec::list(&["a", "b"]);
    let values = project(
      &params,
      Binding::Positional,
      &bag(&[("A", Value::Int(5)), ("B", Value::Int(3))]),
      &serde_json::Map::new(),
    );
    assert_eq!(values, vec![Value::Int(5), Value::Int(3)]);
  }

  #[test]
  fn test_handles_bind_regardless_of_declaration_order() {
    let params = ParamSpec::list(&["minuend", "subtrahend"]);
    let values = project(
      &params,
      Binding::Positional,
      &bag(&[("subtrahend", Value::Int(1)), ("minuend", Value::Int(10))]),
      &serde_json::Map::new(),
    );
    assert_eq!(values, vec![Value::Int(10), Value::Int(1)]);
  }

  #[test]
  fn test_named_entries_are_placed_before_positional_ones() {
    let params = ParamSpec::list(&["a", "b"]);
    let values = project(
      &params,
      Binding::Positional,
      &bag(&[("X", Value::Int(1)), ("a", Value::Int(2))]),
      &serde_json::Map::new(),
    );
    assert_eq!(values, vec![Value::Int(2), Value::Int(1)]);
  }

  #[test]
  fn test_keyword_binding_drops_unmatched_keys() {
    let params = ParamSpec::list(&["x"]);
    let values = project(
      &params,
      Binding::Keyword,
      &bag(&[("A", Value::Int(4))]),
      &serde_json::Map::new(),
    );
    assert_eq!(values, vec![Value::Null]);
  }

  #[test]
  fn test_statics_then_defaults_fill_gaps() {
    let params = vec![
      ParamSpec::required("image"),
      ParamSpec::optional("lower_th", 120i64),
      ParamSpec::optional("upper_th", 255i64),
    ];
    let mut statics = serde_json::Map::new();
    statics.insert("lower_th".to_string(), json!(100));

    let values = project(
      &params,
      Binding::Keyword,
      &bag(&[("image", Value::from("img"))]),
      &statics,
    );
    assert_eq!(
      values,
      vec![Value::from("img"), Value::Int(100), Value::Int(255)]
    );
  }

  #[test]
  fn test_extra_positional_values_are_ignored() {
    let params = ParamSpec::list(&["x"]);
    let values = project(
      &params,
      Binding::Positional,
      &bag(&[("A", Value::Int(1)), ("B", Value::Int(2))]),
      &serde_json::Map::new(),
    );
    assert_eq!(values, vec![Value::Int(1)]);
  }

  #[test]
  fn test_argument_accessors() {
    let params = ParamSpec::list(&["a", "b", "c"]);
    let args = Arguments::new(
      &params,
      vec![Value::Int(2), Value::Float(1.5), Value::Null],
    );

    assert_eq!(args.int(0).unwrap(), 2);
    assert_eq!(args.number(1).unwrap(), 1.5);
    assert!(matches!(
      args.int(1),
      Err(OperationError::TypeMismatch { ref param, .. }) if param == "b"
    ));
    assert!(matches!(
      args.number(2),
      Err(OperationError::MissingArgument { ref param }) if param == "c"
    ));
    assert_eq!(args.get(7), &Value::Null);
  }

  #[test]
  fn test_int_rejects_floats_outside_i64() {
    let params = ParamSpec::list(&["a", "b", "c"]);
    let args = Arguments::new(
      &params,
      vec![Value::Float(1e300), Value::Float(-1e19), Value::Float(-4.0)],
    );

    assert!(matches!(
      args.int(0),
      Err(OperationError::TypeMismatch { ref param, expected: "int", .. }) if param == "a"
    ));
    assert!(matches!(args.int(1), Err(OperationError::TypeMismatch { .. })));
    assert_eq!(args.int(2).unwrap(), -4);
  }
}
