use std::collections::BTreeMap;
use std::fmt;

use bytes::Bytes;

use crate::error::CodecError;

/// A decoded media blob.
#[derive(Clone, PartialEq, Eq)]
pub struct Media {
  /// Content type, e.g. `image/png`.
  pub mime: String,
  pub bytes: Bytes,
}

impl Media {
  pub fn new(mime: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
    Self {
      mime: mime.into(),
      bytes: bytes.into(),
    }
  }

  pub fn len(&self) -> usize {
    self.bytes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.bytes.is_empty()
  }
}

impl fmt::Debug for Media {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Media")
      .field("mime", &self.mime)
      .field("len", &self.bytes.len())
      .finish()
  }
}

/// A value produced by an input node or an operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
  /// Nothing could be produced.
  #[default]
  Null,
  Bool(bool),
  Int(i64),
  Float(f64),
  Text(String),
  Media(Media),
  List(Vec<Value>),
  Map(BTreeMap<String, Value>),
}

impl Value {
  /// Lift a JSON literal into a runtime value.
  ///
  /// Integral numbers that fit in `i64` become [`Value::Int`], every other
  /// number becomes [`Value::Float`]. Strings are kept as text, including
  /// `data:` URLs.
  pub fn from_json(json: serde_json::Value) -> Self {
    match json {
      serde_json::Value::Null => Value::Null,
      serde_json::Value::Bool(b) => Value::Bool(b),
      serde_json::Value::Number(n) => match n.as_i64() {
        Some(i) => Value::Int(i),
        None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
      },
      serde_json::Value::String(s) => Value::Text(s),
      serde_json::Value::Array(items) => {
        Value::List(items.into_iter().map(Value::from_json).collect())
      }
      serde_json::Value::Object(map) => Value::Map(
        map
          .into_iter()
          .map(|(k, v)| (k, Value::from_json(v)))
          .collect(),
      ),
    }
  }

  /// Render as JSON. Media becomes its `data:` URL.
  pub fn to_json(&self) -> Result<serde_json::Value, CodecError> {
    Ok(match self {
      Value::Null => serde_json::Value::Null,
      Value::Bool(b) => serde_json::Value::Bool(*b),
      Value::Int(i) => serde_json::Value::from(*i),
      Value::Float(f) => serde_json::Number::from_f64(*f)
        .map(serde_json::Value::Number)
        .ok_or(CodecError::NonFiniteNumber { value: *f })?,
      Value::Text(s) => serde_json::Value::String(s.clone()),
      Value::Media(media) => serde_json::Value::String(crate::codec::encode_media(media)),
      Value::List(items) => serde_json::Value::Array(
        items
          .iter()
          .map(Value::to_json)
          .collect::<Result<_, _>>()?,
      ),
      Value::Map(map) => serde_json::Value::Object(
        map
          .iter()
          .map(|(k, v)| Ok((k.clone(), v.to_json()?)))
          .collect::<Result<_, CodecError>>()?,
      ),
    })
  }

  /// Numeric view of ints and floats.
  pub fn as_f64(&self) -> Option<f64> {
    match self {
      Value::Int(i) => Some(*i as f64),
      Value::Float(f) => Some(*f),
      _ => None,
    }
  }

  pub fn as_str(&self) -> Option<&str> {
    match self {
      Value::Text(s) => Some(s),
      _ => None,
    }
  }

  pub fn as_media(&self) -> Option<&Media> {
    match self {
      Value::Media(media) => Some(media),
      _ => None,
    }
  }

  /// Short type label used in error messages.
  pub fn type_name(&self) -> &'static str {
    match self {
      Value::Null => "null",
      Value::Bool(_) => "bool",
      Value::Int(_) => "int",
      Value::Float(_) => "float",
      Value::Text(_) => "text",
      Value::Media(_) => "media",
      Value::List(_) => "list",
      Value::Map(_) => "map",
    }
  }
}

impl From<bool> for Value {
  fn from(b: bool) -> Self {
    Value::Bool(b)
  }
}

impl From<i64> for Value {
  fn from(i: i64) -> Self {
    Value::Int(i)
  }
}

impl From<f64> for Value {
  fn from(f: f64) -> Self {
    Value::Float(f)
  }
}

impl From<&str> for Value {
  fn from(s: &str) -> Self {
    Value::Text(s.to_string())
  }
}

impl From<String> for Value {
  fn from(s: String) -> Self {
    Value::Text(s)
  }
}

impl From<Media> for Value {
  fn from(media: Media) -> Self {
    Value::Media(media)
  }
}

impl From<Vec<Value>> for Value {
  fn from(items: Vec<Value>) -> Self {
    Value::List(items)
  }
}
