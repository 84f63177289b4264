//! Transport codec for media blobs and sink values.
//!
//! Media travels as `data:<mime>;base64,<payload>`. Scalars travel as their
//! string form; lists and maps as JSON text; an unavailable value as JSON `null`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::CodecError;
use crate::value::{Media, Value};

const DATA_PREFIX: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

/// Whether `s` is a media blob still in its transport form.
pub fn is_encoded_media(s: &str) -> bool {
  s.starts_with(DATA_PREFIX) && s.contains(BASE64_MARKER)
}

/// Decode a `data:` URL into an in-memory media blob.
pub fn decode(encoded: &str) -> Result<Media, CodecError> {
  let (mime, payload) = encoded
    .strip_prefix(DATA_PREFIX)
    .and_then(|rest| rest.split_once(BASE64_MARKER))
    .ok_or_else(|| CodecError::NotMedia {
      prefix: encoded.chars().take(32).collect(),
    })?;

  let bytes = STANDARD.decode(payload.trim())?;
  Ok(Media::new(mime, bytes))
}

/// Decode `value` if it is media in transport form, otherwise return it unchanged.
pub fn decode_value(value: Value) -> Result<Value, CodecError> {
  match value {
    Value::Text(s) if is_encoded_media(&s) => decode(&s).map(Value::Media),
    other => Ok(other),
  }
}

/// Encode a media blob as a `data:` URL.
pub fn encode_media(media: &Media) -> String {
  format!(
    "{DATA_PREFIX}{}{BASE64_MARKER}{}",
    media.mime,
    STANDARD.encode(&media.bytes)
  )
}

/// Encode a value into the form carried in a sink message.
pub fn encode(value: &Value) -> Result<serde_json::Value, CodecError> {
  let text = match value {
    Value::Null => return Ok(serde_json::Value::Null),
    Value::Bool(b) => b.to_string(),
    Value::Int(i) => i.to_string(),
    Value::Float(f) => format_float(*f),
    Value::Text(s) => s.clone(),
    Value::Media(media) => encode_media(media),
    Value::List(_) | Value::Map(_) => serde_json::to_string(&value.to_json()?)?,
  };
  Ok(serde_json::Value::String(text))
}

/// Integral floats keep a trailing `.0` so they stay distinguishable from ints.
fn format_float(f: f64) -> String {
  if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e16 {
    format!("{f:.1}")
  } else {
    f.to_string()
  }
}
