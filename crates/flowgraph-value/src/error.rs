use thiserror::Error;

/// Errors raised while moving values in or out of their transport form.
#[derive(Debug, Error)]
pub enum CodecError {
  /// The string is not a `data:<mime>;base64,<payload>` URL.
  #[error("not an encoded media blob: {prefix}")]
  NotMedia { prefix: String },

  /// The payload is not valid base64.
  #[error("invalid base64 payload: {0}")]
  InvalidBase64(#[from] base64::DecodeError),

  /// A structured value holds a number JSON cannot represent.
  #[error("cannot encode non-finite number {value} inside a structured value")]
  NonFiniteNumber { value: f64 },

  /// Structured value could not be rendered as JSON text.
  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}
