//! Error types for operation invocation.

use flowgraph_value::CodecError;
use thiserror::Error;

/// Errors an operation can raise while executing.
#[derive(Debug, Error)]
pub enum OperationError {
  /// A parameter received no value.
  #[error("missing argument '{param}'")]
  MissingArgument { param: String },

  /// A parameter received a value of the wrong type.
  #[error("argument '{param}' expected {expected}, got {found}")]
  TypeMismatch {
    param: String,
    expected: &'static str,
    found: &'static str,
  },

  /// The operation ran and reported a failure.
  #[error("{0}")]
  Failed(String),

  /// A group method was called without, or with the wrong, group instance.
  #[error("operation group '{group}' instance unavailable")]
  InstanceMismatch { group: String },

  /// The operation panicked.
  #[error("operation panicked: {0}")]
  Panicked(String),

  /// Media could not be decoded or encoded.
  #[error(transparent)]
  Codec(#[from] CodecError),
}

impl OperationError {
  /// Creates a [`Failed`](Self::Failed) error.
  pub fn failed(msg: impl Into<String>) -> Self {
    Self::Failed(msg.into())
  }

  /// Creates a [`MissingArgument`](Self::MissingArgument) error.
  pub fn missing(param: impl Into<String>) -> Self {
    Self::MissingArgument {
      param: param.into(),
    }
  }
}

/// Errors from calling one operation directly, outside a run.
#[derive(Debug, Error)]
pub enum CallError {
  /// No operation is registered under the name.
  #[error("invalid function name '{0}'")]
  UnknownOperation(String),

  /// More inputs than the operation declares parameters.
  #[error("invalid input arguments: {operation} takes {expected}, got {found}")]
  TooManyInputs {
    operation: String,
    expected: usize,
    found: usize,
  },

  /// An input was missing or of the wrong type.
  #[error("invalid input arguments: {0}")]
  InvalidArguments(#[source] OperationError),

  /// The operation ran and failed.
  #[error(transparent)]
  Failed(OperationError),
}

impl From<OperationError> for CallError {
  fn from(e: OperationError) -> Self {
    match e {
      OperationError::MissingArgument { .. } | OperationError::TypeMismatch { .. } => {
        CallError::InvalidArguments(e)
      }
      e => CallError::Failed(e),
    }
  }
}
