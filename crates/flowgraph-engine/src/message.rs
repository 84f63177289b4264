//! Messages streamed to the client, one JSON object per line.

use flowgraph_value::{CodecError, encode};
use serde::{Deserialize, Serialize};

use crate::store::NodeOutcome;

/// Text of the terminal success message.
pub const COMPLETION_MESSAGE: &str = "All results processed";

/// One line of a response stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StreamMessage {
  /// The value reaching a sink node.
  Result {
    #[serde(rename = "resultNode")]
    result_node: String,
    value: serde_json::Value,
    /// Set when the value is unavailable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
  },
  /// Terminal success.
  Completed { message: String },
  /// Terminal failure of the stream itself.
  Error { error: String },
}

impl StreamMessage {
  /// Build the message for a sink edge ending at `result_node`.
  pub fn result(result_node: impl Into<String>, outcome: &NodeOutcome) -> Result<Self, CodecError> {
    let (value, reason) = match outcome {
      NodeOutcome::Ready(value) => (encode(value)?, None),
      NodeOutcome::Unavailable(reason) => (serde_json::Value::Null, Some(reason.to_string())),
    };
    Ok(StreamMessage::Result {
      result_node: result_node.into(),
      value,
      reason,
    })
  }

  pub fn completed() -> Self {
    StreamMessage::Completed {
      message: COMPLETION_MESSAGE.to_string(),
    }
  }

  pub fn error(error: impl Into<String>) -> Self {
    StreamMessage::Error {
      error: error.into(),
    }
  }

  /// Whether this message ends a stream.
  pub fn is_terminal(&self) -> bool {
    !matches!(self, StreamMessage::Result { .. })
  }

  /// Serialize as a single NDJSON line, without the trailing newline.
  pub fn to_line(&self) -> Result<String, serde_json::Error> {
    serde_json::to_string(self)
  }
}
