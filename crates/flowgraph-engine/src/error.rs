//! Engine errors.

use std::path::PathBuf;

use flowgraph_value::CodecError;

/// Failures of a run as a whole, or of loading engine configuration.
///
/// Node-level failures never show up here; they are recorded as
/// [`Unavailable`](crate::Unavailable) outcomes instead.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
  /// The run was cancelled, or its consumer went away.
  #[error("execution cancelled")]
  Cancelled,

  /// A sink value could not be put into transport form.
  #[error("failed to encode value for '{node_id}': {source}")]
  Encode {
    node_id: String,
    #[source]
    source: CodecError,
  },

  /// The config file could not be read.
  #[error("failed to read config file '{}'", path.display())]
  ConfigRead {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// The config file is not valid.
  #[error("invalid config file '{}'", path.display())]
  ConfigParse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  /// The runner's request channel is closed.
  #[error("flow runner channel closed")]
  ChannelClosed,
}
