use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Engine tuning, shared by every run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
  /// Pause between sink edges. Zero only yields to the scheduler.
  pub pass_delay_ms: u64,
  /// Capacity of the message and request channels.
  pub channel_capacity: usize,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      pass_delay_ms: 0,
      channel_capacity: 100,
    }
  }
}

impl EngineConfig {
  /// Load a config from a JSON file. Missing fields take their defaults.
  pub fn from_file(path: impl AsRef<Path>) -> Result<Self, EngineError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| EngineError::ConfigRead {
      path: path.to_path_buf(),
      source,
    })?;
    serde_json::from_str(&content).map_err(|source| EngineError::ConfigParse {
      path: path.to_path_buf(),
      source,
    })
  }

  pub fn pass_delay(&self) -> Option<Duration> {
    (self.pass_delay_ms > 0).then(|| Duration::from_millis(self.pass_delay_ms))
  }

  /// Channel capacity, never zero.
  pub fn capacity(&self) -> usize {
    self.channel_capacity.max(1)
  }
}
