//! Inspection of decoded media blobs.

use flowgraph_registry::{OperationDescriptor, OperationError, OperationProvider, ParamSpec, Value};

#[derive(Debug, Default, Clone, Copy)]
pub struct MediaOperations;

impl OperationProvider for MediaOperations {
  fn name(&self) -> &str {
    "media"
  }

  fn operations(&self) -> Vec<OperationDescriptor> {
    vec![
      OperationDescriptor::function("media_type", ParamSpec::list(&["media"]), |args| {
        Ok(Value::Text(args.media(0)?.mime.clone()))
      }),
      OperationDescriptor::function("media_size", ParamSpec::list(&["media"]), |args| {
        let len = args.media(0)?.len();
        i64::try_from(len)
          .map(Value::Int)
          .map_err(|_| OperationError::failed("media too large"))
      }),
    ]
  }
}
