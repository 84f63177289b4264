use crate::descriptor::OperationDescriptor;

/// A fixed source of operations, registered once at startup.
pub trait OperationProvider: Send + Sync {
  /// Provider name, recorded on every descriptor it contributes.
  fn name(&self) -> &str;

  /// The operations this provider contributes, in registration order.
  fn operations(&self) -> Vec<OperationDescriptor>;
}
