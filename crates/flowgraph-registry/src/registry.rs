//! The operation registry.

use std::sync::Arc;

use flowgraph_value::Value;
use indexmap::IndexMap;
use tracing::debug;

use crate::catalog::OperationInfo;
use crate::descriptor::OperationDescriptor;
use crate::error::CallError;
use crate::provider::OperationProvider;

/// Name-keyed table of invocable operations.
///
/// Names are matched exactly. When two providers register the same name the
/// first registration wins; later ones are recorded in
/// [`shadowed`](Self::shadowed).
#[derive(Default)]
pub struct OperationRegistry {
  operations: IndexMap<String, Arc<OperationDescriptor>>,
  shadowed: Vec<(String, String)>,
}

impl std::fmt::Debug for OperationRegistry {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("OperationRegistry")
      .field("operations", &self.names())
      .finish()
  }
}

impl OperationRegistry {
  /// Creates an empty registry.
  pub fn new() -> Self {
    Self::default()
  }

  /// Build a registry from providers, in order.
  pub fn from_providers<'a, P>(providers: impl IntoIterator<Item = &'a P>) -> Self
  where
    P: OperationProvider + ?Sized + 'a,
  {
    let mut registry = Self::new();
    for provider in providers {
      registry.register_provider(provider);
    }
    registry
  }

  /// Register one operation. Returns `false` if the name was already taken.
  pub fn register(&mut self, descriptor: OperationDescriptor) -> bool {
    if self.operations.contains_key(&descriptor.name) {
      debug!(
        operation = %descriptor.name,
        provider = %descriptor.provider,
        "operation already registered, keeping first"
      );
      self.shadowed.push((descriptor.name, descriptor.provider));
      return false;
    }
    self
      .operations
      .insert(descriptor.name.clone(), Arc::new(descriptor));
    true
  }

  /// Register every operation a provider contributes.
  pub fn register_provider<P: OperationProvider + ?Sized>(&mut self, provider: &P) {
    let mut added = 0usize;
    for descriptor in provider.operations() {
      if self.register(descriptor.with_provider(provider.name())) {
        added += 1;
      }
    }
    debug!(provider = %provider.name(), operations = added, "provider registered");
  }

  /// Look up an operation by exact name.
  pub fn resolve(&self, name: &str) -> Option<Arc<OperationDescriptor>> {
    self.operations.get(name).cloned()
  }

  /// Call `name` once with positional `inputs`, outside any run.
  ///
  /// Group methods run against a throwaway instance.
  pub fn call(&self, name: &str, inputs: Vec<Value>) -> Result<Value, CallError> {
    let op = self
      .resolve(name)
      .ok_or_else(|| CallError::UnknownOperation(name.to_string()))?;
    let args = op.bind_inputs(inputs)?;
    let mut instance = op.new_instance();
    debug!(operation = %name, inputs = args.len(), "operation called");
    Ok(op.invoke(instance.as_deref_mut(), &args)?)
  }

  pub fn contains(&self, name: &str) -> bool {
    self.operations.contains_key(name)
  }

  /// Names of all registered operations, in registration order.
  pub fn names(&self) -> Vec<&str> {
    self.operations.keys().map(String::as_str).collect()
  }

  pub fn len(&self) -> usize {
    self.operations.len()
  }

  pub fn is_empty(&self) -> bool {
    self.operations.is_empty()
  }

  /// (name, provider) pairs that lost to an earlier registration.
  pub fn shadowed(&self) -> &[(String, String)] {
    &self.shadowed
  }

  /// Describe every registered operation.
  pub fn catalog(&self) -> Vec<OperationInfo> {
    self
      .operations
      .values()
      .map(|d| OperationInfo::from(d.as_ref()))
      .collect()
  }
}
