//! Operation descriptors.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use flowgraph_value::Value;

use crate::error::{CallError, OperationError};
use crate::param::{self, ArgumentBag, Arguments, Binding, ParamSpec};

/// A stateless operation.
pub type FunctionFn =
  Arc<dyn Fn(&Arguments<'_>) -> Result<Value, OperationError> + Send + Sync>;

/// A per-run group instance.
pub type Instance = dyn Any + Send + 'static;

/// An operation that runs against a group instance.
pub type MethodFn =
  Arc<dyn Fn(&mut Instance, &Arguments<'_>) -> Result<Value, OperationError> + Send + Sync>;

/// Creates a fresh group instance.
pub type GroupFactory = Arc<dyn Fn() -> Box<Instance> + Send + Sync>;

/// How an operation is called.
#[derive(Clone)]
pub enum Invocation {
  /// A free function over its arguments.
  Function(FunctionFn),
  /// A method on a group instance shared by every operation of that group
  /// within one run.
  Method {
    group: String,
    factory: GroupFactory,
    call: MethodFn,
  },
}

impl fmt::Debug for Invocation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Invocation::Function(_) => f.write_str("Function"),
      Invocation::Method { group, .. } => f.debug_struct("Method").field("group", group).finish(),
    }
  }
}

/// Everything the engine needs to call one named operation.
#[derive(Debug, Clone)]
pub struct OperationDescriptor {
  pub name: String,
  /// Name of the provider that registered the operation.
  pub provider: String,
  pub params: Vec<ParamSpec>,
  pub binding: Binding,
  pub invocation: Invocation,
}

impl OperationDescriptor {
  /// Describe a free function.
  pub fn function<F>(name: impl Into<String>, params: Vec<ParamSpec>, f: F) -> Self
  where
    F: Fn(&Arguments<'_>) -> Result<Value, OperationError> + Send + Sync + 'static,
  {
    Self {
      name: name.into(),
      provider: String::new(),
      params,
      binding: Binding::default(),
      invocation: Invocation::Function(Arc::new(f)),
    }
  }

  /// Set the binding mode.
  pub fn with_binding(mut self, binding: Binding) -> Self {
    self.binding = binding;
    self
  }

  /// Set the provider name.
  pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
    self.provider = provider.into();
    self
  }

  /// Whether invoking needs a group instance.
  pub fn requires_instance(&self) -> bool {
    matches!(self.invocation, Invocation::Method { .. })
  }

  /// The instance group this operation belongs to, if any.
  pub fn group(&self) -> Option<&str> {
    match &self.invocation {
      Invocation::Method { group, .. } => Some(group),
      Invocation::Function(_) => None,
    }
  }

  /// Create a new instance for this operation's group.
  pub fn new_instance(&self) -> Option<Box<Instance>> {
    match &self.invocation {
      Invocation::Method { factory, .. } => Some(factory()),
      Invocation::Function(_) => None,
    }
  }

  /// Map a keyed argument bag onto this operation's parameter order.
  ///
  /// `statics` are the static parameters configured on the node.
  pub fn bind(
    &self,
    bag: &ArgumentBag,
    statics: &serde_json::Map<String, serde_json::Value>,
  ) -> Arguments<'_> {
    Arguments::new(
      &self.params,
      param::project(&self.params, self.binding, bag, statics),
    )
  }

  /// Bind `inputs` to the parameters in declaration order. Parameters past
  /// the last input take their default, else [`Value::Null`].
  pub fn bind_inputs(&self, mut inputs: Vec<Value>) -> Result<Arguments<'_>, CallError> {
    if inputs.len() > self.params.len() {
      return Err(CallError::TooManyInputs {
        operation: self.name.clone(),
        expected: self.params.len(),
        found: inputs.len(),
      });
    }
    let rest = &self.params[inputs.len()..];
    inputs.extend(rest.iter().map(|p| p.default.clone().unwrap_or(Value::Null)));
    Ok(Arguments::new(&self.params, inputs))
  }

  /// Call the operation.
  ///
  /// `instance` must be this operation's group instance when
  /// [`requires_instance`](Self::requires_instance) is true; it is ignored
  /// otherwise.
  pub fn invoke(
    &self,
    instance: Option<&mut Instance>,
    args: &Arguments<'_>,
  ) -> Result<Value, OperationError> {
    match &self.invocation {
      Invocation::Function(f) => f(args),
      Invocation::Method { group, call, .. } => {
        let instance = instance.ok_or_else(|| OperationError::InstanceMismatch {
          group: group.clone(),
        })?;
        call(instance, args)
      }
    }
  }
}

/// Builds the descriptors of a stateful operation group.
///
/// Every method shares one `G` per run, created lazily by `factory`.
pub struct GroupBuilder<G> {
  group: String,
  provider: String,
  factory: GroupFactory,
  binding: Binding,
  operations: Vec<OperationDescriptor>,
  _group: PhantomData<fn() -> G>,
}

impl<G: Any + Send> GroupBuilder<G> {
  pub fn new<F>(group: impl Into<String>, factory: F) -> Self
  where
    F: Fn() -> G + Send + Sync + 'static,
  {
    Self {
      group: group.into(),
      provider: String::new(),
      factory: Arc::new(move || Box::new(factory()) as Box<Instance>),
      binding: Binding::default(),
      operations: Vec::new(),
      _group: PhantomData,
    }
  }

  /// Binding mode for methods added after this call.
  pub fn binding(mut self, binding: Binding) -> Self {
    self.binding = binding;
    self
  }

  /// Add a method.
  pub fn method<F>(mut self, name: impl Into<String>, params: Vec<ParamSpec>, f: F) -> Self
  where
    F: Fn(&mut G, &Arguments<'_>) -> Result<Value, OperationError> + Send + Sync + 'static,
  {
    let group = self.group.clone();
    let call: MethodFn = Arc::new(move |instance: &mut Instance, args: &Arguments<'_>| {
      let instance = instance
        .downcast_mut::<G>()
        .ok_or_else(|| OperationError::InstanceMismatch {
          group: group.clone(),
        })?;
      f(instance, args)
    });

    self.operations.push(OperationDescriptor {
      name: name.into(),
      provider: self.provider.clone(),
      params,
      binding: self.binding,
      invocation: Invocation::Method {
        group: self.group.clone(),
        factory: self.factory.clone(),
        call,
      },
    });
    self
  }

  pub fn build(self) -> Vec<OperationDescriptor> {
    self.operations
  }
}
