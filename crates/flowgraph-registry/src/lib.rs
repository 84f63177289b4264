//! Operation registry for flowgraph.
//!
//! The [`OperationRegistry`] maps a stable operation name to an
//! [`OperationDescriptor`]: the callable, its ordered parameter schema, and
//! whether it runs against a shared per-run group instance.
//!
//! The registry is populated once at startup from a fixed list of
//! [`OperationProvider`]s and is read-only afterwards. Wrap it in an `Arc` to
//! share it between runs.
//!
//! # Usage
//!
//! ```ignore
//! use flowgraph_registry::{OperationRegistry, OperationDescriptor, ParamSpec};
//!
//! let mut registry = OperationRegistry::new();
//! registry.register(OperationDescriptor::function(
//!   "double",
//!   vec![ParamSpec::required("x")],
//!   |args| Ok(Value::Int(args.int(0)? * 2)),
//! ));
//!
//! let double = registry.resolve("double").expect("registered above");
//! ```

mod catalog;
mod descriptor;
mod error;
mod param;
mod provider;
mod registry;

pub use catalog::{OperationInfo, ParamInfo};
pub use descriptor::{
  FunctionFn, GroupBuilder, GroupFactory, Instance, Invocation, MethodFn, OperationDescriptor,
};
pub use error::{CallError, OperationError};
pub use param::{ArgumentBag, Arguments, Binding, ParamSpec};
pub use provider::OperationProvider;
pub use registry::OperationRegistry;

pub use flowgraph_value::Value;
