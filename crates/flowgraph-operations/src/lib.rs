//! Built-in operation providers.
//!
//! Providers are registered in the order returned by [`default_providers`];
//! when two of them define the same operation name the earlier one wins.
//!
//! | Provider | Kind | Operations |
//! |---|---|---|
//! | `functions` | free functions | `add`, `sub`, `multiply`, `divide` |
//! | `ArithmeticOperations` | group instance | `Addition`, `Subtraction`, ..., `modulus_remainder` |
//! | `calculation` | group instance | `point_to_point`, `midpoint`, `find_slope_and_intercept` |
//! | `media` | free functions | `media_type`, `media_size` |

mod arithmetic;
mod calculation;
mod media;
mod numeric;

pub use arithmetic::{ArithmeticFunctions, ArithmeticOperations};
pub use calculation::Calculation;
pub use media::MediaOperations;

use flowgraph_registry::{OperationProvider, OperationRegistry};

/// The fixed provider list, in registration order.
pub fn default_providers() -> Vec<Box<dyn OperationProvider>> {
  vec![
    Box::new(ArithmeticFunctions),
    Box::new(ArithmeticOperations),
    Box::new(Calculation),
    Box::new(MediaOperations),
  ]
}

/// A registry holding every built-in operation.
pub fn default_registry() -> OperationRegistry {
  let providers = default_providers();
  OperationRegistry::from_providers(providers.iter().map(|p| p.as_ref()))
}

#[cfg(test)]
mod tests {
  use super::*;
  use flowgraph_registry::{CallError, Value};

  #[test]
  fn test_default_registry_contents() {
    let registry = default_registry();
    for name in ["add", "sub", "multiply", "divide", "Addition", "power", "point_to_point", "media_type"] {
      assert!(registry.contains(name), "missing {name}");
    }
    assert!(registry.shadowed().is_empty());
    assert!(registry.resolve("Addition").unwrap().requires_instance());
    assert!(!registry.resolve("add").unwrap().requires_instance());
  }

  #[test]
  fn test_direct_calls() {
    let registry = default_registry();
    assert_eq!(
      registry.call("add", vec![Value::Int(5), Value::Int(3)]).unwrap(),
      Value::Int(8)
    );
    assert_eq!(
      registry.call("Addition", vec![Value::Int(2), Value::Float(0.5)]).unwrap(),
      Value::Float(2.5)
    );
    assert!(matches!(
      registry.call("add_typo", vec![Value::Int(1)]),
      Err(CallError::UnknownOperation(_))
    ));
    assert!(matches!(
      registry.call("divide", vec![Value::Int(1), Value::Int(0)]),
      Err(CallError::Failed(_))
    ));
  }
}
