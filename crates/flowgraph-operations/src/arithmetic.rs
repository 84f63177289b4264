//! Arithmetic and comparison operations.

use flowgraph_registry::{
  Arguments, GroupBuilder, OperationDescriptor, OperationError, OperationProvider, ParamSpec,
  Value,
};

use crate::numeric::{Num, combine, floor_mod};

/// Stateless two-operand arithmetic: `add`, `sub`, `multiply`, `divide`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ArithmeticFunctions;

fn binary(args: &Arguments<'_>) -> Result<(Num, Num), OperationError> {
  Ok((Num::at(args, 0)?, Num::at(args, 1)?))
}

fn divide(args: &Arguments<'_>) -> Result<Value, OperationError> {
  let (a, b) = binary(args)?;
  if b.is_zero() {
    return Err(OperationError::failed("division by zero"));
  }
  Ok(Value::Float(a.as_f64() / b.as_f64()))
}

impl OperationProvider for ArithmeticFunctions {
  fn name(&self) -> &str {
    "functions"
  }

  fn operations(&self) -> Vec<OperationDescriptor> {
    let ab = || ParamSpec::list(&["a", "b"]);
    vec![
      OperationDescriptor::function("add", ab(), |args| {
        let (a, b) = binary(args)?;
        combine(a, b, i64::checked_add, |x, y| x + y)
      }),
      OperationDescriptor::function("sub", ab(), |args| {
        let (a, b) = binary(args)?;
        combine(a, b, i64::checked_sub, |x, y| x - y)
      }),
      OperationDescriptor::function("multiply", ab(), |args| {
        let (a, b) = binary(args)?;
        combine(a, b, i64::checked_mul, |x, y| x * y)
      }),
      OperationDescriptor::function("divide", ab(), divide),
    ]
  }
}

/// The arithmetic operation group.
///
/// Every method shares one instance per run.
#[derive(Debug, Default, Clone, Copy)]
pub struct ArithmeticOperations;

impl ArithmeticOperations {
  fn compare(
    &mut self,
    args: &Arguments<'_>,
    test: fn(std::cmp::Ordering) -> bool,
  ) -> Result<Value, OperationError> {
    let (a, b) = binary(args)?;
    let ordering = a
      .as_f64()
      .partial_cmp(&b.as_f64())
      .ok_or_else(|| OperationError::failed("cannot compare NaN"))?;
    Ok(Value::Bool(test(ordering)))
  }

  fn equality(&mut self, args: &Arguments<'_>) -> Result<bool, OperationError> {
    let a = args.require(0)?;
    let b = args.require(1)?;
    Ok(match (a.as_f64(), b.as_f64()) {
      (Some(x), Some(y)) => x == y,
      _ => a == b,
    })
  }

  fn round(&mut self, args: &Arguments<'_>) -> Result<Value, OperationError> {
    let value = Num::at(args, 0)?;
    let digits = args.int(1)?;
    match value {
      Num::Int(i) if digits >= 0 => Ok(Value::Int(i)),
      _ => {
        let digits = i32::try_from(digits)
          .map_err(|_| OperationError::failed(format!("invalid digit count {digits}")))?;
        let factor = 10f64.powi(digits);
        Ok(Value::Float((value.as_f64() * factor).round_ties_even() / factor))
      }
    }
  }

  fn to_integer(&mut self, args: &Arguments<'_>) -> Result<Value, OperationError> {
    match args.require(0)? {
      Value::Int(i) => Ok(Value::Int(*i)),
      Value::Float(f) if f.is_finite() => Ok(Value::Int(f.trunc() as i64)),
      Value::Text(s) => s
        .trim()
        .parse::<i64>()
        .map(Value::Int)
        .map_err(|e| OperationError::failed(format!("invalid integer '{s}': {e}"))),
      other => Err(OperationError::failed(format!(
        "cannot convert {} to integer",
        other.type_name()
      ))),
    }
  }

  fn power(&mut self, args: &Arguments<'_>) -> Result<Value, OperationError> {
    let (base, exponent) = binary(args)?;
    match (base, exponent) {
      (Num::Int(b), Num::Int(e)) if e >= 0 => u32::try_from(e)
        .ok()
        .and_then(|e| b.checked_pow(e))
        .map(Value::Int)
        .ok_or_else(|| OperationError::failed("integer overflow")),
      _ => Ok(Value::Float(base.as_f64().powf(exponent.as_f64()))),
    }
  }
}

impl OperationProvider for ArithmeticOperations {
  fn name(&self) -> &str {
    "ArithmeticOperations"
  }

  fn operations(&self) -> Vec<OperationDescriptor> {
    let pair = || ParamSpec::list(&["variable1", "variable2"]);
    let single = || ParamSpec::list(&["variable1"]);
    GroupBuilder::new("ArithmeticOperations", ArithmeticOperations::default)
      .method("Addition", pair(), |_: &mut Self, args| {
        let (a, b) = binary(args)?;
        combine(a, b, i64::checked_add, |x, y| x + y)
      })
      .method("Subtraction", pair(), |_: &mut Self, args| {
        let (a, b) = binary(args)?;
        combine(a, b, i64::checked_sub, |x, y| x - y)
      })
      .method("Division", pair(), |_: &mut Self, args| divide(args))
      .method("Multiplication", pair(), |_: &mut Self, args| {
        let (a, b) = binary(args)?;
        combine(a, b, i64::checked_mul, |x, y| x * y)
      })
      .method("Average", pair(), |_: &mut Self, args| {
        let (a, b) = binary(args)?;
        Ok(Value::Float((a.as_f64() + b.as_f64()) / 2.0))
      })
      .method("power", pair(), Self::power)
      .method("square_root", single(), |_: &mut Self, args| {
        let x = args.number(0)?;
        if x < 0.0 {
          return Err(OperationError::failed("square root of a negative number"));
        }
        Ok(Value::Float(x.sqrt()))
      })
      .method("greater_than", pair(), |g: &mut Self, args| {
        g.compare(args, std::cmp::Ordering::is_gt)
      })
      .method("less_than", pair(), |g: &mut Self, args| {
        g.compare(args, std::cmp::Ordering::is_lt)
      })
      .method("greater_than_equal", pair(), |g: &mut Self, args| {
        g.compare(args, std::cmp::Ordering::is_ge)
      })
      .method("less_than_equal", pair(), |g: &mut Self, args| {
        g.compare(args, std::cmp::Ordering::is_le)
      })
      .method("equal", pair(), |g: &mut Self, args| {
        g.equality(args).map(Value::Bool)
      })
      .method("not_equal", pair(), |g: &mut Self, args| {
        g.equality(args).map(|eq| Value::Bool(!eq))
      })
      .method(
        "rounding_off",
        vec![
          ParamSpec::required("variable1"),
          ParamSpec::optional("rounding_off", 0i64),
        ],
        Self::round,
      )
      .method("to_integer", single(), Self::to_integer)
      .method("absolute_value", single(), |_: &mut Self, args| {
        match Num::at(args, 0)? {
          Num::Int(i) => i
            .checked_abs()
            .map(Value::Int)
            .ok_or_else(|| OperationError::failed("integer overflow")),
          Num::Float(f) => Ok(Value::Float(f.abs())),
        }
      })
      .method(
        "in_range",
        ParamSpec::list(&["variable1", "a", "variable2"]),
        |_: &mut Self, args| {
          let start = args.int(0)?;
          let value = args.int(1)?;
          let end = args.int(2)?;
          Ok(Value::Bool((start..end).contains(&value)))
        },
      )
      .method("modulus_remainder", pair(), |_: &mut Self, args| {
        let (a, b) = binary(args)?;
        floor_mod(a, b)
      })
      .build()
  }
}
