//! Number handling shared by the arithmetic providers.
//!
//! Ints stay ints while every operand is an int and the result fits; any float
//! operand promotes the result to a float.

use flowgraph_registry::{Arguments, OperationError, Value};

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Num {
  Int(i64),
  Float(f64),
}

impl Num {
  pub(crate) fn at(args: &Arguments<'_>, index: usize) -> Result<Self, OperationError> {
    match args.require(index)? {
      Value::Int(i) => Ok(Num::Int(*i)),
      Value::Float(f) => Ok(Num::Float(*f)),
      _ => args.number(index).map(Num::Float),
    }
  }

  pub(crate) fn as_f64(self) -> f64 {
    match self {
      Num::Int(i) => i as f64,
      Num::Float(f) => f,
    }
  }

  pub(crate) fn is_zero(self) -> bool {
    match self {
      Num::Int(i) => i == 0,
      Num::Float(f) => f == 0.0,
    }
  }
}

impl From<Num> for Value {
  fn from(n: Num) -> Self {
    match n {
      Num::Int(i) => Value::Int(i),
      Num::Float(f) => Value::Float(f),
    }
  }
}

/// Apply an integer op when both sides are ints, the float op otherwise.
pub(crate) fn combine(
  a: Num,
  b: Num,
  int_op: fn(i64, i64) -> Option<i64>,
  float_op: fn(f64, f64) -> f64,
) -> Result<Value, OperationError> {
  match (a, b) {
    (Num::Int(x), Num::Int(y)) => int_op(x, y)
      .map(Value::Int)
      .ok_or_else(|| OperationError::failed("integer overflow")),
    _ => Ok(Value::Float(float_op(a.as_f64(), b.as_f64()))),
  }
}

/// Remainder taking the sign of the divisor.
pub(crate) fn floor_mod(a: Num, b: Num) -> Result<Value, OperationError> {
  if b.is_zero() {
    return Err(OperationError::failed("modulo by zero"));
  }
  match (a, b) {
    (Num::Int(x), Num::Int(y)) => {
      let r = x.checked_rem(y).ok_or_else(|| OperationError::failed("integer overflow"))?;
      Ok(Value::Int(if r != 0 && (r < 0) != (y < 0) { r + y } else { r }))
    }
    _ => {
      let (x, y) = (a.as_f64(), b.as_f64());
      let r = x % y;
      Ok(Value::Float(if r != 0.0 && (r < 0.0) != (y < 0.0) { r + y } else { r }))
    }
  }
}
