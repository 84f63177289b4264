//! Geometry helpers over points given as lists of numbers.

use flowgraph_registry::{
  Arguments, GroupBuilder, OperationDescriptor, OperationError, OperationProvider, ParamSpec,
  Value,
};

/// The `calculation` operation group.
#[derive(Debug, Default, Clone, Copy)]
pub struct Calculation;

fn coordinates(args: &Arguments<'_>, index: usize) -> Result<Vec<f64>, OperationError> {
  let Value::List(items) = args.require(index)? else {
    return Err(args.mismatch(index, "list"));
  };
  items
    .iter()
    .map(|item| {
      item
        .as_f64()
        .ok_or_else(|| OperationError::failed(format!("expected a number, got {}", item.type_name())))
    })
    .collect()
}

fn same_dimension(a: &[f64], b: &[f64]) -> Result<(), OperationError> {
  if a.len() != b.len() {
    return Err(OperationError::failed(
      "both points must have the same dimension",
    ));
  }
  Ok(())
}

impl Calculation {
  fn point_to_point(&mut self, args: &Arguments<'_>) -> Result<Value, OperationError> {
    let a = coordinates(args, 0)?;
    let b = coordinates(args, 1)?;
    same_dimension(&a, &b)?;
    let distance = a
      .iter()
      .zip(&b)
      .map(|(p, q)| (p - q).powi(2))
      .sum::<f64>()
      .sqrt();
    Ok(Value::Float(distance))
  }

  fn midpoint(&mut self, args: &Arguments<'_>) -> Result<Value, OperationError> {
    let a = coordinates(args, 0)?;
    let b = coordinates(args, 1)?;
    same_dimension(&a, &b)?;
    Ok(Value::List(
      a.iter()
        .zip(&b)
        .map(|(p, q)| Value::Float((p + q) / 2.0))
        .collect(),
    ))
  }

  /// Least-squares fit of `y = slope * x + intercept`, returned as
  /// `[slope, intercept]`.
  fn find_slope_and_intercept(&mut self, args: &Arguments<'_>) -> Result<Value, OperationError> {
    let xs = coordinates(args, 0)?;
    let ys = coordinates(args, 1)?;
    if xs.len() != ys.len() {
      return Err(OperationError::failed("X and y must have the same length"));
    }
    if xs.is_empty() {
      return Err(OperationError::failed("no samples"));
    }

    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;
    let sxx: f64 = xs.iter().map(|x| (x - mean_x).powi(2)).sum();
    let sxy: f64 = xs
      .iter()
      .zip(&ys)
      .map(|(x, y)| (x - mean_x) * (y - mean_y))
      .sum();
    if sxx == 0.0 {
      return Err(OperationError::failed("vertical line: every x is the same"));
    }

    let slope = sxy / sxx;
    Ok(Value::List(vec![
      Value::Float(slope),
      Value::Float(mean_y - slope * mean_x),
    ]))
  }
}

impl OperationProvider for Calculation {
  fn name(&self) -> &str {
    "calculation"
  }

  fn operations(&self) -> Vec<OperationDescriptor> {
    GroupBuilder::new("calculation", Calculation::default)
      .method(
        "point_to_point",
        ParamSpec::list(&["point1", "point2"]),
        Self::point_to_point,
      )
      .method(
        "midpoint",
        ParamSpec::list(&["point1", "point2"]),
        Self::midpoint,
      )
      .method(
        "find_slope_and_intercept",
        ParamSpec::list(&["X", "y"]),
        Self::find_slope_and_intercept,
      )
      .build()
  }
}
