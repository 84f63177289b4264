//! Dependency resolution.
//!
//! Resolution is demand driven: a function node is computed only when a sink
//! (or another function node) asks for it, after its predecessors. Every
//! function node is computed at most once per run.
//!
//! Nodes waiting on their inputs are kept on an explicit stack, so chain
//! length is bounded by memory rather than by the thread's stack.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use flowgraph_registry::{ArgumentBag, OperationError, OperationRegistry};
use flowgraph_value::{Value, decode_value};
use flowgraph_workflow::{EdgeDef, Flow, NodeDef};
use tracing::{debug, instrument, warn};

use crate::events::{ExecutionEvent, ExecutionNotifier};
use crate::store::{NodeOutcome, RunContext, Unavailable};

/// Resolution re-entered a node that is still on the stack.
#[derive(Debug)]
struct Cycle;

/// A function node gathering its inputs.
struct Frame<'a> {
  node: &'a NodeDef,
  edges: Vec<&'a EdgeDef>,
  next: usize,
  bag: ArgumentBag,
}

/// What an edge source yields to the node consuming it.
enum Step<'a> {
  Ready(NodeOutcome),
  Enter(Frame<'a>),
  Cycle,
}

/// Computes node values for one run.
pub struct Resolver<'a> {
  flow: &'a Flow,
  registry: &'a OperationRegistry,
  notifier: &'a dyn ExecutionNotifier,
  execution_id: &'a str,
}

impl<'a> Resolver<'a> {
  pub fn new(
    flow: &'a Flow,
    registry: &'a OperationRegistry,
    notifier: &'a dyn ExecutionNotifier,
    execution_id: &'a str,
  ) -> Self {
    Self {
      flow,
      registry,
      notifier,
      execution_id,
    }
  }

  /// Compute `node_id` unless it was already processed in this run.
  ///
  /// Only function nodes are computed; any other id is ignored. Failures are
  /// recorded in `ctx` and never returned.
  #[instrument(
    name = "resolve_node",
    skip(self, ctx),
    fields(execution_id = %self.execution_id)
  )]
  pub fn resolve(&self, ctx: &mut RunContext, node_id: &str) {
    // Every node in the resolving set sits on this call's frame stack, so a
    // cycle is always unwound inside it.
    let _ = self.visit(ctx, node_id);
  }

  /// What a consumer of `node_id` receives, resolving it first when needed.
  pub fn outcome(&self, ctx: &mut RunContext, node_id: &str) -> NodeOutcome {
    let Some(node) = self.flow.node(node_id) else {
      return Unavailable::UnknownNode.into();
    };

    if node.kind.is_function() {
      if self.visit(ctx, node_id).is_err() {
        return Unavailable::CyclicDependency.into();
      }
      return stored(ctx, node_id);
    }

    self.settled(ctx, node)
  }

  /// The outcome of a node that is never computed here.
  fn settled(&self, ctx: &mut RunContext, node: &NodeDef) -> NodeOutcome {
    if node.kind.is_input() {
      return self.input(ctx, &node.id);
    }
    ctx
      .get(&node.id)
      .cloned()
      .unwrap_or(Unavailable::NotComputed.into())
  }

  /// The value of an input node, materialized into the store on first use.
  fn input(&self, ctx: &mut RunContext, node_id: &str) -> NodeOutcome {
    if let Some(outcome) = ctx.get(node_id) {
      return outcome.clone();
    }

    let outcome = match self.flow.input_value(node_id) {
      Some(literal) => NodeOutcome::Ready(Value::from_json(literal.clone())),
      None => {
        debug!(
          execution_id = %self.execution_id,
          node_id = %node_id,
          "input_missing"
        );
        Unavailable::NoInputValue.into()
      }
    };
    ctx.set(node_id, outcome.clone());
    outcome
  }

  /// Look at an edge source. Function nodes not yet processed are entered and
  /// returned as a new frame.
  fn step(&self, ctx: &mut RunContext, node_id: &str) -> Step<'a> {
    let Some(node) = self.flow.node(node_id) else {
      return Step::Ready(Unavailable::UnknownNode.into());
    };
    if !node.kind.is_function() {
      return Step::Ready(self.settled(ctx, node));
    }
    if ctx.is_processed(node_id) {
      return Step::Ready(stored(ctx, node_id));
    }
    if !ctx.enter(node_id) {
      return Step::Cycle;
    }
    Step::Enter(self.frame(node))
  }

  fn frame(&self, node: &'a NodeDef) -> Frame<'a> {
    Frame {
      node,
      edges: self.flow.incoming(&node.id).collect(),
      next: 0,
      bag: ArgumentBag::new(),
    }
  }

  fn visit(&self, ctx: &mut RunContext, node_id: &str) -> Result<(), Cycle> {
    if ctx.is_processed(node_id) {
      return Ok(());
    }
    let Some(node) = self.flow.node(node_id) else {
      return Ok(());
    };
    if !node.kind.is_function() {
      return Ok(());
    }
    if !ctx.enter(node_id) {
      return Err(Cycle);
    }

    let mut stack = vec![self.frame(node)];
    while let Some(frame) = stack.last() {
      let Some(&edge) = frame.edges.get(frame.next) else {
        let node = frame.node;
        if let Some(frame) = stack.pop() {
          self.complete(ctx, frame);
        }
        let outcome = stored(ctx, &node.id);
        self.accept(ctx, &mut stack, outcome);
        continue;
      };

      match self.step(ctx, &edge.source) {
        Step::Ready(outcome) => self.accept(ctx, &mut stack, outcome),
        Step::Enter(frame) => stack.push(frame),
        Step::Cycle => {
          // Every frame up to the one that entered the source is on the cycle.
          loop {
            let Some(frame) = stack.pop() else {
              return Err(Cycle);
            };
            self.record(ctx, &frame.node.id, Unavailable::CyclicDependency.into());
            if frame.node.id == edge.source {
              break;
            }
          }
          let outcome = stored(ctx, &edge.source);
          self.accept(ctx, &mut stack, outcome);
        }
      }
    }
    Ok(())
  }

  /// Hand `outcome` to the frame on top of the stack as the value of its
  /// current edge.
  fn accept(&self, ctx: &mut RunContext, stack: &mut Vec<Frame<'a>>, mut outcome: NodeOutcome) {
    while let Some(frame) = stack.last_mut() {
      let Some(&edge) = frame.edges.get(frame.next) else {
        return;
      };
      match decode_value(outcome.value()) {
        Ok(value) => {
          frame.bag.insert(argument_key(edge), value);
          frame.next += 1;
          return;
        }
        Err(e) => {
          let node = frame.node;
          stack.pop();
          let reason = Unavailable::InvalidMedia {
            message: e.to_string(),
          };
          self.record(ctx, &node.id, reason.into());
          outcome = stored(ctx, &node.id);
        }
      }
    }
  }

  /// Run a node whose inputs are all gathered.
  fn complete(&self, ctx: &mut RunContext, frame: Frame<'a>) {
    let node_id = frame.node.id.as_str();
    if frame.bag.is_empty() {
      // Left unprocessed; consumers see missing inputs.
      ctx.leave(node_id);
      debug!(
        execution_id = %self.execution_id,
        node_id = %node_id,
        "node_skipped"
      );
      return;
    }

    let outcome = self.invoke(ctx, frame.node, &frame.bag);
    self.record(ctx, node_id, outcome);
  }

  fn invoke(&self, ctx: &mut RunContext, node: &NodeDef, bag: &ArgumentBag) -> NodeOutcome {
    let name = node.data.operation_name().unwrap_or_default();
    let Some(op) = self.registry.resolve(name) else {
      return Unavailable::UnknownOperation {
        operation: name.to_string(),
      }
      .into();
    };

    let args = op.bind(bag, &node.data.params);
    let instance = match op.group() {
      Some(group) => ctx.instance(group, || op.new_instance()),
      None => None,
    };

    let result = panic::catch_unwind(AssertUnwindSafe(|| op.invoke(instance, &args)))
      .unwrap_or_else(|payload| Err(OperationError::Panicked(panic_message(payload))));

    match result {
      Ok(value) => {
        debug!(
          execution_id = %self.execution_id,
          node_id = %node.id,
          operation = %name,
          value_type = value.type_name(),
          "node_resolved"
        );
        self.notifier.notify(ExecutionEvent::NodeResolved {
          execution_id: self.execution_id.to_string(),
          node_id: node.id.clone(),
          operation: name.to_string(),
        });
        NodeOutcome::Ready(value)
      }
      Err(e) => {
        if let (OperationError::Panicked(_), Some(group)) = (&e, op.group()) {
          // The instance may be half updated.
          ctx.discard_instance(group);
          warn!(
            execution_id = %self.execution_id,
            group = %group,
            "group_instance_discarded"
          );
        }
        Unavailable::OperationFailed {
          message: e.to_string(),
        }
        .into()
      }
    }
  }

  fn record(&self, ctx: &mut RunContext, node_id: &str, outcome: NodeOutcome) {
    if let Some(reason) = outcome.reason() {
      warn!(
        execution_id = %self.execution_id,
        node_id = %node_id,
        reason = %reason,
        "node_unavailable"
      );
      self.notifier.notify(ExecutionEvent::NodeUnavailable {
        execution_id: self.execution_id.to_string(),
        node_id: node_id.to_string(),
        reason: reason.to_string(),
      });
    }
    ctx.finish(node_id, outcome);
  }
}

/// A function node's recorded outcome. Nodes left unprocessed had no inputs.
fn stored(ctx: &RunContext, node_id: &str) -> NodeOutcome {
  ctx
    .get(node_id)
    .cloned()
    .unwrap_or(Unavailable::MissingInputs.into())
}

/// Bag key for an edge: its target handle, else the source node id.
fn argument_key(edge: &EdgeDef) -> String {
  edge.handle().unwrap_or(&edge.source).to_string()
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
  if let Some(s) = payload.downcast_ref::<&str>() {
    s.to_string()
  } else if let Some(s) = payload.downcast_ref::<String>() {
    s.clone()
  } else {
    "unknown panic".to_string()
  }
}
