//! End-to-end runs of the engine against the built-in and test operations.

use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use flowgraph_config::FlowRequest;
use flowgraph_engine::{
  ChannelNotifier, EngineConfig, EngineError, ExecutionEvent, FlowEngine, StreamMessage,
};
use flowgraph_operations::default_registry;
use flowgraph_registry::{
  Binding, GroupBuilder, OperationDescriptor, OperationError, OperationRegistry, ParamSpec,
  Value,
};
use serde_json::{Value as Json, json};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

fn request(value: Json) -> FlowRequest {
  serde_json::from_value(value).unwrap()
}

async fn run_with(registry: OperationRegistry, config: EngineConfig, value: Json) -> Vec<Json> {
  let engine = FlowEngine::new(Arc::new(registry), config);
  engine
    .execute(request(value), CancellationToken::new())
    .collect()
    .await
    .into_iter()
    .map(|message| serde_json::to_value(message).unwrap())
    .collect()
}

async fn run(registry: OperationRegistry, value: Json) -> Vec<Json> {
  run_with(registry, EngineConfig::default(), value).await
}

fn completed() -> Json {
  json!({ "message": "All results processed" })
}

fn adder(operation: &str) -> Json {
  json!({
    "nodes": [
      { "id": "A", "type": "inputNode" },
      { "id": "B", "type": "inputNode" },
      { "id": "F", "type": "functionNode", "data": { "operation": operation } },
      { "id": "R", "type": "resultNode" }
    ],
    "edges": [
      { "source": "A", "target": "F" },
      { "source": "B", "target": "F" },
      { "source": "F", "target": "R" }
    ],
    "inputValues": { "A": 5, "B": 3 }
  })
}

/// Registry with extra operations used to observe engine behavior.
fn test_registry(calls: Arc<AtomicUsize>) -> OperationRegistry {
  let mut registry = default_registry();

  registry.register(OperationDescriptor::function(
    "double",
    ParamSpec::list(&["x"]),
    move |args| {
      calls.fetch_add(1, Ordering::SeqCst);
      Ok(Value::Int(args.int(0)? * 2))
    },
  ));
  registry.register(
    OperationDescriptor::function("negate", ParamSpec::list(&["x"]), |args| {
      Ok(Value::Int(-args.int(0)?))
    })
    .with_binding(Binding::Keyword),
  );
  registry.register(OperationDescriptor::function(
    "explode",
    ParamSpec::list(&["x"]),
    |_| -> Result<Value, OperationError> { panic!("boom") },
  ));
  registry.register(OperationDescriptor::function(
    "not_a_number",
    ParamSpec::list(&["x"]),
    |_| Ok(Value::List(vec![Value::Float(f64::NAN)])),
  ));
  registry.register(OperationDescriptor::function(
    "threshold",
    vec![
      ParamSpec::required("image"),
      ParamSpec::optional("lower_th", 120i64),
      ParamSpec::optional("upper_th", 255i64),
    ],
    |args| Ok(Value::List(vec![args.get(1).clone(), args.get(2).clone()])),
  ));

  #[derive(Default)]
  struct Ticker {
    ticks: i64,
  }
  for op in GroupBuilder::new("ticker", Ticker::default)
    .method("tick", ParamSpec::list(&["x"]), |t: &mut Ticker, _| {
      t.ticks += 1;
      Ok(Value::Int(t.ticks))
    })
    .build()
  {
    registry.register(op);
  }

  registry
}

fn registry() -> OperationRegistry {
  test_registry(Arc::new(AtomicUsize::new(0)))
}

#[tokio::test]
async fn test_add_streams_result_then_completion() {
  let messages = run(registry(), adder("add")).await;
  assert_eq!(
    messages,
    vec![json!({ "resultNode": "R", "value": "8" }), completed()]
  );
}

#[tokio::test]
async fn test_unknown_operation_yields_null_without_error() {
  let messages = run(registry(), adder("add_typo")).await;
  assert_eq!(
    messages,
    vec![
      json!({
        "resultNode": "R",
        "value": null,
        "reason": "unknown operation 'add_typo'"
      }),
      completed()
    ]
  );
}

#[tokio::test]
async fn test_shared_node_is_computed_once() {
  let calls = Arc::new(AtomicUsize::new(0));
  let messages = run(
    test_registry(calls.clone()),
    json!({
      "nodes": [
        { "id": "A", "type": "inputNode" },
        { "id": "F", "type": "functionNode", "data": { "operation": "double" } },
        { "id": "R1", "type": "resultNode" },
        { "id": "R2", "type": "resultNode" }
      ],
      "edges": [
        { "source": "A", "target": "F" },
        { "source": "F", "target": "R1" },
        { "source": "F", "target": "R2" }
      ],
      "inputValues": { "A": 4 }
    }),
  )
  .await;

  assert_eq!(
    messages,
    vec![
      json!({ "resultNode": "R1", "value": "8" }),
      json!({ "resultNode": "R2", "value": "8" }),
      completed()
    ]
  );
  assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unmatched_keyword_argument_is_unavailable() {
  let messages = run(
    registry(),
    json!({
      "nodes": [
        { "id": "A", "type": "inputNode" },
        { "id": "F", "type": "functionNode", "data": { "operation": "negate" } },
        { "id": "R", "type": "resultNode" }
      ],
      "edges": [{ "source": "A", "target": "F" }, { "source": "F", "target": "R" }],
      "inputValues": { "A": 4 }
    }),
  )
  .await;

  assert_eq!(messages.len(), 2);
  assert_eq!(messages[0]["value"], Json::Null);
  assert_eq!(
    messages[0]["reason"],
    "operation failed: missing argument 'x'"
  );
  assert_eq!(messages[1], completed());
}

#[tokio::test]
async fn test_self_loop_is_reported_as_cycle() {
  let messages = run(
    registry(),
    json!({
      "nodes": [
        { "id": "F", "type": "functionNode", "data": { "operation": "double" } },
        { "id": "R", "type": "resultNode" }
      ],
      "edges": [{ "source": "F", "target": "F" }, { "source": "F", "target": "R" }]
    }),
  )
  .await;

  assert_eq!(
    messages,
    vec![
      json!({ "resultNode": "R", "value": null, "reason": "cyclic dependency" }),
      completed()
    ]
  );
}

#[tokio::test]
async fn test_runs_are_deterministic() {
  let flow = json!({
    "nodes": [
      { "id": "A", "type": "inputNode" },
      { "id": "B", "type": "inputNode" },
      { "id": "S", "type": "functionNode", "data": { "operation": "add" } },
      { "id": "D", "type": "functionNode", "data": { "operation": "divide" } },
      { "id": "R1", "type": "resultNode" },
      { "id": "R2", "type": "resultNode" },
      { "id": "R3", "type": "resultNode" }
    ],
    "edges": [
      { "source": "D", "target": "R3" },
      { "source": "A", "target": "S" },
      { "source": "B", "target": "S" },
      { "source": "S", "target": "R1" },
      { "source": "S", "target": "D", "targetHandle": "a" },
      { "source": "B", "target": "D", "targetHandle": "b" },
      { "source": "A", "target": "R2" }
    ],
    "inputValues": { "A": 1.5, "B": 2 }
  });

  let first = run(registry(), flow.clone()).await;
  let second = run(registry(), flow).await;
  assert_eq!(first, second);
  assert_eq!(
    first,
    vec![
      json!({ "resultNode": "R3", "value": "1.75" }),
      json!({ "resultNode": "R1", "value": "3.5" }),
      json!({ "resultNode": "R2", "value": "1.5" }),
      completed()
    ]
  );
}

#[tokio::test]
async fn test_target_handles_bind_by_name() {
  let messages = run(
    registry(),
    json!({
      "nodes": [
        { "id": "A", "type": "inputNode" },
        { "id": "B", "type": "inputNode" },
        { "id": "F", "type": "functionNode", "data": { "operation": "sub" } },
        { "id": "R", "type": "resultNode" }
      ],
      "edges": [
        { "source": "A", "target": "F", "targetHandle": "b" },
        { "source": "B", "target": "F", "targetHandle": "a" },
        { "source": "F", "target": "R" }
      ],
      "inputValues": { "A": 10, "B": 3 }
    }),
  )
  .await;

  assert_eq!(messages[0], json!({ "resultNode": "R", "value": "-7" }));
}

#[tokio::test]
async fn test_failures_do_not_affect_sibling_branches() {
  let messages = run(
    registry(),
    json!({
      "nodes": [
        { "id": "A", "type": "inputNode" },
        { "id": "Z", "type": "inputNode" },
        { "id": "Bad", "type": "functionNode", "data": { "operation": "missing_op" } },
        { "id": "Div", "type": "functionNode", "data": { "operation": "divide" } },
        { "id": "Boom", "type": "functionNode", "data": { "operation": "explode" } },
        { "id": "Good", "type": "functionNode", "data": { "operation": "double" } },
        { "id": "R1", "type": "resultNode" },
        { "id": "R2", "type": "resultNode" },
        { "id": "R3", "type": "resultNode" },
        { "id": "R4", "type": "resultNode" }
      ],
      "edges": [
        { "source": "A", "target": "Bad" },
        { "source": "A", "target": "Div" },
        { "source": "Z", "target": "Div" },
        { "source": "A", "target": "Boom" },
        { "source": "A", "target": "Good" },
        { "source": "Bad", "target": "R1" },
        { "source": "Div", "target": "R2" },
        { "source": "Boom", "target": "R3" },
        { "source": "Good", "target": "R4" }
      ],
      "inputValues": { "A": 4, "Z": 0 }
    }),
  )
  .await;

  assert_eq!(messages.len(), 5);
  assert_eq!(messages[0]["reason"], "unknown operation 'missing_op'");
  assert_eq!(messages[1]["reason"], "operation failed: division by zero");
  assert_eq!(
    messages[2]["reason"],
    "operation failed: operation panicked: boom"
  );
  assert_eq!(messages[3], json!({ "resultNode": "R4", "value": "8" }));
  assert_eq!(messages[4], completed());
}

#[tokio::test]
async fn test_unavailable_values_cascade_as_null() {
  let messages = run(
    registry(),
    json!({
      "nodes": [
        { "id": "A", "type": "inputNode" },
        { "id": "F", "type": "functionNode", "data": { "operation": "add_typo" } },
        { "id": "G", "type": "functionNode", "data": { "operation": "double" } },
        { "id": "R", "type": "resultNode" }
      ],
      "edges": [
        { "source": "A", "target": "F" },
        { "source": "F", "target": "G" },
        { "source": "G", "target": "R" }
      ],
      "inputValues": { "A": 1 }
    }),
  )
  .await;

  assert_eq!(
    messages[0]["reason"],
    "operation failed: missing argument 'x'"
  );
}

#[tokio::test]
async fn test_exactly_one_terminal_message() {
  for flow in [adder("add"), adder("add_typo"), json!({})] {
    let messages = run(registry(), flow).await;
    let terminals = messages
      .iter()
      .filter(|m| m.get("message").is_some() || m.get("error").is_some())
      .count();
    assert_eq!(terminals, 1);
    assert!(messages.last().unwrap().get("resultNode").is_none());
  }
}

#[tokio::test]
async fn test_encode_failure_ends_stream_with_error() {
  let messages = run(
    registry(),
    json!({
      "nodes": [
        { "id": "A", "type": "inputNode" },
        { "id": "F", "type": "functionNode", "data": { "operation": "not_a_number" } },
        { "id": "R", "type": "resultNode" },
        { "id": "R2", "type": "resultNode" }
      ],
      "edges": [
        { "source": "A", "target": "R2" },
        { "source": "A", "target": "F" },
        { "source": "F", "target": "R" }
      ],
      "inputValues": { "A": 1 }
    }),
  )
  .await;

  assert_eq!(messages.len(), 2);
  assert_eq!(messages[0], json!({ "resultNode": "R2", "value": "1" }));
  let error = messages[1]["error"].as_str().unwrap();
  assert!(error.starts_with("failed to encode value for 'F'"));
}

#[tokio::test]
async fn test_group_instances_are_scoped_to_one_run() {
  let flow = json!({
    "nodes": [
      { "id": "A", "type": "inputNode" },
      { "id": "T1", "type": "functionNode", "data": { "operation": "tick" } },
      { "id": "T2", "type": "functionNode", "data": { "operation": "tick" } },
      { "id": "R1", "type": "resultNode" },
      { "id": "R2", "type": "resultNode" }
    ],
    "edges": [
      { "source": "A", "target": "T1" },
      { "source": "A", "target": "T2" },
      { "source": "T1", "target": "R1" },
      { "source": "T2", "target": "R2" }
    ],
    "inputValues": { "A": 0 }
  });

  let engine = FlowEngine::new(Arc::new(registry()), EngineConfig::default());
  for _ in 0..2 {
    let messages = engine
      .execute(request(flow.clone()), CancellationToken::new())
      .collect()
      .await;
    assert_eq!(
      messages[..2]
        .iter()
        .map(|m| serde_json::to_value(m).unwrap()["value"].clone())
        .collect::<Vec<_>>(),
      vec![json!("1"), json!("2")]
    );
  }
}

#[tokio::test]
async fn test_group_operations_from_default_registry() {
  let messages = run(
    registry(),
    json!({
      "nodes": [
        { "id": "A", "type": "inputNode" },
        { "id": "B", "type": "inputNode" },
        { "id": "F", "type": "functionNode", "data": { "operation": "Addition" } },
        { "id": "D", "type": "functionNode", "data": { "operation": "point_to_point" } },
        { "id": "R", "type": "resultNode" },
        { "id": "R2", "type": "resultNode" }
      ],
      "edges": [
        { "source": "A", "target": "F", "targetHandle": "variable2" },
        { "source": "B", "target": "F", "targetHandle": "variable1" },
        { "source": "F", "target": "R" },
        { "source": "P", "target": "D" },
        { "source": "D", "target": "R2" }
      ],
      "inputValues": { "A": 2, "B": 0.5 }
    }),
  )
  .await;

  assert_eq!(messages[0], json!({ "resultNode": "R", "value": "2.5" }));
  // `P` does not exist, so the distance has nothing to work with.
  assert_eq!(
    messages[1]["reason"],
    "operation failed: missing argument 'point1'"
  );
}

#[tokio::test]
async fn test_media_is_decoded_before_use() {
  let image = "data:image/png;base64,AQID";
  let messages = run(
    registry(),
    json!({
      "nodes": [
        { "id": "I", "type": "imageInputNode" },
        { "id": "T", "type": "functionNode", "data": { "operation": "media_type" } },
        { "id": "S", "type": "functionNode", "data": { "operation": "media_size" } },
        { "id": "R1", "type": "resultNode" },
        { "id": "R2", "type": "resultNode" },
        { "id": "R3", "type": "resultNode" }
      ],
      "edges": [
        { "source": "I", "target": "T" },
        { "source": "I", "target": "S" },
        { "source": "T", "target": "R1" },
        { "source": "S", "target": "R2" },
        { "source": "I", "target": "R3" }
      ],
      "inputValues": { "I": image }
    }),
  )
  .await;

  assert_eq!(
    messages,
    vec![
      json!({ "resultNode": "R1", "value": "image/png" }),
      json!({ "resultNode": "R2", "value": "3" }),
      json!({ "resultNode": "R3", "value": image }),
      completed()
    ]
  );
}

#[tokio::test]
async fn test_structural_gaps_are_tolerated() {
  let messages = run(
    registry(),
    json!({
      "nodes": [
        { "id": "Lonely", "type": "functionNode", "data": { "operation": "double" } },
        { "id": "Empty", "type": "inputNode" },
        { "id": "R1", "type": "resultNode" },
        { "id": "R2", "type": "resultNode" },
        { "id": "R3", "type": "resultNode" }
      ],
      "edges": [
        { "source": "Lonely", "target": "R1" },
        { "source": "Ghost", "target": "R2" },
        { "source": "Empty", "target": "R3" },
        { "source": "R3", "target": "Nowhere" }
      ]
    }),
  )
  .await;

  assert_eq!(
    messages,
    vec![
      json!({ "resultNode": "R1", "value": null, "reason": "missing inputs" }),
      json!({ "resultNode": "R2", "value": null, "reason": "unknown node" }),
      json!({ "resultNode": "R3", "value": null, "reason": "no input value" }),
      completed()
    ]
  );
}

#[tokio::test]
async fn test_static_params_and_defaults() {
  let messages = run(
    registry(),
    json!({
      "nodes": [
        { "id": "I", "type": "inputNode" },
        {
          "id": "F",
          "type": "functionNode",
          "data": { "operation": "threshold", "lower_th": 100 }
        },
        { "id": "R", "type": "resultNode" }
      ],
      "edges": [
        { "source": "I", "target": "F", "targetHandle": "image" },
        { "source": "F", "target": "R" }
      ],
      "inputValues": { "I": "pixels" }
    }),
  )
  .await;

  assert_eq!(messages[0], json!({ "resultNode": "R", "value": "[100,255]" }));
}

#[tokio::test]
async fn test_legacy_fields_and_custom_sink_kinds() {
  let messages = run(
    registry(),
    json!({
      "nodes": [
        { "id": "A", "type": "inputNode", "value": 2 },
        { "id": "B", "type": "inputNode", "value": 100 },
        { "id": "F", "type": "functionNode", "data": { "func": "multiply" } },
        { "id": "ROI", "type": "roiNode" }
      ],
      "edges": [
        { "source": "A", "target": "F" },
        { "source": "B", "target": "F" },
        { "source": "F", "target": "ROI" }
      ],
      "inputValues": { "B": 21 }
    }),
  )
  .await;

  assert_eq!(
    messages,
    vec![json!({ "resultNode": "ROI", "value": "42" }), completed()]
  );
}

#[tokio::test]
async fn test_cancelled_run_ends_with_error() {
  let engine = FlowEngine::new(Arc::new(registry()), EngineConfig::default());
  let cancel = CancellationToken::new();
  cancel.cancel();

  let messages = engine.execute(request(adder("add")), cancel).collect().await;
  assert_eq!(messages, vec![StreamMessage::error("execution cancelled")]);
}

fn two_sinks() -> Json {
  json!({
    "nodes": [
      { "id": "A", "type": "inputNode" },
      { "id": "R1", "type": "resultNode" },
      { "id": "R2", "type": "resultNode" }
    ],
    "edges": [{ "source": "A", "target": "R1" }, { "source": "A", "target": "R2" }],
    "inputValues": { "A": 1 }
  })
}

#[tokio::test]
async fn test_cancel_between_sink_edges() {
  let config = EngineConfig {
    pass_delay_ms: 200,
    ..Default::default()
  };
  let engine = FlowEngine::new(Arc::new(registry()), config);
  let cancel = CancellationToken::new();
  let mut messages = engine.execute(request(two_sinks()), cancel.clone()).spawn();

  let first = messages.recv().await.unwrap();
  assert_eq!(serde_json::to_value(&first).unwrap(), json!({ "resultNode": "R1", "value": "1" }));
  cancel.cancel();

  assert_eq!(
    messages.recv().await,
    Some(StreamMessage::error("execution cancelled"))
  );
  assert_eq!(messages.recv().await, None);
}

#[tokio::test]
async fn test_dropped_receiver_stops_the_run() {
  let config = EngineConfig {
    pass_delay_ms: 50,
    ..Default::default()
  };
  let engine = FlowEngine::new(Arc::new(registry()), config);
  let execution = engine.execute(request(two_sinks()), CancellationToken::new());
  let (sender, mut receiver) = mpsc::channel(4);
  let handle = tokio::spawn(execution.run(sender));

  assert!(matches!(
    receiver.recv().await,
    Some(StreamMessage::Result { ref result_node, .. }) if result_node == "R1"
  ));
  drop(receiver);

  let result = handle.await.unwrap();
  assert!(matches!(result, Err(EngineError::Cancelled)));
}

#[tokio::test]
async fn test_deep_chain_completes() {
  const DEPTH: usize = 10_000;
  let mut nodes = vec![json!({ "id": "A", "type": "inputNode" })];
  let mut edges = Vec::new();
  let mut previous = "A".to_string();
  for i in 0..DEPTH {
    let id = format!("abs{i}");
    nodes.push(json!({
      "id": id,
      "type": "functionNode",
      "data": { "operation": "absolute_value" }
    }));
    edges.push(json!({ "source": previous, "target": id }));
    previous = id;
  }
  nodes.push(json!({ "id": "R", "type": "resultNode" }));
  edges.push(json!({ "source": previous, "target": "R" }));

  let messages = run(
    registry(),
    json!({ "nodes": nodes, "edges": edges, "inputValues": { "A": -5 } }),
  )
  .await;
  assert_eq!(
    messages,
    vec![json!({ "resultNode": "R", "value": "5" }), completed()]
  );
}

#[tokio::test]
async fn test_notifier_sees_run_lifecycle() {
  let (sender, mut receiver) = mpsc::unbounded_channel();
  let engine = FlowEngine::new(Arc::new(registry()), EngineConfig::default())
    .with_notifier(Arc::new(ChannelNotifier::new(sender)));

  engine
    .execute(request(adder("add")), CancellationToken::new())
    .collect()
    .await;

  let mut events = Vec::new();
  while let Ok(event) = receiver.try_recv() {
    events.push(event);
  }

  assert!(matches!(
    events.first(),
    Some(ExecutionEvent::FlowStarted { sink_edges: 1, .. })
  ));
  assert!(events.iter().any(|e| matches!(
    e,
    ExecutionEvent::NodeResolved { node_id, operation, .. } if node_id == "F" && operation == "add"
  )));
  assert!(matches!(
    events.last(),
    Some(ExecutionEvent::FlowCompleted { results: 1, .. })
  ));
}

#[tokio::test]
async fn test_config_file_delay() {
  let mut file = tempfile::NamedTempFile::new().unwrap();
  write!(file, r#"{{ "pass_delay_ms": 1, "channel_capacity": 1 }}"#).unwrap();
  let config = EngineConfig::from_file(file.path()).unwrap();

  let messages = run_with(registry(), config, adder("add")).await;
  assert_eq!(
    messages,
    vec![json!({ "resultNode": "R", "value": "8" }), completed()]
  );
}
