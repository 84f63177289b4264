//! Flow execution and result streaming.

use std::collections::VecDeque;
use std::sync::Arc;

use flowgraph_registry::OperationRegistry;
use flowgraph_workflow::Flow;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::events::{ExecutionEvent, ExecutionNotifier, NoopNotifier};
use crate::message::StreamMessage;
use crate::resolver::Resolver;
use crate::store::RunContext;

/// Executes flows against a shared, read-only operation registry.
///
/// # Example
///
/// ```ignore
/// let engine = FlowEngine::new(Arc::new(default_registry()), EngineConfig::default());
/// let mut messages = engine.execute(request, CancellationToken::new()).spawn();
/// while let Some(message) = messages.recv().await {
///   println!("{}", message.to_line()?);
/// }
/// ```
pub struct FlowEngine {
  registry: Arc<OperationRegistry>,
  config: EngineConfig,
  notifier: Arc<dyn ExecutionNotifier>,
}

impl FlowEngine {
  pub fn new(registry: Arc<OperationRegistry>, config: EngineConfig) -> Self {
    Self {
      registry,
      config,
      notifier: Arc::new(NoopNotifier),
    }
  }

  /// Send execution events to `notifier`.
  pub fn with_notifier(mut self, notifier: Arc<dyn ExecutionNotifier>) -> Self {
    self.notifier = notifier;
    self
  }

  pub fn registry(&self) -> &OperationRegistry {
    &self.registry
  }

  pub fn config(&self) -> &EngineConfig {
    &self.config
  }

  /// Prepare one run of `flow`. Nothing happens until the returned execution
  /// is run or spawned.
  pub fn execute(&self, flow: impl Into<Flow>, cancel: CancellationToken) -> FlowExecution {
    FlowExecution {
      execution_id: uuid::Uuid::new_v4().to_string(),
      flow: flow.into(),
      registry: self.registry.clone(),
      notifier: self.notifier.clone(),
      config: self.config.clone(),
      cancel,
    }
  }
}

/// Counts for a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
  pub execution_id: String,
  /// Result messages sent, one per sink edge.
  pub results: usize,
  /// How many of those carried an unavailable value.
  pub unavailable: usize,
}

/// A single run of a flow with its own [`RunContext`].
pub struct FlowExecution {
  execution_id: String,
  flow: Flow,
  registry: Arc<OperationRegistry>,
  notifier: Arc<dyn ExecutionNotifier>,
  config: EngineConfig,
  cancel: CancellationToken,
}

impl FlowExecution {
  pub fn execution_id(&self) -> &str {
    &self.execution_id
  }

  pub fn flow(&self) -> &Flow {
    &self.flow
  }

  /// Stream the run into `sender`.
  ///
  /// One result message is sent per sink edge, in edge-list order, followed by
  /// exactly one terminal message. The terminal message is skipped only when
  /// the receiver is gone.
  #[instrument(
    name = "flow_execute",
    skip(self, sender),
    fields(execution_id = %self.execution_id)
  )]
  pub async fn run(self, sender: mpsc::Sender<StreamMessage>) -> Result<RunSummary, EngineError> {
    info!(
      execution_id = %self.execution_id,
      nodes = self.flow.node_count(),
      edges = self.flow.edges().len(),
      sink_edges = self.flow.sink_edges().len(),
      "flow_started"
    );
    self.notifier.notify(ExecutionEvent::FlowStarted {
      execution_id: self.execution_id.clone(),
      sink_edges: self.flow.sink_edges().len(),
    });
    for diagnostic in self.flow.diagnostics() {
      debug!(
        execution_id = %self.execution_id,
        diagnostic = %diagnostic,
        "flow_diagnostic"
      );
    }

    let mut ctx = RunContext::new();
    let result = self.stream(&mut ctx, &sender).await;

    match &result {
      Ok(summary) => {
        info!(
          execution_id = %self.execution_id,
          results = summary.results,
          unavailable = summary.unavailable,
          group_instances = ctx.instance_count(),
          "flow_completed"
        );
        self.notifier.notify(ExecutionEvent::FlowCompleted {
          execution_id: self.execution_id.clone(),
          results: summary.results,
        });
      }
      Err(e) => {
        match e {
          EngineError::Cancelled => warn!(execution_id = %self.execution_id, "flow_cancelled"),
          _ => error!(execution_id = %self.execution_id, error = %e, "flow_failed"),
        }
        self.notifier.notify(ExecutionEvent::FlowFailed {
          execution_id: self.execution_id.clone(),
          error: e.to_string(),
        });
        if !sender.is_closed() {
          let _ = sender.send(StreamMessage::error(e.to_string())).await;
        }
      }
    }

    result
  }

  async fn stream(
    &self,
    ctx: &mut RunContext,
    sender: &mpsc::Sender<StreamMessage>,
  ) -> Result<RunSummary, EngineError> {
    let resolver = Resolver::new(
      &self.flow,
      &self.registry,
      self.notifier.as_ref(),
      &self.execution_id,
    );
    let mut pending: VecDeque<usize> = self.flow.sink_edges().iter().copied().collect();
    let mut summary = RunSummary {
      execution_id: self.execution_id.clone(),
      ..Default::default()
    };

    while let Some(position) = pending.pop_front() {
      if self.cancel.is_cancelled() || sender.is_closed() {
        return Err(EngineError::Cancelled);
      }
      let Some(edge) = self.flow.edge(position) else {
        continue;
      };

      let outcome = resolver.outcome(ctx, &edge.source);
      let message =
        StreamMessage::result(&edge.target, &outcome).map_err(|source| EngineError::Encode {
          node_id: edge.source.clone(),
          source,
        })?;
      self.send(sender, message).await?;

      summary.results += 1;
      if !outcome.is_ready() {
        summary.unavailable += 1;
      }
      debug!(
        execution_id = %self.execution_id,
        source = %edge.source,
        result_node = %edge.target,
        "sink_emitted"
      );
      self.notifier.notify(ExecutionEvent::SinkEmitted {
        execution_id: self.execution_id.clone(),
        result_node: edge.target.clone(),
      });

      self.pause().await;
    }

    self.send(sender, StreamMessage::completed()).await?;
    Ok(summary)
  }

  async fn send(
    &self,
    sender: &mpsc::Sender<StreamMessage>,
    message: StreamMessage,
  ) -> Result<(), EngineError> {
    tokio::select! {
      biased;
      _ = self.cancel.cancelled() => Err(EngineError::Cancelled),
      sent = sender.send(message) => sent.map_err(|_| EngineError::Cancelled),
    }
  }

  /// Let the host interleave other work between sink edges.
  async fn pause(&self) {
    match self.config.pass_delay() {
      Some(delay) => tokio::time::sleep(delay).await,
      None => tokio::task::yield_now().await,
    }
  }

  /// Run on a new task and return the message stream.
  pub fn spawn(self) -> mpsc::Receiver<StreamMessage> {
    let (sender, receiver) = mpsc::channel(self.config.capacity());
    tokio::spawn(async move {
      // Outcome is already logged and streamed.
      let _ = self.run(sender).await;
    });
    receiver
  }

  /// Run to completion and gather every message.
  pub async fn collect(self) -> Vec<StreamMessage> {
    let mut receiver = self.spawn();
    let mut messages = Vec::new();
    while let Some(message) = receiver.recv().await {
      messages.push(message);
    }
    messages
  }
}
