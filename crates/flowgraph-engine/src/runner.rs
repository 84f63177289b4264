//! Flow runner with channel-based requests.
//!
//! The `FlowRunner` owns an mpsc channel of [`FlowRequest`]s and executes them
//! one at a time, streaming every run's messages into a shared output channel.

use std::sync::Arc;

use flowgraph_config::FlowRequest;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::engine::{FlowEngine, RunSummary};
use crate::error::EngineError;
use crate::message::StreamMessage;

/// Executes requests as they arrive.
///
/// # Usage
///
/// ```ignore
/// let (output, mut messages) = mpsc::channel(100);
/// let runner = FlowRunner::new(engine, output);
///
/// // Hand out senders to whatever produces requests.
/// let requests = runner.sender();
///
/// let cancel = CancellationToken::new();
/// runner.start(cancel).await?;
/// ```
pub struct FlowRunner {
  sender: mpsc::Sender<FlowRequest>,
  receiver: mpsc::Receiver<FlowRequest>,
  engine: Arc<FlowEngine>,
  output: mpsc::Sender<StreamMessage>,
}

impl FlowRunner {
  /// Create a runner whose request buffer matches the engine's channel capacity.
  pub fn new(engine: Arc<FlowEngine>, output: mpsc::Sender<StreamMessage>) -> Self {
    let buffer_size = engine.config().capacity();
    Self::with_buffer_size(engine, output, buffer_size)
  }

  pub fn with_buffer_size(
    engine: Arc<FlowEngine>,
    output: mpsc::Sender<StreamMessage>,
    buffer_size: usize,
  ) -> Self {
    let (sender, receiver) = mpsc::channel(buffer_size.max(1));
    Self {
      sender,
      receiver,
      engine,
      output,
    }
  }

  /// A handle for submitting requests.
  pub fn sender(&self) -> mpsc::Sender<FlowRequest> {
    self.sender.clone()
  }

  /// Queue a request.
  pub async fn run(&self, request: FlowRequest) -> Result<(), EngineError> {
    self
      .sender
      .send(request)
      .await
      .map_err(|_| EngineError::ChannelClosed)
  }

  /// Start the execution loop.
  ///
  /// Runs until `cancel` fires, every request sender is dropped, or the output
  /// receiver goes away. Each run gets a child of `cancel`.
  pub async fn start(self, cancel: CancellationToken) -> Result<(), EngineError> {
    let FlowRunner {
      sender,
      mut receiver,
      engine,
      output,
    } = self;
    // Only handles given out by `sender()` keep the loop alive from here on.
    drop(sender);

    info!(
      operations = engine.registry().len(),
      "starting flow runner"
    );

    loop {
      tokio::select! {
        _ = cancel.cancelled() => {
          info!("flow runner cancelled");
          break;
        }
        request = receiver.recv() => {
          let Some(request) = request else {
            info!("flow runner channel closed");
            break;
          };

          let execution = engine.execute(request, cancel.child_token());
          let execution_id = execution.execution_id().to_string();
          match execution.run(output.clone()).await {
            Ok(summary) => {
              info!(
                execution_id = %summary.execution_id,
                results = summary.results,
                "flow execution completed"
              );
            }
            Err(EngineError::Cancelled) => {
              info!(execution_id = %execution_id, "flow execution cancelled");
            }
            Err(e) => {
              error!(execution_id = %execution_id, error = %e, "flow execution failed");
            }
          }

          if output.is_closed() {
            info!("flow runner output closed");
            break;
          }
        }
      }
    }

    Ok(())
  }

  /// Execute one request directly, bypassing the request channel.
  pub async fn execute_once(
    &self,
    request: FlowRequest,
    cancel: CancellationToken,
  ) -> Result<RunSummary, EngineError> {
    self
      .engine
      .execute(request, cancel)
      .run(self.output.clone())
      .await
  }

  pub fn engine(&self) -> &FlowEngine {
    &self.engine
  }
}
