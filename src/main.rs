use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use flowgraph_config::FlowRequest;
use flowgraph_engine::{EngineConfig, FlowEngine, FlowRunner, StreamMessage};
use flowgraph_operations::default_registry;
use flowgraph_value::{Value, decode_value, encode};

/// Flowgraph - run node graphs and stream the values reaching their sinks
#[derive(Parser)]
#[command(name = "flowgraph")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to an engine config file (JSON)
  #[arg(long, global = true, env = "FLOWGRAPH_CONFIG")]
  config: Option<PathBuf>,

  /// Pause between sink edges in milliseconds, overriding the config file
  #[arg(long, global = true, env = "FLOWGRAPH_PASS_DELAY_MS")]
  pass_delay_ms: Option<u64>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Run one flow request and print its messages as NDJSON
  Run {
    /// Path to the request file, or `-` for stdin
    request_file: PathBuf,
  },

  /// Read newline-delimited requests from stdin and run each in turn
  Serve,

  /// List the registered operations as JSON
  Operations,

  /// Call one operation with positional inputs and print its result
  Call {
    /// Operation name
    operation: String,

    /// Inputs as a JSON array, e.g. `[5, 3]`
    #[arg(default_value = "[]")]
    inputs: String,
  },
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("flowgraph=info,warn")),
    )
    .with_target(false)
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();
  let config = load_config(cli.config.as_deref(), cli.pass_delay_ms)?;

  match cli.command {
    Some(Commands::Run { request_file }) => {
      let rt = tokio::runtime::Runtime::new()?;
      rt.block_on(run_flow(create_engine(config), request_file))?;
    }
    Some(Commands::Serve) => {
      let rt = tokio::runtime::Runtime::new()?;
      let result = rt.block_on(serve(create_engine(config)));
      // A pending stdin read would otherwise hold up shutdown.
      rt.shutdown_background();
      result?;
    }
    Some(Commands::Operations) => {
      let registry = default_registry();
      println!("{}", serde_json::to_string_pretty(&registry.catalog())?);
    }
    Some(Commands::Call { operation, inputs }) => {
      call_operation(&operation, &inputs)?;
    }
    None => {
      println!("flowgraph - use --help to see available commands");
    }
  }

  Ok(())
}

fn load_config(path: Option<&Path>, pass_delay_ms: Option<u64>) -> Result<EngineConfig> {
  let mut config = match path {
    Some(path) => EngineConfig::from_file(path)
      .with_context(|| format!("failed to load config: {}", path.display()))?,
    None => EngineConfig::default(),
  };
  if let Some(ms) = pass_delay_ms {
    config.pass_delay_ms = ms;
  }
  Ok(config)
}

fn create_engine(config: EngineConfig) -> Arc<FlowEngine> {
  let registry = default_registry();
  for (name, provider) in registry.shadowed() {
    warn!(operation = %name, provider = %provider, "operation shadowed");
  }
  info!(operations = registry.len(), "registry loaded");
  Arc::new(FlowEngine::new(Arc::new(registry), config))
}

/// Cancel `cancel` on Ctrl-C.
fn cancel_on_interrupt(cancel: CancellationToken) {
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      warn!("interrupted");
      cancel.cancel();
    }
  });
}

async fn write_message(stdout: &mut tokio::io::Stdout, message: &StreamMessage) -> Result<()> {
  let line = message.to_line().context("failed to serialize message")?;
  stdout.write_all(line.as_bytes()).await?;
  stdout.write_all(b"\n").await?;
  stdout.flush().await?;
  Ok(())
}

fn call_operation(operation: &str, inputs: &str) -> Result<()> {
  let inputs: Vec<serde_json::Value> =
    serde_json::from_str(inputs).context("inputs must be a JSON array")?;
  let inputs = inputs
    .into_iter()
    .map(|input| decode_value(Value::from_json(input)))
    .collect::<Result<Vec<_>, _>>()
    .context("failed to decode inputs")?;

  let registry = default_registry();
  let value = registry.call(operation, inputs)?;
  let result = serde_json::json!({ "result": encode(&value)? });
  println!("{result}");
  Ok(())
}

async fn run_flow(engine: Arc<FlowEngine>, request_file: PathBuf) -> Result<()> {
  let content = if request_file.as_os_str() == "-" {
    let mut content = String::new();
    tokio::io::stdin()
      .read_to_string(&mut content)
      .await
      .context("failed to read request from stdin")?;
    content
  } else {
    tokio::fs::read_to_string(&request_file)
      .await
      .with_context(|| format!("failed to read request file: {}", request_file.display()))?
  };

  let request: FlowRequest = serde_json::from_str(&content)
    .with_context(|| format!("failed to parse request: {}", request_file.display()))?;
  info!(
    nodes = request.nodes.len(),
    edges = request.edges.len(),
    "loaded flow request"
  );

  let cancel = CancellationToken::new();
  cancel_on_interrupt(cancel.clone());

  let mut messages = engine.execute(request, cancel).spawn();
  let mut stdout = tokio::io::stdout();
  let mut failure = None;
  while let Some(message) = messages.recv().await {
    write_message(&mut stdout, &message).await?;
    if let StreamMessage::Error { error } = &message {
      failure = Some(error.clone());
    }
  }

  if let Some(error) = failure {
    anyhow::bail!("flow execution failed: {error}");
  }
  Ok(())
}

async fn serve(engine: Arc<FlowEngine>) -> Result<()> {
  let (output, mut messages) = mpsc::channel(engine.config().capacity());
  let runner = FlowRunner::new(engine, output.clone());
  let requests = runner.sender();

  let cancel = CancellationToken::new();
  cancel_on_interrupt(cancel.clone());

  let runner_handle = tokio::spawn(runner.start(cancel.clone()));
  let reader = tokio::spawn(read_requests(requests, output));

  let mut stdout = tokio::io::stdout();
  loop {
    tokio::select! {
      message = messages.recv() => match message {
        Some(message) => write_message(&mut stdout, &message).await?,
        None => break,
      },
      _ = cancel.cancelled() => break,
    }
  }

  // The runner drops its output handle once it stops; anything an interrupted
  // run sent before that, including its error, still goes out.
  reader.abort();
  while let Some(message) = messages.recv().await {
    write_message(&mut stdout, &message).await?;
  }
  runner_handle.await??;
  Ok(())
}

/// Forward stdin lines to the runner. Lines that are not valid requests are
/// answered with an error message.
async fn read_requests(
  requests: mpsc::Sender<FlowRequest>,
  output: mpsc::Sender<StreamMessage>,
) -> Result<()> {
  let mut lines = BufReader::new(tokio::io::stdin()).lines();
  while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
    if line.trim().is_empty() {
      continue;
    }
    match serde_json::from_str::<FlowRequest>(&line) {
      Ok(request) => {
        if requests.send(request).await.is_err() {
          break;
        }
      }
      Err(e) => {
        warn!(error = %e, "invalid request");
        let message = StreamMessage::error(format!("invalid request: {e}"));
        if output.send(message).await.is_err() {
          break;
        }
      }
    }
  }
  Ok(())
}
