//! Flowgraph Engine
//!
//! Executes a submitted flow and streams the value reaching each sink.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        FlowRunner                           │
//! │  - owns mpsc channel of FlowRequests                        │
//! │  - start(cancel) runs requests one at a time                │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  FlowEngine / FlowExecution                 │
//! │  - one RunContext per execution                             │
//! │  - drains sink edges in edge-list order                     │
//! │  - one message per sink edge, then one terminal message     │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         Resolver                            │
//! │  - demand-driven, memoized recursion over incoming edges    │
//! │  - operations looked up in the OperationRegistry            │
//! │  - failures recorded as Unavailable, never raised           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use flowgraph_engine::{EngineConfig, FlowEngine};
//! use tokio_util::sync::CancellationToken;
//!
//! let engine = FlowEngine::new(Arc::new(registry), EngineConfig::default());
//! let messages = engine.execute(request, CancellationToken::new()).collect().await;
//! ```

mod config;
mod engine;
mod error;
mod events;
mod message;
mod resolver;
mod runner;
mod store;

pub use config::EngineConfig;
pub use engine::{FlowEngine, FlowExecution, RunSummary};
pub use error::EngineError;
pub use events::{ChannelNotifier, ExecutionEvent, ExecutionNotifier, NoopNotifier};
pub use message::{COMPLETION_MESSAGE, StreamMessage};
pub use resolver::Resolver;
pub use runner::FlowRunner;
pub use store::{NodeOutcome, RunContext, Unavailable};
