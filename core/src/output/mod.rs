//! Output abstraction for agent runs
//!
//! The agent reports what happens during a run as [`AgentEvent`]s; front ends
//! decide how to display them.

use crate::agent::AgentExecution;
use async_trait::async_trait;
use std::path::PathBuf;

/// Error type returned by output handlers
pub type OutputError = Box<dyn std::error::Error + Send + Sync>;

/// Events emitted while an agent run progresses
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    /// The query is about to be submitted
    ExecutionStarted { query: String, cwd: Option<PathBuf> },

    /// A text segment produced by the agent
    Text { text: String },

    /// The agent called a tool
    ToolUse {
        name: String,
        input: serde_json::Value,
    },

    /// The runtime reported the final result of the run
    ExecutionCompleted { execution: AgentExecution },
}

/// Sink for agent events
#[async_trait]
pub trait AgentOutput: Send + Sync {
    /// Handle one event
    async fn emit_event(&self, event: AgentEvent) -> Result<(), OutputError>;

    /// Flush buffered output
    async fn flush(&self) -> Result<(), OutputError> {
        Ok(())
    }
}

/// Output handler that discards every event
pub struct NullOutput;

#[async_trait]
impl AgentOutput for NullOutput {
    async fn emit_event(&self, _event: AgentEvent) -> Result<(), OutputError> {
        Ok(())
    }
}
