//! CLI output handler implementation

use async_trait::async_trait;
use std::io::Write;
use std::sync::Mutex;
use tda_core::output::{AgentEvent, AgentOutput, OutputError};
use tracing::debug;

type Sink = Mutex<Box<dyn Write + Send>>;

/// CLI output handler: agent text on stdout, cost summary on stderr
pub struct CliOutputHandler {
    out: Sink,
    err: Sink,
}

impl CliOutputHandler {
    /// Create a handler writing to the process stdout and stderr
    pub fn new() -> Self {
        Self::with_writers(Box::new(std::io::stdout()), Box::new(std::io::stderr()))
    }

    /// Create a handler writing to the given sinks
    pub fn with_writers(out: Box<dyn Write + Send>, err: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
            err: Mutex::new(err),
        }
    }

    fn write_line(sink: &Sink, line: &str) -> Result<(), OutputError> {
        let mut writer = sink.lock().map_err(|_| "output writer poisoned")?;
        writeln!(writer, "{}", line)?;
        Ok(())
    }
}

impl Default for CliOutputHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Cost line printed after a run
pub fn format_cost(cost: f64) -> String {
    format!("\n[Cost: ${:.4}]", cost)
}

#[async_trait]
impl AgentOutput for CliOutputHandler {
    async fn emit_event(&self, event: AgentEvent) -> Result<(), OutputError> {
        match event {
            AgentEvent::ExecutionStarted { query, cwd } => {
                debug!("🚀 Query: {}", query);
                if let Some(cwd) = cwd {
                    debug!("📁 Working directory: {}", cwd.display());
                }
            }

            AgentEvent::Text { text } => {
                Self::write_line(&self.out, &text)?;
            }

            AgentEvent::ToolUse { name, input } => {
                debug!("🔧 {} {}", name, input);
            }

            AgentEvent::ExecutionCompleted { execution } => {
                debug!(
                    "✅ {} after {} turns in {} ms (session {})",
                    execution.subtype,
                    execution.num_turns,
                    execution.duration_ms,
                    execution.session_id
                );
                if let Some(cost) = execution.reportable_cost() {
                    Self::write_line(&self.err, &format_cost(cost))?;
                }
            }
        }

        Ok(())
    }

    async fn flush(&self) -> Result<(), OutputError> {
        for sink in [&self.out, &self.err] {
            sink.lock().map_err(|_| "output writer poisoned")?.flush()?;
        }
        Ok(())
    }
}
