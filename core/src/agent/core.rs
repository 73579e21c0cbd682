//! TechDebtAgent implementation

use super::config::AgentConfig;
use crate::agent::{Agent, AgentExecution, AgentResult};
use crate::config::{AgentOptions, PermissionMode, SystemPrompt};
use crate::error::{AgentError, Error, Result};
use crate::output::{AgentEvent, AgentOutput};
use crate::prompt::collapse_whitespace;
use crate::runtime::{AgentClient, ContentBlock, Message};
use crate::tools::{allowed_tool_names, TECHDEBT_SERVER};
use async_trait::async_trait;
use futures::StreamExt;
use tracing::{debug, info, warn};

/// Environment variable carrying the log file path to the runtime
pub const LOG_FILE_ENV: &str = "TDA_LOG_FILE";

/// Agent that forwards a query to the runtime with the techdebt tools enabled
pub struct TechDebtAgent {
    config: AgentConfig,
    system_prompt: String,
    output: Box<dyn AgentOutput>,
}

impl TechDebtAgent {
    /// Create an agent from a loaded system prompt
    pub fn new(config: AgentConfig, system_prompt: String, output: Box<dyn AgentOutput>) -> Self {
        Self {
            config,
            system_prompt,
            output,
        }
    }

    /// The system prompt as loaded, before whitespace collapsing
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Session options for the runtime.
    ///
    /// The prompt is appended to the runtime's coding preset; the append
    /// field only takes a single line, so whitespace is collapsed first.
    pub fn build_options(&self) -> AgentOptions {
        let mut options = AgentOptions::new()
            .with_allowed_tools(allowed_tool_names())
            .with_cwd(self.config.cwd.clone())
            .with_permission_mode(PermissionMode::AcceptEdits)
            .with_system_prompt(SystemPrompt::claude_code_with_append(collapse_whitespace(
                &self.system_prompt,
            )))
            .with_model(self.config.model.clone())
            .with_max_turns(self.config.max_turns)
            .with_cli_path(self.config.cli_path.clone());

        if let Some(server) = &self.config.techdebt_server {
            options = options.with_mcp_server(TECHDEBT_SERVER, server.clone());
        }

        if let Some(log_file) = &self.config.log_file {
            options = options.with_env(LOG_FILE_ENV, log_file.display().to_string());
        }

        options
    }

    async fn emit(&self, event: AgentEvent) -> Result<()> {
        self.output
            .emit_event(event)
            .await
            .map_err(|e| Error::Output(e.to_string()))
    }

    /// Submit the query and consume the response stream
    async fn stream_response(&self, client: &mut AgentClient, query: &str) -> Result<AgentExecution> {
        client.query(query).await?;

        let mut text_blocks = 0;
        let mut execution = None;
        let mut stream = Box::pin(client.receive_response());

        while let Some(message) = stream.next().await {
            match message? {
                Message::Assistant(assistant) => {
                    for block in assistant.content {
                        match block {
                            ContentBlock::Text { text } => {
                                text_blocks += 1;
                                self.emit(AgentEvent::Text { text }).await?;
                            }
                            ContentBlock::ToolUse { name, input, .. } => {
                                debug!("Tool call: {}", name);
                                self.emit(AgentEvent::ToolUse { name, input }).await?;
                            }
                            ContentBlock::Thinking { .. }
                            | ContentBlock::ToolResult { .. }
                            | ContentBlock::Unknown => {}
                        }
                    }
                }
                Message::Result(result) => {
                    info!(
                        "Run finished: {} ({} turns, {} ms)",
                        result.subtype, result.num_turns, result.duration_ms
                    );
                    let completed = AgentExecution::from_result(&result, text_blocks);
                    // Emitted before teardown: a failed exit must not drop the cost line
                    self.emit(AgentEvent::ExecutionCompleted {
                        execution: completed.clone(),
                    })
                    .await?;
                    execution = Some(completed);
                }
                Message::System(system) => {
                    debug!("Runtime system message: {}", system.subtype);
                }
                Message::User(_) => {}
            }
        }

        execution.ok_or_else(|| AgentError::IncompleteResponse.into())
    }
}

#[async_trait]
impl Agent for TechDebtAgent {
    async fn execute_task(&mut self, task: &str) -> AgentResult<AgentExecution> {
        let query = task.trim();
        if query.is_empty() {
            return Err(AgentError::InvalidQuery {
                message: "query must not be empty".to_string(),
            }
            .into());
        }

        info!("Running query in {}", self.config.cwd.display());
        self.emit(AgentEvent::ExecutionStarted {
            query: query.to_string(),
            cwd: Some(self.config.cwd.clone()),
        })
        .await?;

        let mut client = AgentClient::new(self.build_options());
        client.connect().await?;

        let outcome = self.stream_response(&mut client, query).await;
        let closed = client.disconnect().await;

        // Once a result arrived, the result decides the outcome and a failed
        // exit is only logged. Without one, the exit error carries stderr and
        // explains a truncated stream better than the stream error itself.
        let outcome = match (outcome, closed) {
            (Ok(execution), Ok(())) => Ok(execution),
            (Ok(execution), Err(exit_err)) => {
                warn!("Runtime failed after reporting its result: {}", exit_err);
                Ok(execution)
            }
            (Err(e), Ok(())) => Err(e),
            (Err(stream_err), Err(exit_err)) => {
                warn!("Response stream failed: {}", stream_err);
                Err(exit_err)
            }
        };

        self.output
            .flush()
            .await
            .map_err(|e| Error::Output(e.to_string()))?;

        outcome
    }

    fn config(&self) -> &AgentConfig {
        &self.config
    }

    fn agent_type(&self) -> &str {
        "techdebt"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentBuilder;
    use crate::output::OutputError;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct RecordingOutput {
        events: Arc<Mutex<Vec<AgentEvent>>>,
    }

    #[async_trait]
    impl AgentOutput for RecordingOutput {
        async fn emit_event(&self, event: AgentEvent) -> std::result::Result<(), OutputError> {
            self.events.lock().unwrap().push(event);
            Ok(())
        }
    }

    fn arg_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .map(String::as_str)
    }

    #[test]
    fn test_options_allow_only_techdebt_tools() {
        let agent = AgentBuilder::new(AgentConfig::default()).build().unwrap();
        let options = agent.build_options();

        assert_eq!(
            options.allowed_tools,
            vec![
                "mcp__techdebt__extract_style_diagnostics",
                "mcp__techdebt__extract_analyzers_diagnostics",
            ]
        );
        assert_eq!(options.permission_mode, Some(PermissionMode::AcceptEdits));
        assert!(options.mcp_servers.is_empty());
        assert!(options.env.is_empty());
    }

    #[test]
    fn test_prompt_is_appended_as_single_line() {
        let agent = AgentBuilder::new(AgentConfig::default()).build().unwrap();
        let options = agent.build_options();

        let Some(SystemPrompt::Preset { preset, append }) = &options.system_prompt else {
            panic!("expected preset system prompt");
        };
        assert_eq!(preset, "claude_code");
        let append = append.as_deref().unwrap();
        assert!(!append.contains('\n'));
        assert!(!append.contains("  "));
        assert!(append.starts_with("You are a technical debt analyst"));
        assert!(agent.system_prompt().contains('\n'));
    }

    #[test]
    fn test_server_and_log_file_are_passed_through() {
        let config = AgentConfig {
            techdebt_server: Some(crate::config::McpServerConfig {
                command: "techdebt-mcp".to_string(),
                ..Default::default()
            }),
            log_file: Some("/tmp/tda.log".into()),
            max_turns: Some(8),
            ..Default::default()
        };
        let agent = AgentBuilder::new(config).build().unwrap();
        let options = agent.build_options();

        assert!(options.mcp_servers.contains_key("techdebt"));
        assert_eq!(options.env.get(LOG_FILE_ENV).map(String::as_str), Some("/tmp/tda.log"));
        let args = options.to_cli_args().unwrap();
        assert_eq!(arg_after(&args, "--max-turns"), Some("8"));
    }

    #[test]
    fn test_bad_prompt_file_fails_build() {
        let config = AgentConfig {
            prompt_file: Some("/no/such/file.prompty".into()),
            ..Default::default()
        };
        assert!(AgentBuilder::new(config).build().is_err());
    }

    #[tokio::test]
    async fn test_empty_query_is_rejected() {
        let mut agent = AgentBuilder::new(AgentConfig::default()).build().unwrap();
        let err = agent.execute_task("   ").await.unwrap_err();
        assert!(matches!(err, Error::Agent(AgentError::InvalidQuery { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_execute_task_emits_text_and_result() {
        use crate::runtime::test_support::fake_runtime;

        let dir = tempfile::tempdir().unwrap();
        let cli = fake_runtime(
            dir.path(),
            &[
                r#"{"type":"system","subtype":"init"}"#,
                r#"{"type":"assistant","message":{"content":[{"type":"text","text":"Top rule: IDE0055 (42)"},{"type":"tool_use","id":"t1","name":"mcp__techdebt__extract_style_diagnostics","input":{}}]}}"#,
                r#"{"type":"assistant","message":{"content":[{"type":"text","text":"Fix formatting first."}]}}"#,
                r#"{"type":"result","subtype":"success","duration_ms":30,"duration_api_ms":20,"is_error":false,"num_turns":2,"session_id":"abc","total_cost_usd":0.0421}"#,
            ],
        );

        let output = RecordingOutput::default();
        let config = AgentConfig {
            cwd: dir.path().to_path_buf(),
            cli_path: Some(cli),
            ..Default::default()
        };
        let mut agent = AgentBuilder::new(config)
            .build_with_output(Box::new(output.clone()))
            .unwrap();

        let execution = agent.execute_task("Summarize style issues").await.unwrap();

        assert!(execution.success);
        assert_eq!(execution.text_blocks, 2);
        assert_eq!(execution.reportable_cost(), Some(0.0421));
        assert_eq!(execution.session_id, "abc");

        let events = output.events.lock().unwrap();
        let texts: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                AgentEvent::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(texts, vec!["Top rule: IDE0055 (42)", "Fix formatting first."]);
        assert!(matches!(events.first(), Some(AgentEvent::ExecutionStarted { .. })));
        assert!(matches!(events.last(), Some(AgentEvent::ExecutionCompleted { .. })));
        assert!(events
            .iter()
            .any(|e| matches!(e, AgentEvent::ToolUse { name, .. } if name.contains("style"))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cost_survives_failed_exit_after_result() {
        use crate::runtime::test_support::runtime_exiting;

        let dir = tempfile::tempdir().unwrap();
        let cli = runtime_exiting(
            dir.path(),
            &[
                r#"{"type":"assistant","message":{"content":[{"type":"text","text":"Stopped early."}]}}"#,
                r#"{"type":"result","subtype":"error_max_turns","duration_ms":30,"duration_api_ms":20,"is_error":true,"num_turns":1,"session_id":"abc","total_cost_usd":0.5}"#,
            ],
            1,
        );

        let output = RecordingOutput::default();
        let config = AgentConfig {
            cwd: dir.path().to_path_buf(),
            cli_path: Some(cli),
            max_turns: Some(1),
            ..Default::default()
        };
        let mut agent = AgentBuilder::new(config)
            .build_with_output(Box::new(output.clone()))
            .unwrap();

        let execution = agent.execute_task("Summarize everything").await.unwrap();
        assert!(!execution.success);
        assert_eq!(execution.subtype, "error_max_turns");

        let events = output.events.lock().unwrap();
        let completed: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                AgentEvent::ExecutionCompleted { execution } => Some(execution),
                _ => None,
            })
            .collect();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].reportable_cost(), Some(0.5));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exit_error_wins_over_stream_error() {
        use crate::error::TransportError;
        use crate::runtime::test_support::script;

        let dir = tempfile::tempdir().unwrap();
        let cli = script(
            dir.path(),
            "read -r line\necho 'this is not json'\necho 'fatal: session aborted' >&2\nexit 2\n",
        );
        let config = AgentConfig {
            cwd: dir.path().to_path_buf(),
            cli_path: Some(cli),
            ..Default::default()
        };
        let output = RecordingOutput::default();
        let mut agent = AgentBuilder::new(config)
            .build_with_output(Box::new(output.clone()))
            .unwrap();

        match agent.execute_task("hello").await.unwrap_err() {
            Error::Transport(TransportError::Process { exit_code, stderr }) => {
                assert_eq!(exit_code, 2);
                assert!(stderr.contains("fatal: session aborted"));
            }
            other => panic!("expected process error, got {:?}", other),
        }
        assert!(!output
            .events
            .lock()
            .unwrap()
            .iter()
            .any(|e| matches!(e, AgentEvent::ExecutionCompleted { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stream_without_result_is_incomplete() {
        use crate::runtime::test_support::fake_runtime;

        let dir = tempfile::tempdir().unwrap();
        let cli = fake_runtime(
            dir.path(),
            &[r#"{"type":"assistant","message":{"content":[{"type":"text","text":"partial"}]}}"#],
        );
        let config = AgentConfig {
            cwd: dir.path().to_path_buf(),
            cli_path: Some(cli),
            ..Default::default()
        };
        let mut agent = AgentBuilder::new(config).build().unwrap();

        let err = agent.execute_task("hello").await.unwrap_err();
        assert!(matches!(err, Error::Agent(AgentError::IncompleteResponse)));
    }
}
