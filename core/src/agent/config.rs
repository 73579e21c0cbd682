//! Agent configuration structures

use crate::config::McpServerConfig;
use crate::output::{AgentOutput, NullOutput};
use crate::prompt::load_system_prompt;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the technical debt agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Working directory for the agent runtime
    pub cwd: PathBuf,

    /// Model override (runtime default when unset)
    #[serde(default)]
    pub model: Option<String>,

    /// Maximum number of agent turns
    #[serde(default)]
    pub max_turns: Option<u32>,

    /// Explicit path to the runtime executable
    #[serde(default)]
    pub cli_path: Option<PathBuf>,

    /// Prompty file replacing the bundled system prompt
    #[serde(default)]
    pub prompt_file: Option<PathBuf>,

    /// Command serving the techdebt MCP tools, if the runtime should start one
    #[serde(default)]
    pub techdebt_server: Option<McpServerConfig>,

    /// Log file exported to the runtime as `TDA_LOG_FILE`
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            cwd: PathBuf::from("."),
            model: None,
            max_turns: None,
            cli_path: None,
            prompt_file: None,
            techdebt_server: None,
            log_file: None,
        }
    }
}

/// Builder for the technical debt agent
pub struct AgentBuilder {
    agent_config: AgentConfig,
}

impl AgentBuilder {
    /// Create a builder with the given configuration
    pub fn new(agent_config: AgentConfig) -> Self {
        Self { agent_config }
    }

    /// Set the working directory
    pub fn with_cwd<P: Into<PathBuf>>(mut self, cwd: P) -> Self {
        self.agent_config.cwd = cwd.into();
        self
    }

    /// Set the log file exported to the runtime
    pub fn with_log_file(mut self, log_file: Option<PathBuf>) -> Self {
        self.agent_config.log_file = log_file;
        self
    }

    /// Build the agent with the given output handler.
    ///
    /// The system prompt is loaded here so template errors surface before the
    /// runtime is started.
    pub fn build_with_output(
        self,
        output: Box<dyn AgentOutput>,
    ) -> crate::error::Result<super::TechDebtAgent> {
        let system_prompt = load_system_prompt(self.agent_config.prompt_file.as_deref())?;
        Ok(super::TechDebtAgent::new(
            self.agent_config,
            system_prompt,
            output,
        ))
    }

    /// Build the agent with null output (for testing)
    pub fn build(self) -> crate::error::Result<super::TechDebtAgent> {
        self.build_with_output(Box::new(NullOutput))
    }
}
