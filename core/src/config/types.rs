//! Session options for the agent runtime
//!
//! Core only accepts fully resolved options. Discovery of config files and
//! environment overrides happens in the CLI layer.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

/// Tool permission handling requested from the runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermissionMode {
    /// Prompt for every potentially dangerous tool
    #[serde(rename = "default")]
    Default,
    /// Auto-accept file edits
    #[serde(rename = "acceptEdits")]
    AcceptEdits,
    /// Plan only, never execute
    #[serde(rename = "plan")]
    Plan,
    /// Allow every tool without asking
    #[serde(rename = "bypassPermissions")]
    BypassPermissions,
}

impl PermissionMode {
    /// Get the mode name as understood by the runtime
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionMode::Default => "default",
            PermissionMode::AcceptEdits => "acceptEdits",
            PermissionMode::Plan => "plan",
            PermissionMode::BypassPermissions => "bypassPermissions",
        }
    }
}

impl std::str::FromStr for PermissionMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "default" => Ok(PermissionMode::Default),
            "acceptEdits" => Ok(PermissionMode::AcceptEdits),
            "plan" => Ok(PermissionMode::Plan),
            "bypassPermissions" => Ok(PermissionMode::BypassPermissions),
            other => Err(ConfigError::InvalidValue {
                field: "permission_mode".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

/// System prompt sent with the session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SystemPrompt {
    /// Replace the runtime's system prompt entirely
    Text { text: String },
    /// Keep a built-in preset and append extra instructions to it
    Preset {
        preset: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        append: Option<String>,
    },
}

impl SystemPrompt {
    /// The runtime's own coding-agent preset with appended instructions
    pub fn claude_code_with_append<S: Into<String>>(append: S) -> Self {
        SystemPrompt::Preset {
            preset: "claude_code".to_string(),
            append: Some(append.into()),
        }
    }
}

/// A stdio MCP server the runtime should launch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct McpServerConfig {
    /// Executable to launch
    pub command: String,
    /// Arguments passed to the executable
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    /// Extra environment for the server process
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,
}

/// Options for a single session with the agent runtime
#[derive(Debug, Clone, Default)]
pub struct AgentOptions {
    /// Tools the runtime may call without asking
    pub allowed_tools: Vec<String>,
    /// MCP servers keyed by server name
    pub mcp_servers: BTreeMap<String, McpServerConfig>,
    /// Working directory for the runtime
    pub cwd: Option<PathBuf>,
    /// Permission handling
    pub permission_mode: Option<PermissionMode>,
    /// System prompt
    pub system_prompt: Option<SystemPrompt>,
    /// Model override
    pub model: Option<String>,
    /// Maximum number of agent turns
    pub max_turns: Option<u32>,
    /// Explicit path to the runtime executable
    pub cli_path: Option<PathBuf>,
    /// Extra environment for the runtime process
    pub env: HashMap<String, String>,
}

impl AgentOptions {
    /// Create empty options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the allowed tools
    pub fn with_allowed_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_tools = tools.into_iter().map(Into::into).collect();
        self
    }

    /// Register an MCP server
    pub fn with_mcp_server<S: Into<String>>(mut self, name: S, server: McpServerConfig) -> Self {
        self.mcp_servers.insert(name.into(), server);
        self
    }

    /// Set the working directory
    pub fn with_cwd<P: Into<PathBuf>>(mut self, cwd: P) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Set the permission mode
    pub fn with_permission_mode(mut self, mode: PermissionMode) -> Self {
        self.permission_mode = Some(mode);
        self
    }

    /// Set the system prompt
    pub fn with_system_prompt(mut self, prompt: SystemPrompt) -> Self {
        self.system_prompt = Some(prompt);
        self
    }

    /// Set the model
    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    /// Set the maximum number of turns
    pub fn with_max_turns(mut self, max_turns: Option<u32>) -> Self {
        self.max_turns = max_turns;
        self
    }

    /// Set the runtime executable path
    pub fn with_cli_path(mut self, cli_path: Option<PathBuf>) -> Self {
        self.cli_path = cli_path;
        self
    }

    /// Add an environment variable for the runtime process
    pub fn with_env<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Validate the options
    pub fn validate(&self) -> Result<()> {
        if let Some(cwd) = &self.cwd {
            if !cwd.is_dir() {
                return Err(ConfigError::MissingWorkingDir { path: cwd.clone() }.into());
            }
        }

        if self.max_turns == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "max_turns".to_string(),
                value: "0".to_string(),
            }
            .into());
        }

        if let Some(model) = &self.model {
            if model.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "model".to_string(),
                    value: model.clone(),
                }
                .into());
            }
        }

        for (name, server) in &self.mcp_servers {
            if server.command.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: format!("mcp_servers.{}.command", name),
                    value: server.command.clone(),
                }
                .into());
            }
        }

        Ok(())
    }

    /// Build the runtime command-line arguments (executable excluded)
    pub fn to_cli_args(&self) -> Result<Vec<String>> {
        let mut args = vec![
            "--output-format".to_string(),
            "stream-json".to_string(),
            "--verbose".to_string(),
        ];

        match &self.system_prompt {
            Some(SystemPrompt::Text { text }) => {
                args.push("--system-prompt".to_string());
                args.push(text.clone());
            }
            Some(SystemPrompt::Preset {
                append: Some(append),
                ..
            }) => {
                args.push("--append-system-prompt".to_string());
                args.push(append.clone());
            }
            Some(SystemPrompt::Preset { append: None, .. }) | None => {}
        }

        if !self.allowed_tools.is_empty() {
            args.push("--allowedTools".to_string());
            args.push(self.allowed_tools.join(","));
        }

        if let Some(max_turns) = self.max_turns {
            args.push("--max-turns".to_string());
            args.push(max_turns.to_string());
        }

        if let Some(model) = &self.model {
            args.push("--model".to_string());
            args.push(model.clone());
        }

        if let Some(mode) = self.permission_mode {
            args.push("--permission-mode".to_string());
            args.push(mode.as_str().to_string());
        }

        if !self.mcp_servers.is_empty() {
            let servers: BTreeMap<&String, serde_json::Value> = self
                .mcp_servers
                .iter()
                .map(|(name, server)| {
                    let mut value = serde_json::to_value(server)?;
                    if let Some(obj) = value.as_object_mut() {
                        obj.insert("type".to_string(), serde_json::json!("stdio"));
                    }
                    Ok((name, value))
                })
                .collect::<std::result::Result<_, serde_json::Error>>()?;

            args.push("--mcp-config".to_string());
            args.push(serde_json::to_string(
                &serde_json::json!({ "mcpServers": servers }),
            )?);
        }

        args.push("--input-format".to_string());
        args.push("stream-json".to_string());

        Ok(args)
    }
}
