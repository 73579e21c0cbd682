//! CLI configuration loader for tda
//!
//! Implements single-source priority loading with flag overrides:
//! 1. --config file/dir (highest priority)
//! 2. Project directory: <dir>/tda.json or <dir>/.tda/config.json
//! 3. Git repository root of the project: <repo_root>/.tda/config.json
//! 4. User config dir: $XDG_CONFIG_HOME/tda/config.json (platform equivalent elsewhere)
//! 5. Built-in defaults (no files)
//!
//! The project directory is the agent's `--cwd` for queries and the process
//! working directory otherwise.
//!
//! Flags (and their `TDA_*` environment variables, handled by clap) are
//! applied on top of whichever source was found.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tda_core::McpServerConfig;
use tracing::debug;

/// Configuration file format
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TdaConfig {
    /// Model passed to the agent runtime
    pub model: Option<String>,
    /// Maximum number of agent turns
    pub max_turns: Option<u32>,
    /// Path to the runtime executable
    pub cli_path: Option<PathBuf>,
    /// Prompty file replacing the bundled system prompt
    pub prompt_file: Option<PathBuf>,
    /// MCP server providing the diagnostic tools
    pub techdebt_server: Option<McpServerConfig>,
}

/// CLI configuration loader
#[derive(Debug, Clone)]
pub struct CliConfigLoader {
    /// Override config file/directory path
    config_override: Option<PathBuf>,
    /// Directory searched for user-level config
    user_config_dir: Option<PathBuf>,
    /// Flag overrides
    model_override: Option<String>,
    max_turns_override: Option<u32>,
    cli_path_override: Option<PathBuf>,
    prompt_file_override: Option<PathBuf>,
}

impl CliConfigLoader {
    /// Create a new loader
    pub fn new() -> Self {
        Self {
            config_override: None,
            user_config_dir: dirs::config_dir(),
            model_override: None,
            max_turns_override: None,
            cli_path_override: None,
            prompt_file_override: None,
        }
    }

    /// Set config file/directory override
    pub fn with_config_override(mut self, path: PathBuf) -> Self {
        self.config_override = Some(path);
        self
    }

    /// Set the user config directory (defaults to the platform config dir)
    pub fn with_user_config_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.user_config_dir = dir;
        self
    }

    /// Set model override
    pub fn with_model_override(mut self, model: String) -> Self {
        self.model_override = Some(model);
        self
    }

    /// Set max turns override
    pub fn with_max_turns_override(mut self, max_turns: u32) -> Self {
        self.max_turns_override = Some(max_turns);
        self
    }

    /// Set runtime executable override
    pub fn with_cli_path_override(mut self, cli_path: PathBuf) -> Self {
        self.cli_path_override = Some(cli_path);
        self
    }

    /// Set prompt file override
    pub fn with_prompt_file_override(mut self, prompt_file: PathBuf) -> Self {
        self.prompt_file_override = Some(prompt_file);
        self
    }

    /// Load and resolve configuration, searching from the process working directory
    pub async fn load(&self) -> Result<TdaConfig> {
        let cwd = std::env::current_dir()?;
        self.load_from(&cwd).await
    }

    /// Load and resolve configuration, searching from `base_dir`
    pub async fn load_from(&self, base_dir: &Path) -> Result<TdaConfig> {
        // Step 1: Find and load base configuration
        let mut config = if let Some(override_path) = &self.config_override {
            self.load_from_path(override_path).await.with_context(|| {
                format!(
                    "Failed to load config from override path: {}",
                    override_path.display()
                )
            })?
        } else {
            self.search_and_load(base_dir).await?
        };

        // Step 2: Apply flag overrides
        if let Some(model) = &self.model_override {
            config.model = Some(model.clone());
        }
        if let Some(max_turns) = self.max_turns_override {
            config.max_turns = Some(max_turns);
        }
        if let Some(cli_path) = &self.cli_path_override {
            config.cli_path = Some(expand_path(cli_path, None));
        }
        if let Some(prompt_file) = &self.prompt_file_override {
            config.prompt_file = Some(expand_path(prompt_file, None));
        }

        // Step 3: Validate
        validate(&config)?;
        Ok(config)
    }

    /// Search for config in priority order
    async fn search_and_load(&self, base_dir: &Path) -> Result<TdaConfig> {
        let mut candidates = vec![
            base_dir.join("tda.json"),
            base_dir.join(".tda").join("config.json"),
        ];
        if let Some(git_root) = find_git_root(base_dir) {
            candidates.push(git_root.join(".tda").join("config.json"));
        }
        if let Some(config_dir) = &self.user_config_dir {
            candidates.push(config_dir.join("tda").join("config.json"));
        }

        for candidate in candidates {
            if candidate.is_file() {
                return self.load_file(&candidate).await;
            }
        }

        debug!("No config file found, using defaults");
        Ok(TdaConfig::default())
    }

    /// Load configuration from a specific path (file or directory)
    async fn load_from_path(&self, path: &Path) -> Result<TdaConfig> {
        if path.is_file() {
            self.load_file(path).await
        } else if path.is_dir() {
            let config_file = path.join("config.json");
            if config_file.exists() {
                self.load_file(&config_file).await
            } else {
                Err(anyhow!(
                    "No config.json found in directory: {}",
                    path.display()
                ))
            }
        } else {
            Err(anyhow!("Config path does not exist: {}", path.display()))
        }
    }

    /// Load a single config file; relative paths inside it resolve against its directory
    async fn load_file(&self, path: &Path) -> Result<TdaConfig> {
        debug!("Loading config from {}", path.display());
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: TdaConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        let base = path.parent();
        config.cli_path = config.cli_path.map(|p| expand_path(&p, base));
        config.prompt_file = config.prompt_file.map(|p| expand_path(&p, base));
        if let Some(server) = config.techdebt_server.as_mut() {
            server.command = shellexpand::tilde(&server.command).into_owned();
        }

        Ok(config)
    }
}

impl Default for CliConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Expand `~` and resolve relative paths against `base` when given
fn expand_path(path: &Path, base: Option<&Path>) -> PathBuf {
    let expanded = PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned());
    match base {
        Some(base) if expanded.is_relative() => base.join(expanded),
        _ => expanded,
    }
}

/// Find git repository root at or above `start`
fn find_git_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
}

fn validate(config: &TdaConfig) -> Result<()> {
    if config.max_turns == Some(0) {
        return Err(anyhow!("Configuration validation failed: max_turns must be greater than 0"));
    }
    if let Some(model) = &config.model {
        if model.trim().is_empty() {
            return Err(anyhow!("Configuration validation failed: model cannot be empty"));
        }
    }
    if let Some(server) = &config.techdebt_server {
        if server.command.trim().is_empty() {
            return Err(anyhow!(
                "Configuration validation failed: techdebt_server.command cannot be empty"
            ));
        }
    }
    Ok(())
}
