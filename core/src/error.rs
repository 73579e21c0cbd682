//! Error types and handling for tda core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for tda operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for tda core
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// System prompt loading errors
    #[error("Prompt error: {0}")]
    Prompt(#[from] PromptError),

    /// Agent runtime process errors
    #[error("Runtime error: {0}")]
    Transport(#[from] TransportError),

    /// Agent execution errors
    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),

    /// Logging setup errors
    #[error("Logging error: {message}")]
    Logging { message: String },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Output handler errors
    #[error("Output error: {0}")]
    Output(String),
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for field '{field}': {value}")]
    InvalidValue { field: String, value: String },

    #[error("Working directory does not exist: {}", path.display())]
    MissingWorkingDir { path: PathBuf },
}

/// System prompt errors
#[derive(Error, Debug)]
pub enum PromptError {
    #[error("Failed to read prompt file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Missing closing frontmatter delimiter (---)")]
    UnterminatedFrontmatter,

    #[error("Invalid frontmatter: {0}")]
    Frontmatter(#[from] serde_yaml::Error),

    #[error("Failed to render prompt template: {0}")]
    Render(#[from] handlebars::RenderError),
}

/// Errors raised while talking to the agent runtime process
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Claude Code CLI not found. Install it with: npm install -g @anthropic-ai/claude-code (searched: {searched})")]
    CliNotFound { searched: String },

    #[error("Failed to start agent runtime {}: {source}", path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Agent runtime exited with code {exit_code}: {stderr}")]
    Process { exit_code: i32, stderr: String },

    #[error("Failed to decode runtime output: {message}")]
    Decode { message: String },

    #[error("Runtime output line exceeded the {limit} byte buffer limit")]
    BufferOverflow { limit: usize },

    #[error("Malformed {message_type} message: {message}")]
    MalformedMessage {
        message_type: String,
        message: String,
    },

    #[error("Not connected to the agent runtime; call connect() first")]
    NotConnected,
}

/// Agent execution errors
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Invalid query: {message}")]
    InvalidQuery { message: String },

    #[error("Response stream ended without a result message")]
    IncompleteResponse,
}
