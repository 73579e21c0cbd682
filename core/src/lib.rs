//! # tda Core
//!
//! Core library for tda, the Technical Debt Agent.
//!
//! The reasoning happens in an external agent runtime (the `claude` CLI).
//! This crate assembles the session options, restricts the runtime to the
//! diagnostic tools, streams the response back as events and sets up
//! logging for the command-line front end.

// Core modules
pub mod agent;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod prompt;
pub mod runtime;
pub mod tools;

// Re-export commonly used types
pub use agent::{Agent, AgentBuilder, AgentConfig, AgentExecution, TechDebtAgent};
pub use config::{AgentOptions, McpServerConfig, PermissionMode, SystemPrompt};
pub use error::{Error, Result};
pub use logging::{setup_logging, LoggingOptions};
pub use output::{AgentEvent, AgentOutput};
pub use runtime::AgentClient;

/// Current version of the tda-core library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
