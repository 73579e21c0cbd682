//! Configuration types for runtime sessions

pub mod types;

pub use types::{AgentOptions, McpServerConfig, PermissionMode, SystemPrompt};
