//! Agent runner

pub mod base;
pub mod config;
pub mod core;
pub mod execution;

pub use base::{Agent, AgentResult};
pub use config::{AgentBuilder, AgentConfig};
pub use core::{TechDebtAgent, LOG_FILE_ENV};
pub use execution::AgentExecution;
