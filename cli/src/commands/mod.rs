//! CLI command implementations

pub mod prompt;
pub mod run;
pub mod tools;

pub use prompt::prompt_command;
pub use run::run_command;
pub use tools::tools_command;
