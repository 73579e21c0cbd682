//! # tda CLI
//!
//! Command-line interface for tda, the Technical Debt Agent.
//!
//! ## Usage
//!
//! - `tda "Give me a summary of style diagnostics in ../path/to/project"`
//! - `tda "What are the most common analyzer diagnostics?" --cwd /path/to/project`
//! - `tda tools` - Show the tools the agent may call
//! - `tda prompt` - Show the system prompt sent to the agent
//!
//! Logs are written to `<temp dir>/tda.log`; set `TDA_LOG_LEVEL` (DEBUG,
//! INFO, WARNING, ERROR) to control console verbosity.

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use tda_core::{setup_logging, LoggingOptions};

mod commands;
mod config;
mod output;

use commands::{prompt_command, run_command, tools_command};
use config::CliConfigLoader;

/// tda - Ask an AI agent about technical debt in your .NET projects
#[derive(Parser)]
#[command(name = "tda")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Technical Debt Agent - AI agent for codebase analysis")]
#[command(
    after_help = "Logs are written to <temp dir>/tda.log\nSet TDA_LOG_LEVEL to control verbosity (DEBUG, INFO, WARNING, ERROR)"
)]
struct Cli {
    /// Working directory for the agent
    #[arg(long, default_value = ".", value_parser = parse_existing_dir)]
    cwd: PathBuf,

    /// Configuration file or directory path
    #[arg(short, long, env = "TDA_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Model override
    #[arg(long, env = "TDA_MODEL")]
    model: Option<String>,

    /// Maximum number of agent turns
    #[arg(long, env = "TDA_MAX_TURNS", value_parser = clap::value_parser!(u32).range(1..))]
    max_turns: Option<u32>,

    /// Prompty file replacing the bundled system prompt
    #[arg(long, env = "TDA_PROMPT_FILE", global = true)]
    prompt_file: Option<PathBuf>,

    /// Path to the Claude Code CLI executable
    #[arg(long, env = "TDA_CLI_PATH")]
    cli_path: Option<PathBuf>,

    /// The question to ask about the codebase
    query: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the tools the agent may call
    Tools,

    /// Show the system prompt sent to the agent
    Prompt,
}

/// `--cwd` must name an existing directory
fn parse_existing_dir(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    if !path.exists() {
        return Err(format!("Directory '{}' does not exist.", value));
    }
    if !path.is_dir() {
        return Err(format!("Directory '{}' is a file.", value));
    }
    Ok(path)
}

/// Build a configuration loader from CLI arguments
fn build_config_loader(cli: &Cli) -> CliConfigLoader {
    let mut loader = CliConfigLoader::new();

    if let Some(config_path) = &cli.config {
        loader = loader.with_config_override(config_path.clone());
    }

    if let Some(model) = &cli.model {
        loader = loader.with_model_override(model.clone());
    }

    if let Some(max_turns) = cli.max_turns {
        loader = loader.with_max_turns_override(max_turns);
    }

    if let Some(cli_path) = &cli.cli_path {
        loader = loader.with_cli_path_override(cli_path.clone());
    }

    if let Some(prompt_file) = &cli.prompt_file {
        loader = loader.with_prompt_file_override(prompt_file.clone());
    }

    loader
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_loader = build_config_loader(&cli);

    match (cli.query, cli.command) {
        (Some(query), None) => {
            let log_file = setup_logging(LoggingOptions::from_env())?;

            let outcome = run_command(query, cli.cwd, config_loader, log_file.clone()).await;

            // Print log file location at the end
            eprintln!("Logs: {}", log_file.display());
            outcome
        }
        (Some(_), Some(_)) => Cli::command()
            .error(
                clap::error::ErrorKind::ArgumentConflict,
                "Cannot specify both a query and a subcommand",
            )
            .exit(),
        (None, Some(Commands::Tools)) => tools_command().await,
        (None, Some(Commands::Prompt)) => {
            setup_logging(LoggingOptions::from_env())?;
            prompt_command(config_loader).await
        }
        (None, None) => Cli::command()
            .error(
                clap::error::ErrorKind::MissingRequiredArgument,
                "A query is required, e.g. tda \"What are the most common analyzer diagnostics?\"",
            )
            .exit(),
    }
}
