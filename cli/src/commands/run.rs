//! Single query execution command

use crate::config::CliConfigLoader;
use crate::output::CliOutputHandler;
use anyhow::Result;
use std::path::PathBuf;
use tda_core::{Agent, AgentBuilder, AgentConfig};
use tracing::{debug, info, warn};

/// Send `query` to the agent runtime and stream the answer to the console
pub async fn run_command(
    query: String,
    cwd: PathBuf,
    config_loader: CliConfigLoader,
    log_file: PathBuf,
) -> Result<()> {
    info!("Executing query: {}", query);

    let project_path = cwd.canonicalize().unwrap_or(cwd);
    debug!("📁 Project path: {}", project_path.display());

    let config = config_loader.load_from(&project_path).await?;
    if let Some(model) = &config.model {
        info!("🤖 Using model: {}", model);
    }

    let agent_config = AgentConfig {
        cwd: project_path,
        model: config.model,
        max_turns: config.max_turns,
        cli_path: config.cli_path,
        prompt_file: config.prompt_file,
        techdebt_server: config.techdebt_server,
        log_file: Some(log_file),
    };

    let mut agent =
        AgentBuilder::new(agent_config).build_with_output(Box::new(CliOutputHandler::new()))?;
    let execution = agent.execute_task(&query).await?;

    if execution.success {
        info!("✅ Query completed in {} turns", execution.num_turns);
    } else {
        warn!("Agent run ended with '{}'", execution.subtype);
    }

    Ok(())
}
