//! System prompt preview command

use crate::config::CliConfigLoader;
use anyhow::Result;
use tda_core::prompt::{collapse_whitespace, load_system_prompt};

/// Print the system prompt exactly as it is appended for the runtime
pub async fn prompt_command(config_loader: CliConfigLoader) -> Result<()> {
    let config = config_loader.load().await?;
    let prompt = load_system_prompt(config.prompt_file.as_deref())?;
    println!("{}", collapse_whitespace(&prompt));
    Ok(())
}
