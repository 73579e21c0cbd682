//! Tools listing command

use anyhow::Result;
use tda_core::tools::{TECHDEBT_SERVER, TECHDEBT_TOOLS};
use tracing::info;

/// Show the tools the agent may call
pub async fn tools_command() -> Result<()> {
    info!("Listing permitted tools");

    println!("🛠️  Permitted Tools\n");

    for tool in TECHDEBT_TOOLS {
        println!("📦 {}", tool.qualified_name());
        println!("   {}\n", tool.description);
    }

    println!(
        "💡 Tools are served by the '{}' MCP server; configure it with techdebt_server in tda.json.",
        TECHDEBT_SERVER
    );

    Ok(())
}
