//! Example showing how a custom system prompt reaches the agent runtime
//!
//! This example shows two ways to set the system prompt:
//! 1. Through a prompty file referenced from AgentConfig
//! 2. By building AgentOptions directly
//!
//! Nothing is started; the example only prints the runtime arguments.
//!
//! ```sh
//! cargo run -p tda-core --example custom_system_prompt
//! ```

use tda_core::{
    tools::allowed_tool_names, AgentBuilder, AgentConfig, AgentOptions, PermissionMode,
    SystemPrompt,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== tda Custom System Prompt Example ===\n");

    // Method 1: prompty file through AgentConfig
    println!("1. Setting the system prompt through a prompty file:");
    let dir = std::env::temp_dir().join("tda-example");
    std::fs::create_dir_all(&dir)?;
    let prompt_file = dir.join("analyzers_only.prompty");
    std::fs::write(
        &prompt_file,
        "---\nname: Analyzers only\nsample:\n  severity: warning\n---\nsystem:\n\
         Only report analyzer diagnostics with severity {{severity}} or higher.\n\
         Group them by rule id.\n",
    )?;

    let agent = AgentBuilder::new(AgentConfig {
        prompt_file: Some(prompt_file),
        ..Default::default()
    })
    .build()?;
    println!("✓ Loaded prompt: {}", agent.system_prompt());
    println!("✓ Runtime args: {:?}\n", agent.build_options().to_cli_args()?);

    // Method 2: AgentOptions directly
    println!("2. Building AgentOptions by hand:");
    let options = AgentOptions::new()
        .with_allowed_tools(allowed_tool_names())
        .with_permission_mode(PermissionMode::Plan)
        .with_system_prompt(SystemPrompt::Text {
            text: "You are a reviewer. Never change files.".to_string(),
        })
        .with_max_turns(Some(3));
    options.validate()?;
    println!("✓ Runtime args: {:?}", options.to_cli_args()?);

    Ok(())
}
