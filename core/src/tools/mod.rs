//! Tools the agent runtime is permitted to call
//!
//! The tools are served by an MCP server outside this crate; only their
//! names are declared here so the runtime can be told which ones to allow.

/// Name of the MCP server exposing the diagnostic tools
pub const TECHDEBT_SERVER: &str = "techdebt";

/// Description of a permitted MCP tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolInfo {
    /// MCP server that provides the tool
    pub server: &'static str,
    /// Tool name as registered on the server
    pub name: &'static str,
    /// One-line description
    pub description: &'static str,
}

impl ToolInfo {
    /// Fully qualified name the runtime uses for this tool
    pub fn qualified_name(&self) -> String {
        mcp_tool_name(self.server, self.name)
    }
}

/// Diagnostic extraction tools, in the order they are offered
pub const TECHDEBT_TOOLS: &[ToolInfo] = &[
    ToolInfo {
        server: TECHDEBT_SERVER,
        name: "extract_style_diagnostics",
        description: "Collect code style diagnostics for a .NET project or solution",
    },
    ToolInfo {
        server: TECHDEBT_SERVER,
        name: "extract_analyzers_diagnostics",
        description: "Collect Roslyn analyzer diagnostics for a .NET project or solution",
    },
];

/// Qualify a tool name the way the runtime names MCP tools
pub fn mcp_tool_name(server: &str, tool: &str) -> String {
    format!("mcp__{}__{}", server, tool)
}

/// Qualified names of every permitted tool
pub fn allowed_tool_names() -> Vec<String> {
    TECHDEBT_TOOLS.iter().map(ToolInfo::qualified_name).collect()
}

/// Look up a permitted tool by its short or qualified name
pub fn get_tool_info(name: &str) -> Option<&'static ToolInfo> {
    TECHDEBT_TOOLS
        .iter()
        .find(|tool| tool.name == name || tool.qualified_name() == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_tool_names() {
        assert_eq!(
            allowed_tool_names(),
            vec![
                "mcp__techdebt__extract_style_diagnostics",
                "mcp__techdebt__extract_analyzers_diagnostics",
            ]
        );
    }

    #[test]
    fn test_lookup_by_short_and_qualified_name() {
        let short = get_tool_info("extract_style_diagnostics").unwrap();
        let qualified = get_tool_info("mcp__techdebt__extract_style_diagnostics").unwrap();
        assert_eq!(short, qualified);
        assert!(get_tool_info("bash").is_none());
    }
}
