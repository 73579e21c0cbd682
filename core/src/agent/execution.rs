//! Agent execution result structures

use crate::runtime::ResultMessage;
use serde::{Deserialize, Serialize};

/// Result of a single agent run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentExecution {
    /// Whether the runtime reported success
    pub success: bool,

    /// Result subtype reported by the runtime (`success`, `error_max_turns`, ...)
    pub subtype: String,

    /// Runtime session id
    pub session_id: String,

    /// Number of agent turns
    pub num_turns: u32,

    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,

    /// Time spent in API calls in milliseconds
    pub duration_api_ms: u64,

    /// Total cost in USD, when the runtime reports it
    pub total_cost_usd: Option<f64>,

    /// Number of text segments the agent produced
    pub text_blocks: usize,

    /// Final result text, when present
    pub final_result: Option<String>,
}

impl AgentExecution {
    /// Build from the runtime's result message
    pub fn from_result(result: &ResultMessage, text_blocks: usize) -> Self {
        Self {
            success: !result.is_error,
            subtype: result.subtype.clone(),
            session_id: result.session_id.clone(),
            num_turns: result.num_turns,
            duration_ms: result.duration_ms,
            duration_api_ms: result.duration_api_ms,
            total_cost_usd: result.total_cost_usd,
            text_blocks,
            final_result: result.result.clone(),
        }
    }

    /// Cost worth reporting: present and non-zero
    pub fn reportable_cost(&self) -> Option<f64> {
        self.total_cost_usd.filter(|cost| *cost != 0.0)
    }
}
