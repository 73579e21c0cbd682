//! Messages streamed back by the agent runtime

use crate::error::{Result, TransportError};
use serde::{Deserialize, Serialize};

/// A message emitted by the runtime on its stream-json output
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Session metadata (init, compaction notices, ...)
    System(SystemMessage),
    /// Model output
    Assistant(AssistantMessage),
    /// Echoed user input and tool results
    User(UserMessage),
    /// Final message of a response, carrying cost and timing
    Result(ResultMessage),
}

/// Session metadata message
#[derive(Debug, Clone, PartialEq)]
pub struct SystemMessage {
    pub subtype: String,
    /// The full raw message
    pub data: serde_json::Value,
}

/// Assistant output made of content blocks
#[derive(Debug, Clone, PartialEq)]
pub struct AssistantMessage {
    pub content: Vec<ContentBlock>,
    pub model: Option<String>,
    pub parent_tool_use_id: Option<String>,
}

impl AssistantMessage {
    /// Iterate over the text blocks of this message
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.content.iter().filter_map(|block| match block {
            ContentBlock::Text { text } => Some(text.as_str()),
            _ => None,
        })
    }
}

/// User message content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

/// User or tool-result message
#[derive(Debug, Clone, PartialEq)]
pub struct UserMessage {
    pub content: UserContent,
    pub parent_tool_use_id: Option<String>,
}

/// Terminal message of a response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultMessage {
    pub subtype: String,
    pub duration_ms: u64,
    pub duration_api_ms: u64,
    pub is_error: bool,
    pub num_turns: u32,
    pub session_id: String,
    #[serde(default)]
    pub total_cost_usd: Option<f64>,
    #[serde(default)]
    pub usage: Option<serde_json::Value>,
    #[serde(default)]
    pub result: Option<String>,
}

/// A block of content within an assistant or user message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Text content
    Text { text: String },

    /// Extended thinking
    Thinking {
        thinking: String,
        #[serde(default)]
        signature: String,
    },

    /// Tool use request
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },

    /// Tool result
    ToolResult {
        tool_use_id: String,
        #[serde(default)]
        content: Option<serde_json::Value>,
        #[serde(default)]
        is_error: Option<bool>,
    },

    /// Block types this crate does not consume (`redacted_thinking`,
    /// `server_tool_use`, `image`, ...)
    #[serde(other)]
    Unknown,
}

#[derive(Deserialize)]
struct AssistantEnvelope {
    message: AssistantBody,
    #[serde(default)]
    parent_tool_use_id: Option<String>,
}

#[derive(Deserialize)]
struct AssistantBody {
    content: Vec<ContentBlock>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Deserialize)]
struct UserEnvelope {
    message: UserBody,
    #[serde(default)]
    parent_tool_use_id: Option<String>,
}

#[derive(Deserialize)]
struct UserBody {
    content: UserContent,
}

fn malformed(message_type: &str, err: serde_json::Error) -> TransportError {
    TransportError::MalformedMessage {
        message_type: message_type.to_string(),
        message: err.to_string(),
    }
}

/// Parse one decoded line of runtime output.
///
/// Returns `Ok(None)` for message types this crate does not consume
/// (partial stream events, control traffic).
pub fn parse_message(value: serde_json::Value) -> Result<Option<Message>> {
    let Some(message_type) = value.get("type").and_then(|t| t.as_str()) else {
        return Err(TransportError::MalformedMessage {
            message_type: "unknown".to_string(),
            message: "missing 'type' field".to_string(),
        }
        .into());
    };

    let message = match message_type {
        "system" => {
            let subtype = value
                .get("subtype")
                .and_then(|s| s.as_str())
                .ok_or_else(|| TransportError::MalformedMessage {
                    message_type: "system".to_string(),
                    message: "missing 'subtype' field".to_string(),
                })?
                .to_string();
            Message::System(SystemMessage {
                subtype,
                data: value,
            })
        }
        "assistant" => {
            let envelope: AssistantEnvelope =
                serde_json::from_value(value).map_err(|e| malformed("assistant", e))?;
            Message::Assistant(AssistantMessage {
                content: envelope.message.content,
                model: envelope.message.model,
                parent_tool_use_id: envelope.parent_tool_use_id,
            })
        }
        "user" => {
            let envelope: UserEnvelope =
                serde_json::from_value(value).map_err(|e| malformed("user", e))?;
            Message::User(UserMessage {
                content: envelope.message.content,
                parent_tool_use_id: envelope.parent_tool_use_id,
            })
        }
        "result" => Message::Result(
            serde_json::from_value(value).map_err(|e| malformed("result", e))?,
        ),
        other => {
            tracing::trace!("Skipping runtime message of type '{}'", other);
            return Ok(None);
        }
    };

    Ok(Some(message))
}
