//! Session client for the agent runtime

use super::message::Message;
use super::transport::SubprocessTransport;
use crate::config::AgentOptions;
use crate::error::{Result, TransportError};
use futures::stream::{self, Stream};
use serde_json::json;
use tracing::{debug, info};

/// Session id used for single-query sessions
const DEFAULT_SESSION_ID: &str = "default";

/// Client holding one session with the agent runtime
pub struct AgentClient {
    options: AgentOptions,
    transport: Option<SubprocessTransport>,
}

impl AgentClient {
    /// Create a client; nothing is started until [`AgentClient::connect`]
    pub fn new(options: AgentOptions) -> Self {
        Self {
            options,
            transport: None,
        }
    }

    /// Options the session was created with
    pub fn options(&self) -> &AgentOptions {
        &self.options
    }

    /// Start the runtime process
    pub async fn connect(&mut self) -> Result<()> {
        if self.transport.is_some() {
            return Ok(());
        }

        self.options.validate()?;
        let mut transport = SubprocessTransport::new(self.options.clone());
        transport.connect().await?;
        info!("Connected to agent runtime");
        self.transport = Some(transport);
        Ok(())
    }

    /// Submit a user query to the session
    pub async fn query(&mut self, prompt: &str) -> Result<()> {
        let transport = self.transport.as_mut().ok_or(TransportError::NotConnected)?;
        debug!("Submitting query ({} chars)", prompt.len());

        let message = json!({
            "type": "user",
            "message": {"role": "user", "content": prompt},
            "parent_tool_use_id": null,
            "session_id": DEFAULT_SESSION_ID,
        });
        transport.write_json(&message).await
    }

    /// Stream the messages answering the last query.
    ///
    /// The stream ends right after the first result message, or when the
    /// runtime closes its output.
    pub fn receive_response(&mut self) -> impl Stream<Item = Result<Message>> + '_ {
        stream::unfold(
            (self.transport.as_mut(), false),
            |(transport, done)| async move {
                if done {
                    return None;
                }
                let Some(transport) = transport else {
                    return Some((Err(TransportError::NotConnected.into()), (None, true)));
                };

                match transport.read_message().await {
                    Ok(Some(message)) => {
                        let finished = matches!(message, Message::Result(_));
                        Some((Ok(message), (Some(transport), finished)))
                    }
                    Ok(None) => None,
                    Err(e) => Some((Err(e), (Some(transport), true))),
                }
            },
        )
    }

    /// Close the session and wait for the runtime to exit
    pub async fn disconnect(&mut self) -> Result<()> {
        if let Some(mut transport) = self.transport.take() {
            transport.close().await?;
            info!("Disconnected from agent runtime");
        }
        Ok(())
    }
}
