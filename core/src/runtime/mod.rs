//! Agent runtime session: messages, subprocess transport and client

pub mod client;
pub mod message;
pub mod transport;

#[cfg(all(test, unix))]
pub(crate) mod test_support;

pub use client::AgentClient;
pub use message::{
    parse_message, AssistantMessage, ContentBlock, Message, ResultMessage, SystemMessage,
    UserContent, UserMessage,
};
pub use transport::{find_cli, SubprocessTransport};
