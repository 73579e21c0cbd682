//! System prompt template loading

pub mod loader;

pub use loader::{collapse_whitespace, load_system_prompt, PromptFile, DEFAULT_SYSTEM_PROMPT};
