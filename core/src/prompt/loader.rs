//! Prompty template loading
//!
//! A prompty file is markdown with optional YAML frontmatter:
//!
//! ```text
//! ---
//! name: Technical Debt Agent
//! sample:
//!   language: C#
//! ---
//! system:
//! You analyze {{language}} projects.
//! ```
//!
//! The body is the prompt. A leading `system:` role marker is removed, and
//! `{{name}}` placeholders are filled from `sample` when it is present.

use crate::error::{PromptError, Result};
use handlebars::Handlebars;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// Bundled system prompt template
pub const DEFAULT_SYSTEM_PROMPT: &str = include_str!("system_prompt.prompty");

/// Role marker that may open the prompt body
const SYSTEM_MARKER: &str = "system:";

/// Frontmatter of a prompty file
#[derive(Debug, Default, Deserialize)]
pub struct PromptFrontmatter {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    /// Values used to render `{{placeholders}}` in the body
    #[serde(default)]
    pub sample: HashMap<String, serde_json::Value>,

    /// Everything else (model, authors, inputs, ...)
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// A parsed prompty file
#[derive(Debug)]
pub struct PromptFile {
    pub frontmatter: PromptFrontmatter,
    pub body: String,
}

impl PromptFile {
    /// Split `content` into frontmatter and body
    pub fn parse(content: &str) -> std::result::Result<Self, PromptError> {
        let content = content.trim_start_matches('\u{feff}');

        let Some(rest) = content
            .strip_prefix("---\n")
            .or_else(|| content.strip_prefix("---\r\n"))
        else {
            return Ok(Self {
                frontmatter: PromptFrontmatter::default(),
                body: content.trim().to_string(),
            });
        };

        let (yaml, body) = split_frontmatter(rest).ok_or(PromptError::UnterminatedFrontmatter)?;

        let frontmatter = if yaml.trim().is_empty() {
            PromptFrontmatter::default()
        } else {
            serde_yaml::from_str(yaml)?
        };

        Ok(Self {
            frontmatter,
            body: body.trim().to_string(),
        })
    }

    /// Produce the final prompt text
    pub fn render(&self) -> std::result::Result<String, PromptError> {
        let body = strip_system_marker(&self.body);

        if self.frontmatter.sample.is_empty() {
            return Ok(body.to_string());
        }

        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(handlebars::no_escape);
        Ok(handlebars.render_template(body, &self.frontmatter.sample)?)
    }
}

/// Find the closing `---` line; returns (frontmatter, body)
fn split_frontmatter(rest: &str) -> Option<(&str, &str)> {
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            return Some((&rest[..offset], &rest[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}

fn strip_system_marker(body: &str) -> &str {
    match body.strip_prefix(SYSTEM_MARKER) {
        Some(rest) => rest.trim(),
        None => body,
    }
}

/// Load the system prompt from `path`, or the bundled template when `None`
pub fn load_system_prompt(path: Option<&Path>) -> Result<String> {
    let content = match path {
        Some(path) => {
            debug!("Loading system prompt from {}", path.display());
            std::fs::read_to_string(path).map_err(|source| PromptError::Read {
                path: path.to_path_buf(),
                source,
            })?
        }
        None => DEFAULT_SYSTEM_PROMPT.to_string(),
    };

    let prompt = PromptFile::parse(&content)?;
    if let Some(name) = &prompt.frontmatter.name {
        debug!("Using prompt '{}'", name);
    }
    Ok(prompt.render()?)
}

/// Collapse all whitespace runs, newlines included, into single spaces
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_prompt_loads_without_marker() {
        let prompt = load_system_prompt(None).unwrap();

        assert!(prompt.starts_with("You are a technical debt analyst"));
        assert!(!prompt.contains("system:"));
        assert!(prompt.contains("extract_style_diagnostics"));
        assert!(prompt.contains("extract_analyzers_diagnostics"));
    }

    #[test]
    fn test_body_without_frontmatter_is_used_as_is() {
        let prompt = PromptFile::parse("system:\n  Be brief.\n").unwrap();
        assert!(prompt.frontmatter.name.is_none());
        assert_eq!(prompt.render().unwrap(), "Be brief.");

        let plain = PromptFile::parse("Just text").unwrap();
        assert_eq!(plain.render().unwrap(), "Just text");
    }

    #[test]
    fn test_marker_only_stripped_at_start() {
        let prompt = PromptFile::parse("Answer the user.\nsystem: is a word here").unwrap();
        assert_eq!(prompt.render().unwrap(), "Answer the user.\nsystem: is a word here");
    }

    #[test]
    fn test_frontmatter_fields_and_sample_rendering() {
        let content = "---\nname: Demo\nmodel:\n  api: chat\nsample:\n  language: C#\n---\nsystem:\nYou analyze {{language}} projects & <solutions>.\n";
        let prompt = PromptFile::parse(content).unwrap();

        assert_eq!(prompt.frontmatter.name.as_deref(), Some("Demo"));
        assert!(prompt.frontmatter.extra.contains_key("model"));
        assert_eq!(
            prompt.render().unwrap(),
            "You analyze C# projects & <solutions>."
        );
    }

    #[test]
    fn test_unterminated_frontmatter_is_an_error() {
        let err = PromptFile::parse("---\nname: Demo\nsystem:\nhello").unwrap_err();
        assert!(matches!(err, PromptError::UnterminatedFrontmatter));
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        let err = PromptFile::parse("---\nname: [unclosed\n---\nbody").unwrap_err();
        assert!(matches!(err, PromptError::Frontmatter(_)));
    }

    #[test]
    fn test_missing_file_is_reported_with_path() {
        let err = load_system_prompt(Some(Path::new("/no/such/prompt.prompty"))).unwrap_err();
        assert!(err.to_string().contains("/no/such/prompt.prompty"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.prompty");
        std::fs::write(&path, "---\nname: Custom\n---\nsystem:\nOnly list rule ids.\n").unwrap();

        assert_eq!(
            load_system_prompt(Some(&path)).unwrap(),
            "Only list rule ids."
        );
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(
            collapse_whitespace("  one\n\ttwo   three\r\n\nfour "),
            "one two three four"
        );
        assert_eq!(collapse_whitespace("\n \t"), "");
    }
}
