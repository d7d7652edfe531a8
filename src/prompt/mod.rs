//! Layered prompt builder and the named template library.
//!
//! Prompts are assembled from plain-text fragments stored under
//! `config/prompts/`. Each layer is appended in order; missing files are
//! skipped (or replaced by a compiled-in fallback, see [`PromptLibrary`]).
//!
//! Variable substitution uses `{{key}}` syntax and is applied once at
//! [`build()`](PromptBuilder::build) time, after all layers are joined.
//! Substitution is a single left-to-right pass, so a value that itself
//! contains `{{...}}` is never expanded again.

mod library;

pub use library::{PromptLibrary, Template};

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

const SEPARATOR: &str = "\n\n";

/// Fluent builder that assembles a layered prompt from template files.
///
/// ```rust
/// use classroom_studio::prompt::PromptBuilder;
///
/// let prompt = PromptBuilder::new("config/prompts")
///     .append("Topic: {{topic}}")
///     .var("topic", "monsoon")
///     .build();
/// assert_eq!(prompt, "Topic: monsoon");
/// ```
pub struct PromptBuilder {
    prompts_dir: PathBuf,
    parts: Vec<String>,
    vars: HashMap<String, String>,
}

impl PromptBuilder {
    /// Create a builder rooted at `prompts_dir` (e.g. `"config/prompts"`).
    pub fn new(prompts_dir: impl Into<PathBuf>) -> Self {
        Self {
            prompts_dir: prompts_dir.into(),
            parts: Vec::new(),
            vars: HashMap::new(),
        }
    }

    /// Append a layer by loading `filename` from the prompts directory, or
    /// `fallback` when the file is missing or unreadable. An empty fallback
    /// skips the layer.
    pub fn layer_or(mut self, filename: &str, fallback: &str) -> Self {
        let path = self.prompts_dir.join(filename);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(_) => {
                tracing::debug!("prompt: layer '{}' not found — using built-in", path.display());
                fallback.to_string()
            }
        };
        self.append(text)
    }

    /// Directly append a text fragment (e.g. an already-loaded template body).
    pub fn append(mut self, text: impl Into<String>) -> Self {
        let s = text.into();
        let trimmed = s.trim();
        if !trimmed.is_empty() {
            self.parts.push(trimmed.to_string());
        }
        self
    }

    /// Register a `{{key}}` → `value` substitution applied at build time.
    pub fn var(mut self, key: &str, value: impl Into<String>) -> Self {
        self.vars.insert(key.to_string(), value.into());
        self
    }

    /// Assemble all layers, join with blank lines, and apply variable substitution.
    /// Placeholders with no registered value are left untouched.
    pub fn build(self) -> String {
        let joined = self.parts.join(SEPARATOR);
        substitute(&joined, &self.vars)
    }
}

fn substitute(template: &str, vars: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let key = after[..end].trim();
                match vars.get(key) {
                    Some(value) => out.push_str(value),
                    None => out.push_str(&rest[start..start + 2 + end + 2]),
                }
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
