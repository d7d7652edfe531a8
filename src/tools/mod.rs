//! Content-generation tools.
//!
//! Every tool follows the same pipeline:
//!
//! ```text
//! typed input → validate → render prompt → LlmProvider::complete_json
//!             → finish (deserialise + output invariants) → markdown
//! ```
//!
//! [`Tool`] captures the per-tool pieces; [`run`] drives the pipeline.
//! The server mounts one generic handler per tool type.

pub mod analyzer;
pub mod explainer;
pub mod game;
pub mod planner;
pub mod story;
pub mod worksheet;

mod schema;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::AppError;
use crate::llm::{LlmProvider, OutputSchema};
use crate::prompt::PromptLibrary;

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ValidationError {
    /// A request field failed its form rule. Shown to the user verbatim.
    #[error("{field}: {message}")]
    Field { field: &'static str, message: String },
    /// The model's reply did not satisfy the tool's output contract.
    #[error("invalid output: {0}")]
    Output(String),
}

impl ValidationError {
    pub fn field(field: &'static str, message: impl Into<String>) -> Self {
        Self::Field { field, message: message.into() }
    }

    pub fn output(message: impl Into<String>) -> Self {
        Self::Output(message.into())
    }

    /// `true` for errors caused by the request rather than the model.
    pub fn is_input(&self) -> bool {
        matches!(self, Self::Field { .. })
    }
}

// ── Catalog ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    Story,
    Worksheet,
    Explainer,
    Planner,
    Game,
    Analyzer,
}

impl ToolKind {
    pub const ALL: [ToolKind; 6] = [
        ToolKind::Story,
        ToolKind::Worksheet,
        ToolKind::Explainer,
        ToolKind::Planner,
        ToolKind::Game,
        ToolKind::Analyzer,
    ];

    pub fn id(self) -> &'static str {
        match self {
            ToolKind::Story => "story",
            ToolKind::Worksheet => "worksheet",
            ToolKind::Explainer => "explainer",
            ToolKind::Planner => "planner",
            ToolKind::Game => "game",
            ToolKind::Analyzer => "analyzer",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ToolKind::Story => "Local Storytelling",
            ToolKind::Worksheet => "Worksheet Wizard",
            ToolKind::Explainer => "Simple Explainer",
            ToolKind::Planner => "Lesson Planner",
            ToolKind::Game => "Game Time",
            ToolKind::Analyzer => "Student Analyzer",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ToolKind::Story => "Generate stories with local context and farmer analogies.",
            ToolKind::Worksheet => "Create worksheets, mock papers and revision notes from lesson text.",
            ToolKind::Explainer => "Explain complex topics with simple, real-life analogies.",
            ToolKind::Planner => "Generate 5-day lesson plans for any topic.",
            ToolKind::Game => "Create educational paper or board games in minutes.",
            ToolKind::Analyzer => "Analyze monthly scores and get targeted recommendations.",
        }
    }

    /// Generic error text shown when generation fails for any reason.
    pub fn failure_message(self) -> &'static str {
        match self {
            ToolKind::Story => "Failed to generate story. Please try again.",
            ToolKind::Worksheet => "Failed to generate materials. Please try again.",
            ToolKind::Explainer => "Failed to generate explanation. Please try again.",
            ToolKind::Planner => "Failed to generate lesson plan. Please try again.",
            ToolKind::Game => "Failed to generate game. Please try again.",
            ToolKind::Analyzer => "Failed to analyze student performance. Please try again.",
        }
    }
}

/// One entry of `GET /api/tools`.
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
}

pub fn catalog() -> Vec<ToolInfo> {
    ToolKind::ALL
        .iter()
        .map(|k| ToolInfo { id: k.id(), title: k.title(), description: k.description() })
        .collect()
}

// ── Tool contract ─────────────────────────────────────────────────────────────

pub trait Tool: Send + Sync + 'static {
    const KIND: ToolKind;
    type Input: DeserializeOwned + Send + Sync + 'static;
    type Output: Serialize + Send + 'static;

    fn validate(input: &Self::Input) -> Result<(), ValidationError>;
    fn prompt(input: &Self::Input, prompts: &PromptLibrary) -> String;
    fn schema(input: &Self::Input) -> OutputSchema;
    /// Turn the model's JSON reply into the typed output and check its invariants.
    fn finish(input: &Self::Input, reply: Value) -> Result<Self::Output, ValidationError>;
    fn render(output: &Self::Output) -> String;
}

/// Typed output plus its markdown rendering.
#[derive(Debug, Clone, Serialize)]
pub struct ToolResult<O> {
    pub tool: &'static str,
    pub output: O,
    pub markdown: String,
}

/// Validate, prompt, call the model, and finish one tool request.
pub async fn run<T: Tool>(
    llm: &LlmProvider,
    prompts: &PromptLibrary,
    input: &T::Input,
) -> Result<ToolResult<T::Output>, AppError> {
    let tool = T::KIND.id();
    T::validate(input)?;

    let prompt = T::prompt(input, prompts);
    let system = prompts.system();
    let schema = T::schema(input);
    debug!(tool, schema = schema.name, prompt_len = prompt.len(), "running tool");

    let reply = llm.complete_json(&prompt, Some(&system), &schema).await?;
    let output = T::finish(input, reply).inspect_err(|e| {
        warn!(tool, error = %e, "model reply rejected");
    })?;
    let markdown = T::render(&output);
    Ok(ToolResult { tool, output, markdown })
}

// ── Shared helpers ────────────────────────────────────────────────────────────

/// School grade, 1 through 12.
///
/// Accepts a JSON number (`5`) or a string holding one (`"5"`, `"Grade 5"`),
/// since the form fields send either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct GradeLevel(pub u8);

impl GradeLevel {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 12;

    pub fn check(self, field: &'static str) -> Result<(), ValidationError> {
        if (Self::MIN..=Self::MAX).contains(&self.0) {
            Ok(())
        } else {
            Err(ValidationError::field(
                field,
                format!("Grade must be between {} and {}.", Self::MIN, Self::MAX),
            ))
        }
    }
}

impl std::fmt::Display for GradeLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for GradeLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        let n = match Raw::deserialize(deserializer)? {
            Raw::Number(n) => n,
            Raw::Text(s) => {
                let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
                digits
                    .parse::<u64>()
                    .map_err(|_| serde::de::Error::custom(format!("invalid grade level: {s:?}")))?
            }
        };
        // Out-of-range values are kept (saturated) so `check` can report them
        // as a field error rather than a parse failure.
        Ok(GradeLevel(u8::try_from(n).unwrap_or(u8::MAX)))
    }
}

/// Require at least `min` characters after trimming.
pub(crate) fn min_chars(
    field: &'static str,
    value: &str,
    min: usize,
    message: &str,
) -> Result<(), ValidationError> {
    if value.trim().chars().count() < min {
        Err(ValidationError::field(field, message))
    } else {
        Ok(())
    }
}

pub(crate) fn language(value: &str) -> Result<(), ValidationError> {
    min_chars("language", value, 2, "Language must be at least 2 characters long.")
}

/// Deserialise a model reply into `T`.
pub(crate) fn parse_reply<T: DeserializeOwned>(reply: Value) -> Result<T, ValidationError> {
    serde_json::from_value(reply).map_err(|e| ValidationError::output(format!("reply does not match schema: {e}")))
}

pub(crate) fn require_text(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::output(format!("{field} is empty")))
    } else {
        Ok(())
    }
}

pub(crate) fn require_items<T>(field: &str, items: &[T]) -> Result<(), ValidationError> {
    if items.is_empty() {
        Err(ValidationError::output(format!("{field} has no items")))
    } else {
        Ok(())
    }
}

/// Markdown bullet list, one line per item.
pub(crate) fn bullets<S: AsRef<str>>(items: &[S]) -> String {
    items.iter().map(|i| format!("- {}\n", i.as_ref().trim())).collect()
}

/// Markdown numbered list, one line per item.
pub(crate) fn numbered<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(n, i)| format!("{}. {}\n", n + 1, i.as_ref().trim()))
        .collect()
}

#[cfg(test)]
pub(crate) mod testing {
    use std::path::Path;

    use crate::llm::LlmProvider;
    use crate::llm::providers::dummy::DummyProvider;
    use crate::prompt::PromptLibrary;

    pub fn dummy() -> LlmProvider {
        LlmProvider::Dummy(DummyProvider)
    }

    pub fn prompts() -> PromptLibrary {
        PromptLibrary::new(Path::new(env!("CARGO_MANIFEST_DIR")).join("config/prompts"))
    }
}
