//! Question answering over a notebook's selected sources.

use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{ChatMessage, NotebookStore, Role};
use crate::error::AppError;
use crate::llm::{LlmProvider, OutputSchema};
use crate::prompt::{PromptLibrary, Template};
use crate::sources::Source;
use crate::tools::ValidationError;

/// Reply when no source is selected; the model is not consulted.
pub const CHAT_NO_SOURCES: &str = "Please add a source document before asking a question.";
/// What the model is told to say when the sources lack the answer.
pub const CHAT_NO_ANSWER: &str = "I could not find an answer in the provided sources.";

#[derive(Debug, Deserialize)]
struct ChatAnswer {
    answer: String,
}

fn answer_schema() -> OutputSchema {
    OutputSchema::new(
        "chat_answer",
        serde_json::json!({
            "type": "object",
            "properties": {
                "answer": {
                    "type": "string",
                    "description": "The answer to the question, based only on the provided sources."
                }
            },
            "required": ["answer"],
            "additionalProperties": false,
        }),
    )
}

fn render_sources(sources: &[Source]) -> String {
    sources
        .iter()
        .map(|s| format!("---\nSource Name: {}\nSource Content:\n{}\n---", s.name, s.content))
        .collect::<Vec<_>>()
        .join("\n")
}

fn chat_prompt(prompts: &PromptLibrary, sources: &[Source], question: &str) -> String {
    prompts
        .builder(Template::ChatSources)
        .var("sources", render_sources(sources))
        .var("question", question)
        .build()
}

impl NotebookStore {
    /// Record `question`, answer it from the selected sources, and return
    /// the assistant message.
    ///
    /// When the LLM call fails the user message stays in the history and
    /// no assistant message is added.
    pub async fn ask(
        &self,
        id: Uuid,
        question: &str,
        llm: &LlmProvider,
        prompts: &PromptLibrary,
    ) -> Result<ChatMessage, AppError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ValidationError::field("question", "Question must not be empty.").into());
        }

        self.push_message(id, ChatMessage::new(Role::User, question))?;
        let sources = self.selected_sources(id)?;

        if sources.is_empty() {
            debug!(notebook_id = %id, "no sources selected");
            return self.push_message(id, ChatMessage::new(Role::Assistant, CHAT_NO_SOURCES));
        }

        let prompt = chat_prompt(prompts, &sources, question);
        debug!(notebook_id = %id, sources = sources.len(), prompt_len = prompt.len(), "asking over sources");

        let reply = llm.complete_json(&prompt, None, &answer_schema()).await.inspect_err(|e| {
            warn!(notebook_id = %id, error = %e, "chat completion failed");
        })?;
        let answer: ChatAnswer = serde_json::from_value(reply)
            .map_err(|e| ValidationError::output(format!("chat reply does not match schema: {e}")))?;
        if answer.answer.trim().is_empty() {
            return Err(ValidationError::output("chat answer is empty").into());
        }

        self.push_message(id, ChatMessage::new(Role::Assistant, answer.answer.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::llm::providers;
    use crate::sources::text_source;
    use crate::tools::testing;

    #[tokio::test]
    async fn no_selected_sources_gets_fixed_reply() {
        let store = NotebookStore::new();
        let id = store.create().unwrap();
        // An unreachable provider proves the LLM is never called.
        let mut cfg = Config::test_default();
        cfg.llm.provider = "openai-compatible".into();
        let llm = providers::build(&cfg.llm, None).unwrap();

        let reply = store.ask(id, "What is soil?", &llm, &testing::prompts()).await.unwrap();
        assert_eq!(reply.role, Role::Assistant);
        assert_eq!(reply.content, CHAT_NO_SOURCES);
        assert_eq!(store.history(id).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn deselected_sources_count_as_none() {
        let store = NotebookStore::new();
        let id = store.create().unwrap();
        let src = store.add_source(id, text_source("n", "Soil holds water.").unwrap()).unwrap();
        store.toggle_source(id, src.id).unwrap();
        let reply = store.ask(id, "What holds water?", &testing::dummy(), &testing::prompts()).await.unwrap();
        assert_eq!(reply.content, CHAT_NO_SOURCES);
    }

    #[tokio::test]
    async fn answers_from_selected_sources() {
        let store = NotebookStore::new();
        let id = store.create().unwrap();
        store.add_source(id, text_source("n", "Soil holds water.").unwrap()).unwrap();
        let reply = store.ask(id, "What holds water?", &testing::dummy(), &testing::prompts()).await.unwrap();
        assert_eq!(reply.content, "[echo] answer");
        let history = store.history(id).unwrap();
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[0].content, "What holds water?");
        assert_eq!(history[1].id, reply.id);
    }

    #[tokio::test]
    async fn llm_failure_keeps_only_user_message() {
        let store = NotebookStore::new();
        let id = store.create().unwrap();
        store.add_source(id, text_source("n", "Soil holds water.").unwrap()).unwrap();
        let mut cfg = Config::test_default();
        cfg.llm.provider = "openai-compatible".into();
        let llm = providers::build(&cfg.llm, None).unwrap();

        assert!(store.ask(id, "What holds water?", &llm, &testing::prompts()).await.is_err());
        let history = store.history(id).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].role, Role::User);
    }

    #[tokio::test]
    async fn blank_question_rejected_without_recording() {
        let store = NotebookStore::new();
        let id = store.create().unwrap();
        let err = store.ask(id, "   ", &testing::dummy(), &testing::prompts()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(store.history(id).unwrap().is_empty());
    }

    #[test]
    fn only_given_sources_are_rendered() {
        let a = text_source("Alpha", "first body").unwrap();
        let rendered = render_sources(&[a]);
        assert!(rendered.contains("Source Name: Alpha\nSource Content:\nfirst body"));
        assert!(rendered.starts_with("---\n"));
    }

    #[test]
    fn deselected_source_left_out_of_prompt() {
        let store = NotebookStore::new();
        let id = store.create().unwrap();
        store.add_source(id, text_source("Rivers", "Rivers carry silt.").unwrap()).unwrap();
        let hidden = store.add_source(id, text_source("Volcanoes", "Lava cools into basalt.").unwrap()).unwrap();
        assert!(!store.toggle_source(id, hidden.id).unwrap());

        let prompt = chat_prompt(&testing::prompts(), &store.selected_sources(id).unwrap(), "What do rivers carry?");
        assert!(prompt.contains("Source Name: Rivers"));
        assert!(prompt.contains("Rivers carry silt."));
        assert!(!prompt.contains("Volcanoes"));
        assert!(!prompt.contains("basalt"));
        assert!(prompt.contains("What do rivers carry?"));
    }

    #[test]
    fn prompt_template_carries_refusal_sentence() {
        let p = testing::prompts().builder(Template::ChatSources).build();
        assert!(p.contains(CHAT_NO_ANSWER));
    }
}
