//! Named prompt templates.
//!
//! Each [`Template`] maps to a file under the configured prompts directory.
//! A copy of every file is compiled into the binary so the studio still
//! works when started outside the repository; an on-disk file always wins.

use std::path::{Path, PathBuf};

use super::PromptBuilder;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Template {
    System,
    Story,
    WorksheetDifferentiated,
    WorksheetMockPaper,
    WorksheetInterview,
    WorksheetKeyConcepts,
    Explainer,
    Planner,
    Game,
    Analyzer,
    ChatSources,
    Ocr,
}

impl Template {
    pub const ALL: [Template; 12] = [
        Template::System,
        Template::Story,
        Template::WorksheetDifferentiated,
        Template::WorksheetMockPaper,
        Template::WorksheetInterview,
        Template::WorksheetKeyConcepts,
        Template::Explainer,
        Template::Planner,
        Template::Game,
        Template::Analyzer,
        Template::ChatSources,
        Template::Ocr,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            Template::System => "system.md",
            Template::Story => "story.txt",
            Template::WorksheetDifferentiated => "worksheet_differentiated.txt",
            Template::WorksheetMockPaper => "worksheet_mock_paper.txt",
            Template::WorksheetInterview => "worksheet_interview.txt",
            Template::WorksheetKeyConcepts => "worksheet_key_concepts.txt",
            Template::Explainer => "explainer.txt",
            Template::Planner => "planner.txt",
            Template::Game => "game.txt",
            Template::Analyzer => "analyzer.txt",
            Template::ChatSources => "chat_sources.txt",
            Template::Ocr => "ocr.txt",
        }
    }

    fn builtin(self) -> &'static str {
        match self {
            Template::System => include_str!("../../config/prompts/system.md"),
            Template::Story => include_str!("../../config/prompts/story.txt"),
            Template::WorksheetDifferentiated => include_str!("../../config/prompts/worksheet_differentiated.txt"),
            Template::WorksheetMockPaper => include_str!("../../config/prompts/worksheet_mock_paper.txt"),
            Template::WorksheetInterview => include_str!("../../config/prompts/worksheet_interview.txt"),
            Template::WorksheetKeyConcepts => include_str!("../../config/prompts/worksheet_key_concepts.txt"),
            Template::Explainer => include_str!("../../config/prompts/explainer.txt"),
            Template::Planner => include_str!("../../config/prompts/planner.txt"),
            Template::Game => include_str!("../../config/prompts/game.txt"),
            Template::Analyzer => include_str!("../../config/prompts/analyzer.txt"),
            Template::ChatSources => include_str!("../../config/prompts/chat_sources.txt"),
            Template::Ocr => include_str!("../../config/prompts/ocr.txt"),
        }
    }
}

/// Resolves [`Template`]s against a prompts directory.
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    dir: PathBuf,
}

impl PromptLibrary {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// A builder seeded with `template`; add variables and call `build()`.
    pub fn builder(&self, template: Template) -> PromptBuilder {
        PromptBuilder::new(&self.dir).layer_or(template.file_name(), template.builtin())
    }

    /// The shared system prompt sent with every tool request.
    pub fn system(&self) -> String {
        self.builder(Template::System).build()
    }

    /// Templates with no file on disk, i.e. served from the built-in copy.
    pub fn missing(&self) -> Vec<&'static str> {
        Template::ALL
            .iter()
            .map(|t| t.file_name())
            .filter(|name| !self.dir.join(name).is_file())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo_library() -> PromptLibrary {
        PromptLibrary::new(Path::new(env!("CARGO_MANIFEST_DIR")).join("config/prompts"))
    }

    #[test]
    fn repo_has_every_template() {
        assert!(repo_library().missing().is_empty());
    }

    #[test]
    fn falls_back_to_builtin_when_dir_missing() {
        let lib = PromptLibrary::new("/no/such/prompts");
        assert_eq!(lib.missing().len(), Template::ALL.len());
        let story = lib.builder(Template::Story).var("topic", "harvest").build();
        assert!(story.contains("harvest"));
    }

    #[test]
    fn on_disk_file_overrides_builtin() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("story.txt"), "Custom: {{topic}}").unwrap();
        let lib = PromptLibrary::new(dir.path());
        assert_eq!(lib.builder(Template::Story).var("topic", "kites").build(), "Custom: kites");
        assert!(!lib.missing().contains(&"story.txt"));
    }

    #[test]
    fn system_prompt_not_empty() {
        assert!(!repo_library().system().is_empty());
    }
}
