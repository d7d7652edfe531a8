//! Local Storytelling: a short story rooted in the students' surroundings,
//! plus a scene description for an optional illustration.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::schema::{object, string};
use super::{GradeLevel, Tool, ToolKind, ValidationError, language, min_chars, parse_reply, require_text};
use crate::llm::OutputSchema;
use crate::prompt::{PromptLibrary, Template};

#[derive(Debug, Clone, Deserialize)]
pub struct StoryInput {
    pub topic: String,
    pub grade: GradeLevel,
    pub language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryOutput {
    pub story: String,
    pub illustration_prompt: String,
}

pub struct StoryTool;

impl Tool for StoryTool {
    const KIND: ToolKind = ToolKind::Story;
    type Input = StoryInput;
    type Output = StoryOutput;

    fn validate(input: &StoryInput) -> Result<(), ValidationError> {
        min_chars("topic", &input.topic, 3, "Topic must be at least 3 characters long.")?;
        input.grade.check("grade")?;
        language(&input.language)
    }

    fn prompt(input: &StoryInput, prompts: &PromptLibrary) -> String {
        prompts
            .builder(Template::Story)
            .var("topic", input.topic.trim())
            .var("grade", input.grade.to_string())
            .var("language", input.language.trim())
            .build()
    }

    fn schema(_input: &StoryInput) -> OutputSchema {
        OutputSchema::new(
            "local_story",
            object(&[
                ("story", string("The generated story.")),
                ("illustration_prompt", string("One scene from the story for an illustrator; no text in the picture.")),
            ]),
        )
    }

    fn finish(_input: &StoryInput, reply: Value) -> Result<StoryOutput, ValidationError> {
        let out: StoryOutput = parse_reply(reply)?;
        require_text("story", &out.story)?;
        Ok(out)
    }

    fn render(output: &StoryOutput) -> String {
        format!("{}\n", output.story.trim())
    }
}

/// Image prompt used for the story illustration endpoint.
pub fn illustration_prompt(topic: &str) -> String {
    format!(
        "A beautiful, whimsical, and child-friendly illustration in a vibrant, storybook style. \
         The image should capture the essence of a story about \"{}\". Do not include any text in the image.",
        topic.trim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{run, testing};

    fn input(topic: &str, grade: u8, language: &str) -> StoryInput {
        StoryInput { topic: topic.into(), grade: GradeLevel(grade), language: language.into() }
    }

    #[test]
    fn validation_boundaries() {
        assert!(StoryTool::validate(&input("rai", 1, "hi")).is_ok());
        assert!(StoryTool::validate(&input("ra", 3, "Hindi")).is_err());
        assert!(StoryTool::validate(&input("rain", 0, "Hindi")).is_err());
        assert!(StoryTool::validate(&input("rain", 13, "Hindi")).is_err());
        assert!(StoryTool::validate(&input("rain", 3, "H")).is_err());
    }

    #[test]
    fn topic_error_names_field() {
        let err = StoryTool::validate(&input("  a ", 3, "Hindi")).unwrap_err();
        assert_eq!(err.to_string(), "topic: Topic must be at least 3 characters long.");
    }

    #[test]
    fn prompt_carries_inputs() {
        let p = StoryTool::prompt(&input("the monsoon", 4, "Marathi"), &testing::prompts());
        assert!(p.contains("Topic: the monsoon"));
        assert!(p.contains("Grade: 4"));
        assert!(p.contains("Language: Marathi"));
    }

    #[test]
    fn empty_story_rejected() {
        let reply = serde_json::json!({ "story": "  ", "illustration_prompt": "a field" });
        assert!(StoryTool::finish(&input("rain", 3, "en"), reply).is_err());
    }

    #[test]
    fn illustration_prompt_wraps_topic() {
        let p = illustration_prompt(" Diwali lamps ");
        assert!(p.contains("a story about \"Diwali lamps\""));
        assert!(p.ends_with("Do not include any text in the image."));
    }

    #[tokio::test]
    async fn runs_offline_with_dummy() {
        let res = run::<StoryTool>(&testing::dummy(), &testing::prompts(), &input("seeds", 2, "English"))
            .await
            .unwrap();
        assert_eq!(res.tool, "story");
        assert_eq!(res.output.story, "[echo] story");
        assert_eq!(res.markdown, "[echo] story\n");
    }
}
