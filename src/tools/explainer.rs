//! Simple Explainer.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::schema::{object, string};
use super::{GradeLevel, Tool, ToolKind, ValidationError, language, min_chars, parse_reply, require_text};
use crate::llm::OutputSchema;
use crate::prompt::{PromptLibrary, Template};

#[derive(Debug, Clone, Deserialize)]
pub struct ExplainerInput {
    pub question: String,
    pub grade_level: GradeLevel,
    pub language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Explanation {
    pub explanation: String,
    pub analogy_suggestion: String,
    pub chalkboard_drawing_suggestion: String,
}

pub struct ExplainerTool;

impl Tool for ExplainerTool {
    const KIND: ToolKind = ToolKind::Explainer;
    type Input = ExplainerInput;
    type Output = Explanation;

    fn validate(input: &ExplainerInput) -> Result<(), ValidationError> {
        min_chars("question", &input.question, 10, "Question must be at least 10 characters long.")?;
        input.grade_level.check("grade_level")?;
        language(&input.language)
    }

    fn prompt(input: &ExplainerInput, prompts: &PromptLibrary) -> String {
        prompts
            .builder(Template::Explainer)
            .var("question", input.question.trim())
            .var("grade_level", input.grade_level.to_string())
            .var("language", input.language.trim())
            .build()
    }

    fn schema(_input: &ExplainerInput) -> OutputSchema {
        OutputSchema::new(
            "simple_explanation",
            object(&[
                ("explanation", string("The simple explanation of the question.")),
                ("analogy_suggestion", string("A real-life analogy (farming, cooking).")),
                ("chalkboard_drawing_suggestion", string("A drawing the teacher can put on the chalkboard.")),
            ]),
        )
    }

    fn finish(_input: &ExplainerInput, reply: Value) -> Result<Explanation, ValidationError> {
        let out: Explanation = parse_reply(reply)?;
        require_text("explanation", &out.explanation)?;
        require_text("analogy_suggestion", &out.analogy_suggestion)?;
        require_text("chalkboard_drawing_suggestion", &out.chalkboard_drawing_suggestion)?;
        Ok(out)
    }

    fn render(out: &Explanation) -> String {
        format!(
            "## Explanation\n\n{}\n\n## Analogy\n\n{}\n\n## Chalkboard Drawing\n\n{}\n",
            out.explanation.trim(),
            out.analogy_suggestion.trim(),
            out.chalkboard_drawing_suggestion.trim()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{run, testing};

    fn input(question: &str) -> ExplainerInput {
        ExplainerInput { question: question.into(), grade_level: GradeLevel(5), language: "English".into() }
    }

    #[test]
    fn question_needs_ten_chars() {
        assert!(ExplainerTool::validate(&input("Why rain?")).is_err());
        assert!(ExplainerTool::validate(&input("Why rains?")).is_ok());
    }

    #[test]
    fn missing_analogy_rejected() {
        let reply = serde_json::json!({
            "explanation": "Water evaporates.",
            "analogy_suggestion": "",
            "chalkboard_drawing_suggestion": "A cloud."
        });
        assert!(ExplainerTool::finish(&input("Why does it rain?"), reply).is_err());
    }

    #[tokio::test]
    async fn renders_three_sections() {
        let res = run::<ExplainerTool>(&testing::dummy(), &testing::prompts(), &input("Why is the sky blue?"))
            .await
            .unwrap();
        assert!(res.markdown.contains("## Explanation\n\n[echo] explanation"));
        assert!(res.markdown.contains("## Analogy"));
        assert!(res.markdown.contains("## Chalkboard Drawing"));
    }
}
