//! Worksheet Wizard.
//!
//! One lesson text, four kinds of material. The requested [`TaskType`]
//! picks the prompt template and the reply schema, and the reply comes back
//! as the matching [`WorksheetOutput`] variant, tagged with `task_type`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::schema::{array, integer, object, string, string_array};
use super::{
    GradeLevel, Tool, ToolKind, ValidationError, bullets, language, min_chars, numbered, parse_reply,
    require_items, require_text,
};
use crate::llm::OutputSchema;
use crate::prompt::{PromptLibrary, Template};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    #[default]
    #[serde(alias = "Differentiated Worksheet")]
    DifferentiatedWorksheet,
    #[serde(alias = "Mock Question Paper")]
    MockQuestionPaper,
    #[serde(alias = "Interview Preparation")]
    InterviewPreparation,
    #[serde(alias = "Key Concepts Summary")]
    KeyConceptsSummary,
}

impl TaskType {
    pub fn label(self) -> &'static str {
        match self {
            TaskType::DifferentiatedWorksheet => "Differentiated Worksheet",
            TaskType::MockQuestionPaper => "Mock Question Paper",
            TaskType::InterviewPreparation => "Interview Preparation",
            TaskType::KeyConceptsSummary => "Key Concepts Summary",
        }
    }

    fn template(self) -> Template {
        match self {
            TaskType::DifferentiatedWorksheet => Template::WorksheetDifferentiated,
            TaskType::MockQuestionPaper => Template::WorksheetMockPaper,
            TaskType::InterviewPreparation => Template::WorksheetInterview,
            TaskType::KeyConceptsSummary => Template::WorksheetKeyConcepts,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorksheetInput {
    pub lesson_text: String,
    #[serde(default)]
    pub task_type: TaskType,
    pub grade_level: GradeLevel,
    pub language: String,
}

// ── Output variants ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DifferentiatedWorksheet {
    pub comprehension_questions: Vec<String>,
    pub vocabulary_tasks: Vec<String>,
    pub creative_tasks: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperSection {
    pub name: String,
    pub marks: u32,
    pub questions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockQuestionPaper {
    pub title: String,
    pub duration_minutes: u32,
    pub sections: Vec<PaperSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewQuestion {
    pub question: String,
    pub model_answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewPreparation {
    pub questions: Vec<InterviewQuestion>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyConcept {
    pub term: String,
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyConceptsSummary {
    pub summary: String,
    pub concepts: Vec<KeyConcept>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "task_type", rename_all = "snake_case")]
pub enum WorksheetOutput {
    DifferentiatedWorksheet(DifferentiatedWorksheet),
    MockQuestionPaper(MockQuestionPaper),
    InterviewPreparation(InterviewPreparation),
    KeyConceptsSummary(KeyConceptsSummary),
}

impl WorksheetOutput {
    pub fn task_type(&self) -> TaskType {
        match self {
            WorksheetOutput::DifferentiatedWorksheet(_) => TaskType::DifferentiatedWorksheet,
            WorksheetOutput::MockQuestionPaper(_) => TaskType::MockQuestionPaper,
            WorksheetOutput::InterviewPreparation(_) => TaskType::InterviewPreparation,
            WorksheetOutput::KeyConceptsSummary(_) => TaskType::KeyConceptsSummary,
        }
    }

    fn check(&self) -> Result<(), ValidationError> {
        match self {
            WorksheetOutput::DifferentiatedWorksheet(w) => {
                require_items("comprehension_questions", &w.comprehension_questions)?;
                require_items("vocabulary_tasks", &w.vocabulary_tasks)?;
                require_items("creative_tasks", &w.creative_tasks)
            }
            WorksheetOutput::MockQuestionPaper(p) => {
                require_text("title", &p.title)?;
                require_items("sections", &p.sections)?;
                for s in &p.sections {
                    require_text("section name", &s.name)?;
                    require_items("section questions", &s.questions)?;
                }
                Ok(())
            }
            WorksheetOutput::InterviewPreparation(i) => {
                require_items("questions", &i.questions)?;
                for q in &i.questions {
                    require_text("question", &q.question)?;
                    require_text("model_answer", &q.model_answer)?;
                }
                Ok(())
            }
            WorksheetOutput::KeyConceptsSummary(k) => {
                require_text("summary", &k.summary)?;
                require_items("concepts", &k.concepts)?;
                for c in &k.concepts {
                    require_text("term", &c.term)?;
                }
                Ok(())
            }
        }
    }

    pub fn to_markdown(&self) -> String {
        let mut md = format!("# {}\n\n", self.task_type().label());
        match self {
            WorksheetOutput::DifferentiatedWorksheet(w) => {
                md.push_str("## Comprehension Questions\n\n");
                md.push_str(&numbered(&w.comprehension_questions));
                md.push_str("\n## Vocabulary Tasks\n\n");
                md.push_str(&numbered(&w.vocabulary_tasks));
                md.push_str("\n## Creative Tasks\n\n");
                md.push_str(&numbered(&w.creative_tasks));
            }
            WorksheetOutput::MockQuestionPaper(p) => {
                md.push_str(&format!("**{}**\n\nTime allowed: {} minutes\n", p.title.trim(), p.duration_minutes));
                for s in &p.sections {
                    md.push_str(&format!("\n## {} ({} marks)\n\n", s.name.trim(), s.marks));
                    md.push_str(&numbered(&s.questions));
                }
            }
            WorksheetOutput::InterviewPreparation(i) => {
                for (n, q) in i.questions.iter().enumerate() {
                    md.push_str(&format!("## Q{}. {}\n\n{}\n\n", n + 1, q.question.trim(), q.model_answer.trim()));
                }
            }
            WorksheetOutput::KeyConceptsSummary(k) => {
                md.push_str(k.summary.trim());
                md.push_str("\n\n## Key Concepts\n\n");
                let lines: Vec<String> = k
                    .concepts
                    .iter()
                    .map(|c| format!("**{}**: {}", c.term.trim(), c.explanation.trim()))
                    .collect();
                md.push_str(&bullets(&lines));
            }
        }
        md
    }
}

// ── Tool ──────────────────────────────────────────────────────────────────────

fn reply_schema(task: TaskType) -> OutputSchema {
    match task {
        TaskType::DifferentiatedWorksheet => OutputSchema::new(
            "differentiated_worksheet",
            object(&[
                ("comprehension_questions", string_array(1, "Comprehension questions based on the lesson text.")),
                ("vocabulary_tasks", string_array(1, "Vocabulary tasks related to the lesson text.")),
                ("creative_tasks", string_array(1, "Creative tasks inspired by the lesson text.")),
            ]),
        ),
        TaskType::MockQuestionPaper => {
            let section = object(&[
                ("name", string("Section name.")),
                ("marks", integer("Total marks for the section.", 1, 100)),
                ("questions", string_array(1, "Questions in this section.")),
            ]);
            OutputSchema::new(
                "mock_question_paper",
                object(&[
                    ("title", string("Title of the paper.")),
                    ("duration_minutes", integer("Time allowed in minutes.", 10, 180)),
                    ("sections", array(section, 1, "Paper sections.")),
                ]),
            )
        }
        TaskType::InterviewPreparation => {
            let question = object(&[
                ("question", string("A likely question.")),
                ("model_answer", string("A model answer at this grade level.")),
            ]);
            OutputSchema::new(
                "interview_preparation",
                object(&[("questions", array(question, 1, "Questions with model answers."))]),
            )
        }
        TaskType::KeyConceptsSummary => {
            let concept = object(&[
                ("term", string("The concept.")),
                ("explanation", string("A plain explanation.")),
            ]);
            OutputSchema::new(
                "key_concepts_summary",
                object(&[
                    ("summary", string("A short summary of the lesson.")),
                    ("concepts", array(concept, 1, "Key concepts.")),
                ]),
            )
        }
    }
}

pub struct WorksheetTool;

impl Tool for WorksheetTool {
    const KIND: ToolKind = ToolKind::Worksheet;
    type Input = WorksheetInput;
    type Output = WorksheetOutput;

    fn validate(input: &WorksheetInput) -> Result<(), ValidationError> {
        min_chars("lesson_text", &input.lesson_text, 20, "Lesson text must be at least 20 characters long.")?;
        input.grade_level.check("grade_level")?;
        language(&input.language)
    }

    fn prompt(input: &WorksheetInput, prompts: &PromptLibrary) -> String {
        prompts
            .builder(input.task_type.template())
            .var("lesson_text", input.lesson_text.trim())
            .var("grade_level", input.grade_level.to_string())
            .var("language", input.language.trim())
            .build()
    }

    fn schema(input: &WorksheetInput) -> OutputSchema {
        reply_schema(input.task_type)
    }

    fn finish(input: &WorksheetInput, reply: Value) -> Result<WorksheetOutput, ValidationError> {
        let output = match input.task_type {
            TaskType::DifferentiatedWorksheet => WorksheetOutput::DifferentiatedWorksheet(parse_reply(reply)?),
            TaskType::MockQuestionPaper => WorksheetOutput::MockQuestionPaper(parse_reply(reply)?),
            TaskType::InterviewPreparation => WorksheetOutput::InterviewPreparation(parse_reply(reply)?),
            TaskType::KeyConceptsSummary => WorksheetOutput::KeyConceptsSummary(parse_reply(reply)?),
        };
        output.check()?;
        Ok(output)
    }

    fn render(output: &WorksheetOutput) -> String {
        output.to_markdown()
    }
}
