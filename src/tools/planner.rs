//! Lesson Planner: five consecutive teaching days for one topic.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::schema::{array, integer, object, string, string_array};
use super::{
    GradeLevel, Tool, ToolKind, ValidationError, bullets, language, min_chars, parse_reply, require_text,
};
use crate::llm::OutputSchema;
use crate::prompt::{PromptLibrary, Template};

pub const PLAN_DAYS: usize = 5;

#[derive(Debug, Clone, Deserialize)]
pub struct PlannerInput {
    pub topic: String,
    pub grade_level: GradeLevel,
    pub language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonDay {
    pub day: u32,
    pub objective: String,
    pub activity: String,
    pub materials: Vec<String>,
    pub exit_question: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonPlan {
    pub lesson_plan: Vec<LessonDay>,
}

impl LessonPlan {
    /// Exactly five days numbered 1..=5 in order, with every text field filled.
    pub fn check(&self) -> Result<(), ValidationError> {
        if self.lesson_plan.len() != PLAN_DAYS {
            return Err(ValidationError::output(format!(
                "lesson plan has {} days, expected {PLAN_DAYS}",
                self.lesson_plan.len()
            )));
        }
        for (i, day) in self.lesson_plan.iter().enumerate() {
            let expected = i as u32 + 1;
            if day.day != expected {
                return Err(ValidationError::output(format!(
                    "lesson plan day {} found at position {expected}",
                    day.day
                )));
            }
            require_text("objective", &day.objective)?;
            require_text("activity", &day.activity)?;
            require_text("exit_question", &day.exit_question)?;
        }
        Ok(())
    }
}

pub struct PlannerTool;

impl Tool for PlannerTool {
    const KIND: ToolKind = ToolKind::Planner;
    type Input = PlannerInput;
    type Output = LessonPlan;

    fn validate(input: &PlannerInput) -> Result<(), ValidationError> {
        min_chars("topic", &input.topic, 3, "Topic must be at least 3 characters long.")?;
        input.grade_level.check("grade_level")?;
        language(&input.language)
    }

    fn prompt(input: &PlannerInput, prompts: &PromptLibrary) -> String {
        prompts
            .builder(Template::Planner)
            .var("topic", input.topic.trim())
            .var("grade_level", input.grade_level.to_string())
            .var("language", input.language.trim())
            .build()
    }

    fn schema(_input: &PlannerInput) -> OutputSchema {
        let day = object(&[
            ("day", integer("The day of the lesson plan (1-5).", 1, PLAN_DAYS as i64)),
            ("objective", string("The day's learning objective.")),
            ("activity", string("The day's main activity.")),
            ("materials", string_array(1, "Materials needed for the activity.")),
            ("exit_question", string("An exit question to assess understanding.")),
        ]);
        let mut days = array(day, PLAN_DAYS, "A 5-day lesson plan.");
        days["maxItems"] = PLAN_DAYS.into();
        OutputSchema::new("lesson_plan", object(&[("lesson_plan", days)]))
    }

    fn finish(_input: &PlannerInput, reply: Value) -> Result<LessonPlan, ValidationError> {
        let plan: LessonPlan = parse_reply(reply)?;
        plan.check()?;
        Ok(plan)
    }

    fn render(plan: &LessonPlan) -> String {
        let mut md = String::new();
        for day in &plan.lesson_plan {
            md.push_str(&format!("## Day {}\n\n", day.day));
            md.push_str(&format!("**Objective:** {}\n\n", day.objective.trim()));
            md.push_str(&format!("**Activity:** {}\n\n", day.activity.trim()));
            if !day.materials.is_empty() {
                md.push_str("**Materials:**\n\n");
                md.push_str(&bullets(&day.materials));
                md.push('\n');
            }
            md.push_str(&format!("**Exit question:** {}\n\n", day.exit_question.trim()));
        }
        md
    }
}
