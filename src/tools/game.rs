//! Game Time: a short paper or board game for the classroom.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::schema::{object, string};
use super::{GradeLevel, Tool, ToolKind, ValidationError, language, min_chars, parse_reply, require_text};
use crate::llm::OutputSchema;
use crate::prompt::{PromptLibrary, Template};

#[derive(Debug, Clone, Deserialize)]
pub struct GameInput {
    pub topic: String,
    pub grade_level: GradeLevel,
    pub language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub game_name: String,
    pub game_instructions: String,
    pub materials_needed: String,
    pub learning_objective: String,
    pub game_adaptations: String,
    pub game_board_image_prompt: String,
}

pub struct GameTool;

impl Tool for GameTool {
    const KIND: ToolKind = ToolKind::Game;
    type Input = GameInput;
    type Output = Game;

    fn validate(input: &GameInput) -> Result<(), ValidationError> {
        min_chars("topic", &input.topic, 3, "Topic must be at least 3 characters long.")?;
        input.grade_level.check("grade_level")?;
        language(&input.language)
    }

    fn prompt(input: &GameInput, prompts: &PromptLibrary) -> String {
        prompts
            .builder(Template::Game)
            .var("topic", input.topic.trim())
            .var("grade_level", input.grade_level.to_string())
            .var("language", input.language.trim())
            .build()
    }

    fn schema(_input: &GameInput) -> OutputSchema {
        OutputSchema::new(
            "classroom_game",
            object(&[
                ("game_name", string("A creative and catchy name for the game.")),
                ("game_instructions", string("Step-by-step instructions written for a teacher.")),
                ("materials_needed", string("Common classroom or household materials needed.")),
                ("learning_objective", string("The skill the game develops.")),
                ("game_adaptations", string("How to make the game simpler or more challenging.")),
                ("game_board_image_prompt", string("A description of the game board for an illustrator.")),
            ]),
        )
    }

    fn finish(_input: &GameInput, reply: Value) -> Result<Game, ValidationError> {
        let game: Game = parse_reply(reply)?;
        require_text("game_name", &game.game_name)?;
        require_text("game_instructions", &game.game_instructions)?;
        require_text("materials_needed", &game.materials_needed)?;
        require_text("learning_objective", &game.learning_objective)?;
        require_text("game_adaptations", &game.game_adaptations)?;
        Ok(game)
    }

    fn render(game: &Game) -> String {
        format!(
            "# {}\n\n## Learning Objective\n\n{}\n\n## Materials\n\n{}\n\n## How to Play\n\n{}\n\n## Adaptations\n\n{}\n",
            game.game_name.trim(),
            game.learning_objective.trim(),
            game.materials_needed.trim(),
            game.game_instructions.trim(),
            game.game_adaptations.trim()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{run, testing};

    fn input() -> GameInput {
        GameInput { topic: "Fractions".into(), grade_level: GradeLevel(4), language: "Kannada".into() }
    }

    #[test]
    fn prompt_mentions_fifteen_minutes() {
        let p = GameTool::prompt(&input(), &testing::prompts());
        assert!(p.contains("15 minutes"));
        assert!(p.contains("Topic: Fractions"));
    }

    #[test]
    fn reply_without_board_prompt_still_needs_all_fields() {
        let reply = serde_json::json!({ "game_name": "Fraction Race" });
        assert!(GameTool::finish(&input(), reply).is_err());
    }

    #[tokio::test]
    async fn renders_game_heading() {
        let res = run::<GameTool>(&testing::dummy(), &testing::prompts(), &input()).await.unwrap();
        assert!(res.markdown.starts_with("# [echo] game_name"));
        assert_eq!(res.output.game_board_image_prompt, "[echo] game_board_image_prompt");
    }
}
