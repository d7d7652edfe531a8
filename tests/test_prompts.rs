//! Tests for the prompt templates shipped in config/prompts

use std::fs;

fn read(name: &str) -> String {
    fs::read_to_string(format!("config/prompts/{name}")).unwrap_or_else(|e| panic!("{name} unreadable: {e}"))
}

fn assert_vars(name: &str, vars: &[&str]) {
    let text = read(name);
    for var in vars {
        let placeholder = format!("{{{{{var}}}}}");
        assert!(text.contains(&placeholder), "{name} should contain {placeholder}");
    }
}

#[test]
fn test_system_prompt_file_exists() {
    assert!(!read("system.md").trim().is_empty(), "system.md must not be empty");
}

#[test]
fn test_ocr_prompt_has_no_vars() {
    assert!(!read("ocr.txt").contains("{{"), "ocr.txt is sent as-is");
}

#[test]
fn test_story_prompt_template_vars() {
    assert_vars("story.txt", &["topic", "grade", "language"]);
}

#[test]
fn test_worksheet_prompt_template_vars() {
    for name in [
        "worksheet_differentiated.txt",
        "worksheet_mock_paper.txt",
        "worksheet_interview.txt",
        "worksheet_key_concepts.txt",
    ] {
        assert_vars(name, &["lesson_text", "grade_level", "language"]);
    }
}

#[test]
fn test_explainer_prompt_template_vars() {
    assert_vars("explainer.txt", &["question", "grade_level", "language"]);
}

#[test]
fn test_planner_and_game_prompt_template_vars() {
    assert_vars("planner.txt", &["topic", "grade_level", "language"]);
    assert_vars("game.txt", &["topic", "grade_level", "language"]);
    assert!(read("game.txt").contains("15 minutes"), "game.txt should bound the game length");
}

#[test]
fn test_analyzer_prompt_template_vars() {
    assert_vars(
        "analyzer.txt",
        &["student_name", "grade_level", "current_month", "previous_months", "monthly_data"],
    );
}

#[test]
fn test_chat_prompt_template_vars() {
    assert_vars("chat_sources.txt", &["sources", "question"]);
    assert!(
        read("chat_sources.txt").contains(classroom_studio::notebook::CHAT_NO_ANSWER),
        "chat_sources.txt should carry the fixed refusal sentence"
    );
}
