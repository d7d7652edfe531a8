//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory,
//! then applies `STUDIO_LOG_LEVEL` and `STUDIO_BIND` env overrides.
//! `LLM_API_KEY` is read from the environment only.
//!
//! # Module layout
//!
//! - **types** — Public configuration structs (`Config`, `LlmConfig`, …).
//! - **raw** — Raw TOML deserialization types. These mirror the file shape
//!   and use serde defaults; kept private.
//! - **load** — Loading logic: `merge_toml`, `load_raw_merged`, `load`,
//!   `load_from`, `expand_home`.

mod load;
mod raw;
mod types;

pub use load::{expand_home, load, load_from};
pub use types::*;

impl Config {
    /// Safe `Config` for tests — dummy LLM, no API keys, no external calls.
    pub fn test_default() -> Self {
        Self {
            studio_name: "test".into(),
            log_level: "info".into(),
            log_file: None,
            server: ServerConfig {
                bind: raw::default_bind(),
                request_timeout_seconds: 5,
                max_body_bytes: 4 * 1024 * 1024,
            },
            llm: LlmConfig {
                provider: "dummy".into(),
                openai: OpenAiConfig {
                    api_base_url: "http://localhost:0/v1".into(),
                    model: "test-model".into(),
                    vision_model: "test-model".into(),
                    image_model: "test-image".into(),
                    speech_model: "test-tts".into(),
                    voice: "alloy".into(),
                    temperature: 0.0,
                    timeout_seconds: 1,
                },
            },
            ingest: IngestConfig::default(),
            prompts: PromptsConfig {
                dir: std::path::PathBuf::from(raw::default_prompts_dir()),
            },
            llm_api_key: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    const MINIMAL_TOML: &str = r#"
[studio]
name = "test-studio"
log_level = "info"
"#;

    fn write_toml(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn parse_basic_config() {
        let f = write_toml(MINIMAL_TOML);
        let cfg = load_from(f.path(), None, None).unwrap();
        assert_eq!(cfg.studio_name, "test-studio");
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.llm.provider, "dummy");
        assert_eq!(cfg.server.bind, "127.0.0.1:8080");
    }

    #[test]
    fn empty_file_uses_defaults() {
        let f = write_toml("");
        let cfg = load_from(f.path(), None, None).unwrap();
        assert_eq!(cfg.studio_name, "classroom-studio");
        assert_eq!(cfg.server.request_timeout_seconds, 120);
        assert_eq!(cfg.ingest.max_pdf_text_chars, 100_000);
        assert_eq!(cfg.prompts.dir, std::path::PathBuf::from("config/prompts"));
    }

    #[test]
    fn vision_model_falls_back_to_chat_model() {
        let f = write_toml(
            r#"
[llm.openai]
model = "gpt-4.1-mini"
"#,
        );
        let cfg = load_from(f.path(), None, None).unwrap();
        assert_eq!(cfg.llm.openai.vision_model, "gpt-4.1-mini");
    }

    #[test]
    fn explicit_vision_model_kept() {
        let f = write_toml(
            r#"
[llm.openai]
model = "text-only"
vision_model = "gpt-4o"
"#,
        );
        let cfg = load_from(f.path(), None, None).unwrap();
        assert_eq!(cfg.llm.openai.vision_model, "gpt-4o");
        assert_eq!(cfg.llm.openai.model, "text-only");
    }

    #[test]
    fn api_base_trailing_slash_trimmed() {
        let f = write_toml(
            r#"
[llm.openai]
api_base_url = "http://127.0.0.1:11434/v1/"
"#,
        );
        let cfg = load_from(f.path(), None, None).unwrap();
        assert_eq!(cfg.llm.openai.api_base_url, "http://127.0.0.1:11434/v1");
    }

    #[test]
    fn ingest_limits_parsed() {
        let f = write_toml(
            r#"
[ingest]
max_upload_bytes = 1024
max_pdf_pages = 3
"#,
        );
        let cfg = load_from(f.path(), None, None).unwrap();
        assert_eq!(cfg.ingest.max_upload_bytes, 1024);
        assert_eq!(cfg.ingest.max_pdf_pages, 3);
        assert_eq!(cfg.ingest.max_image_dimension, 2048);
    }

    #[test]
    fn zero_ingest_limits_are_clamped() {
        let f = write_toml(
            r#"
[ingest]
max_pdf_pages = 0
max_pdf_text_chars = 0
max_image_dimension = 0
"#,
        );
        let cfg = load_from(f.path(), None, None).unwrap();
        assert_eq!(cfg.ingest.max_pdf_pages, 1);
        assert_eq!(cfg.ingest.max_pdf_text_chars, 1);
        assert_eq!(cfg.ingest.max_image_dimension, 64);
    }

    #[test]
    fn tilde_expands_to_home() {
        let home = dirs::home_dir().expect("home dir must exist in test env");
        let expanded = expand_home("~/.studio");
        assert!(expanded.starts_with(&home));
        assert!(expanded.ends_with(".studio"));
    }

    #[test]
    fn absolute_path_unchanged() {
        let p = expand_home("/absolute/path");
        assert_eq!(p, std::path::PathBuf::from("/absolute/path"));
    }

    #[test]
    fn missing_file_errors() {
        let result = load_from(std::path::Path::new("/nonexistent/config.toml"), None, None);
        let msg = result.unwrap_err().to_string();
        assert!(msg.contains("config error"));
    }

    #[test]
    fn env_log_level_override() {
        let f = write_toml(MINIMAL_TOML);
        let cfg = load_from(f.path(), Some("debug"), None).unwrap();
        assert_eq!(cfg.log_level, "debug");
    }

    #[test]
    fn env_bind_override() {
        let f = write_toml(MINIMAL_TOML);
        let cfg = load_from(f.path(), None, Some("0.0.0.0:9000")).unwrap();
        assert_eq!(cfg.server.bind, "0.0.0.0:9000");
    }

    const BASE_TOML: &str = r#"
[studio]
name = "base-studio"
log_level = "info"

[llm]
default = "dummy"

[llm.openai]
model = "gpt-base"
temperature = 0.1
timeout_seconds = 30
"#;

    fn write_named(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let p = dir.path().join(name);
        std::fs::write(&p, content).unwrap();
        p
    }

    #[test]
    fn overlay_keeps_base_fields() {
        let dir = TempDir::new().unwrap();
        write_named(&dir, "base.toml", BASE_TOML);
        let overlay = r#"
[meta]
base = "base.toml"

[studio]
log_level = "debug"
"#;
        let overlay_path = write_named(&dir, "overlay.toml", overlay);
        let cfg = load_from(&overlay_path, None, None).unwrap();
        assert_eq!(cfg.studio_name, "base-studio");
        assert_eq!(cfg.log_level, "debug");
    }

    #[test]
    fn overlay_wins_scalar() {
        let dir = TempDir::new().unwrap();
        write_named(&dir, "base.toml", BASE_TOML);
        let overlay = r#"
[meta]
base = "base.toml"

[llm.openai]
model = "gpt-overlay"
"#;
        let overlay_path = write_named(&dir, "overlay.toml", overlay);
        let cfg = load_from(&overlay_path, None, None).unwrap();
        assert_eq!(cfg.llm.openai.model, "gpt-overlay");
        assert_eq!(cfg.llm.openai.temperature, 0.1);
    }

    #[test]
    fn missing_base_errors() {
        let dir = TempDir::new().unwrap();
        let overlay = r#"
[meta]
base = "nonexistent.toml"
"#;
        let overlay_path = write_named(&dir, "overlay.toml", overlay);
        let msg = load_from(&overlay_path, None, None).unwrap_err().to_string();
        assert!(msg.contains("cannot read"));
    }

    #[test]
    fn cycle_detection() {
        let dir = TempDir::new().unwrap();
        let self_path = dir.path().join("self.toml");
        let content = format!("[meta]\nbase = \"{}\"\n\n{BASE_TOML}", self_path.display());
        std::fs::write(&self_path, content).unwrap();
        let msg = load_from(&self_path, None, None).unwrap_err().to_string();
        assert!(msg.contains("circular"));
    }
}
