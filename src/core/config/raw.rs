//! Raw TOML deserialization types.
//!
//! These structs mirror the TOML file shape and use `serde` defaults.
//! The `load` module converts them into the public `types` structs.

use serde::Deserialize;

// ── Top-level ────────────────────────────────────────────────────────────────

/// Raw TOML shape — serde target before resolution.
#[derive(Deserialize, Default)]
pub(super) struct RawConfig {
    #[serde(default)]
    pub studio: RawStudio,
    #[serde(default)]
    pub server: RawServer,
    #[serde(default)]
    pub llm: RawLlm,
    #[serde(default)]
    pub ingest: RawIngest,
    #[serde(default)]
    pub prompts: RawPrompts,
}

#[derive(Deserialize)]
pub(super) struct RawStudio {
    #[serde(default = "default_studio_name")]
    pub name: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_file: Option<String>,
}

impl Default for RawStudio {
    fn default() -> Self {
        Self {
            name: default_studio_name(),
            log_level: default_log_level(),
            log_file: None,
        }
    }
}

// ── Server ──────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawServer {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for RawServer {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            request_timeout_seconds: default_request_timeout_seconds(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

// ── LLM ─────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawLlm {
    #[serde(rename = "default", default = "default_llm_provider")]
    pub provider: String,
    #[serde(default)]
    pub openai: RawOpenAiConfig,
}

impl Default for RawLlm {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            openai: RawOpenAiConfig::default(),
        }
    }
}

#[derive(Deserialize)]
pub(super) struct RawOpenAiConfig {
    #[serde(default = "default_openai_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_openai_model")]
    pub model: String,
    #[serde(default)]
    pub vision_model: Option<String>,
    #[serde(default = "default_openai_image_model")]
    pub image_model: String,
    #[serde(default = "default_openai_speech_model")]
    pub speech_model: String,
    #[serde(default = "default_openai_voice")]
    pub voice: String,
    #[serde(default = "default_openai_temperature")]
    pub temperature: f32,
    #[serde(default = "default_openai_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for RawOpenAiConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_openai_api_base_url(),
            model: default_openai_model(),
            vision_model: None,
            image_model: default_openai_image_model(),
            speech_model: default_openai_speech_model(),
            voice: default_openai_voice(),
            temperature: default_openai_temperature(),
            timeout_seconds: default_openai_timeout_seconds(),
        }
    }
}

// ── Ingest ───────────────────────────────────────────────────────────────────

#[derive(Deserialize, Default)]
pub(super) struct RawIngest {
    pub max_upload_bytes: Option<usize>,
    pub max_image_dimension: Option<u32>,
    pub max_pdf_pages: Option<usize>,
    pub max_pdf_text_chars: Option<usize>,
}

// ── Prompts ──────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawPrompts {
    #[serde(default = "default_prompts_dir")]
    pub dir: String,
}

impl Default for RawPrompts {
    fn default() -> Self {
        Self { dir: default_prompts_dir() }
    }
}

// ── Default functions (used by serde) ────────────────────────────────────────

fn default_studio_name() -> String {
    "classroom-studio".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

pub(super) fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_request_timeout_seconds() -> u64 {
    120
}

fn default_max_body_bytes() -> usize {
    20 * 1024 * 1024
}

fn default_llm_provider() -> String {
    "dummy".to_string()
}

fn default_openai_api_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_openai_image_model() -> String {
    "gpt-image-1".to_string()
}
fn default_openai_speech_model() -> String {
    "gpt-4o-mini-tts".to_string()
}
fn default_openai_voice() -> String {
    "alloy".to_string()
}
fn default_openai_temperature() -> f32 {
    0.7
}
fn default_openai_timeout_seconds() -> u64 {
    90
}

pub(super) fn default_prompts_dir() -> String {
    "config/prompts".to_string()
}
