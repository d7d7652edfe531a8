//! Public configuration types.
//!
//! These are the resolved, ready-to-use structs the rest of the crate
//! consumes. Raw TOML deserialization types live in `raw.rs`.

use std::path::PathBuf;

// ── Server ──────────────────────────────────────────────────────────────────

/// HTTP server configuration (`[server]`).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address the axum listener binds to.
    pub bind: String,
    /// Upper bound for a single API request, LLM round-trip included.
    pub request_timeout_seconds: u64,
    /// Maximum accepted request body size in bytes (uploads arrive as data URIs).
    pub max_body_bytes: usize,
}

// ── LLM ──────────────────────────────────────────────────────────────────────

/// OpenAI / OpenAI-compatible provider configuration.
/// Populated from `[llm.openai]` in the TOML.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// API base URL, without a trailing endpoint (e.g. `https://api.openai.com/v1`).
    pub api_base_url: String,
    /// Chat model used for text and structured generation.
    pub model: String,
    /// Vision-capable chat model used to transcribe uploaded images.
    pub vision_model: String,
    /// Image generation model.
    pub image_model: String,
    /// Text-to-speech model.
    pub speech_model: String,
    /// Text-to-speech voice name.
    pub voice: String,
    /// Sampling temperature (ignored for models that forbid it).
    pub temperature: f32,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
}

/// LLM configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Which provider is active (e.g. `"dummy"`, `"openai"`).
    pub provider: String,
    /// Config for the OpenAI / OpenAI-compatible provider (`[llm.openai]`).
    pub openai: OpenAiConfig,
}

// ── Ingest ───────────────────────────────────────────────────────────────────

/// Limits applied when turning uploaded files into source text (`[ingest]`).
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Largest decoded upload accepted, in bytes.
    pub max_upload_bytes: usize,
    /// Images are downscaled to fit this many pixels on their longest side before OCR.
    pub max_image_dimension: u32,
    /// Pages read from a PDF before the rest are ignored.
    pub max_pdf_pages: usize,
    /// Extracted PDF text is truncated past this many characters.
    pub max_pdf_text_chars: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: 10 * 1024 * 1024,
            max_image_dimension: 2048,
            max_pdf_pages: 50,
            max_pdf_text_chars: 100_000,
        }
    }
}

// ── Prompts ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct PromptsConfig {
    /// Directory holding prompt template overrides.
    pub dir: PathBuf,
}

// ── Config (root) ────────────────────────────────────────────────────────────

/// Fully-resolved studio configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub studio_name: String,
    pub log_level: String,
    /// Append log output to this file instead of stderr.
    pub log_file: Option<PathBuf>,
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub ingest: IngestConfig,
    pub prompts: PromptsConfig,
    /// API key from `LLM_API_KEY` env var — never sourced from TOML.
    pub llm_api_key: Option<String>,
}
