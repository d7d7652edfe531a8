//! LLM provider abstraction.
//!
//! `LlmProvider` is an enum over concrete provider implementations.
//! Add a new variant + module in `providers/` for each additional backend.
//!
//! Provider instances are shared immutable capabilities — clone them freely.
//! Enum dispatch keeps `async fn` on the enum so callers need no trait-object
//! machinery.

pub mod providers;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    #[error("provider request failed: {0}")]
    Request(String),
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}

// ── Shared types ──────────────────────────────────────────────────────────────

/// Token accounting reported by the provider, when available.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LlmUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// A chat completion reply with the provider's token accounting.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub text: String,
    pub usage: Option<LlmUsage>,
}

/// A named JSON schema the provider's reply must conform to.
#[derive(Debug, Clone)]
pub struct OutputSchema {
    pub name: &'static str,
    pub schema: Value,
}

impl OutputSchema {
    pub fn new(name: &'static str, schema: Value) -> Self {
        Self { name, schema }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Audio,
}

/// Generated media, carried as a URL (normally a `data:` URI).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaUrl {
    pub kind: MediaKind,
    pub url: String,
}

// ── Provider enum ─────────────────────────────────────────────────────────────

/// All available provider backends.
#[derive(Debug, Clone)]
pub enum LlmProvider {
    Dummy(providers::dummy::DummyProvider),
    OpenAiCompatible(providers::openai_compatible::OpenAiCompatibleProvider),
}

impl LlmProvider {
    /// Short provider name for logs and `/api/health`.
    pub fn name(&self) -> &'static str {
        match self {
            LlmProvider::Dummy(_) => "dummy",
            LlmProvider::OpenAiCompatible(_) => "openai-compatible",
        }
    }

    /// Chat model in use (`"-"` for the dummy provider).
    pub fn model(&self) -> &str {
        match self {
            LlmProvider::Dummy(_) => "-",
            LlmProvider::OpenAiCompatible(p) => p.model(),
        }
    }

    /// Ask for a reply that conforms to `schema` and return the parsed JSON.
    ///
    /// The value is only guaranteed to be JSON; callers deserialise it into
    /// their typed output and check their own invariants.
    pub async fn complete_json(
        &self,
        prompt: &str,
        system: Option<&str>,
        schema: &OutputSchema,
    ) -> Result<Value, ProviderError> {
        match self {
            LlmProvider::Dummy(p) => p.complete_json(prompt, system, schema).await,
            LlmProvider::OpenAiCompatible(p) => p.complete_json(prompt, system, schema).await,
        }
    }

    /// Transcribe the text visible in an image given as a `data:` URI.
    pub async fn transcribe_image(&self, image_data_uri: &str, instruction: &str) -> Result<String, ProviderError> {
        match self {
            LlmProvider::Dummy(p) => p.transcribe_image(image_data_uri, instruction).await,
            LlmProvider::OpenAiCompatible(p) => p.transcribe_image(image_data_uri, instruction).await,
        }
    }

    pub async fn generate_image(&self, prompt: &str) -> Result<MediaUrl, ProviderError> {
        match self {
            LlmProvider::Dummy(p) => p.generate_image(prompt).await,
            LlmProvider::OpenAiCompatible(p) => p.generate_image(prompt).await,
        }
    }

    pub async fn synthesize_speech(&self, text: &str) -> Result<MediaUrl, ProviderError> {
        match self {
            LlmProvider::Dummy(p) => p.synthesize_speech(text).await,
            LlmProvider::OpenAiCompatible(p) => p.synthesize_speech(text).await,
        }
    }

    /// Lightweight reachability check.
    pub async fn ping(&self) -> Result<(), ProviderError> {
        match self {
            LlmProvider::Dummy(_) => Ok(()),
            LlmProvider::OpenAiCompatible(p) => p.ping().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_url_serialises_kind_snake_case() {
        let m = MediaUrl { kind: MediaKind::Audio, url: "data:audio/mpeg;base64,AA==".into() };
        let v = serde_json::to_value(&m).unwrap();
        assert_eq!(v["kind"], "audio");
    }

    #[test]
    fn dummy_reports_name() {
        let p = LlmProvider::Dummy(providers::dummy::DummyProvider);
        assert_eq!(p.name(), "dummy");
        assert_eq!(p.model(), "-");
    }
}
