//! LLM provider implementations.
//!
//! `build(config, api_key)` is the factory — called at startup.
//! Adding a new backend = new module + new match arm.

pub mod dummy;
pub mod openai_compatible;

use tracing::warn;

use crate::config::LlmConfig;
use crate::llm::{LlmProvider, ProviderError};

/// Construct a `LlmProvider` from config and an optional API key.
///
/// `api_key` is sourced from `LLM_API_KEY` env (never TOML) and is `None`
/// for keyless local models.
pub fn build(config: &LlmConfig, api_key: Option<String>) -> Result<LlmProvider, ProviderError> {
    match config.provider.as_str() {
        "dummy" => Ok(LlmProvider::Dummy(dummy::DummyProvider)),
        "openai" | "openai-compatible" => {
            if api_key.is_none() && config.openai.api_base_url.contains("api.openai.com") {
                warn!("LLM_API_KEY is not set; requests to api.openai.com will be rejected");
            }
            let p = openai_compatible::OpenAiCompatibleProvider::new(&config.openai, api_key)?;
            Ok(LlmProvider::OpenAiCompatible(p))
        }
        other => Err(ProviderError::UnknownProvider(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn builds_dummy() {
        let cfg = Config::test_default();
        assert!(matches!(build(&cfg.llm, None).unwrap(), LlmProvider::Dummy(_)));
    }

    #[test]
    fn builds_openai_compatible() {
        let mut cfg = Config::test_default();
        cfg.llm.provider = "openai-compatible".into();
        let p = build(&cfg.llm, Some("sk-test".into())).unwrap();
        assert_eq!(p.name(), "openai-compatible");
        assert_eq!(p.model(), "test-model");
    }

    #[test]
    fn unknown_provider_errors() {
        let mut cfg = Config::test_default();
        cfg.llm.provider = "gemini-nano".into();
        let err = build(&cfg.llm, None).unwrap_err();
        assert!(matches!(err, ProviderError::UnknownProvider(name) if name == "gemini-nano"));
    }
}
