//! Configuration loading with env-var overrides.
//!
//! Reads TOML files, supports `[meta] base = "..."` inheritance chains,
//! and applies `STUDIO_LOG_LEVEL` and `STUDIO_BIND` env overrides.

use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::AppError;

use super::raw::RawConfig;
use super::types::*;

/// Deep-merge two TOML values.
/// Tables are merged recursively — the overlay only needs to specify keys that
/// differ from the base. For every other type (string, integer, array, …)
/// the overlay value replaces the base value wholesale.
fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_tbl), toml::Value::Table(overlay_tbl)) => {
            for (key, ov_val) in overlay_tbl {
                let merged = match base_tbl.remove(&key) {
                    Some(base_val) => merge_toml(base_val, ov_val),
                    None => ov_val,
                };
                base_tbl.insert(key, merged);
            }
            toml::Value::Table(base_tbl)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file, follow any `[meta] base = "..."` chain, and return the
/// fully merged `toml::Value`. `visited` carries canonicalized paths already
/// seen in this chain so circular references are caught early.
fn load_raw_merged(path: &Path, visited: &mut HashSet<PathBuf>) -> Result<toml::Value, AppError> {
    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    if !visited.insert(canonical) {
        return Err(AppError::Config(format!(
            "circular base reference detected at: {}",
            path.display()
        )));
    }

    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;

    let overlay_val: toml::Value = toml::from_str(&raw)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?;

    if let Some(base_str) = overlay_val
        .get("meta")
        .and_then(|m| m.get("base"))
        .and_then(|b| b.as_str())
    {
        let base_path = if Path::new(base_str).is_absolute() {
            PathBuf::from(base_str)
        } else {
            path.parent().unwrap_or(Path::new(".")).join(base_str)
        };
        let base_val = load_raw_merged(&base_path, visited)?;
        Ok(merge_toml(base_val, overlay_val))
    } else {
        Ok(overlay_val)
    }
}

/// Load config from the given path, or `config/default.toml`, then apply env-var overrides.
/// If no path is given and `config/default.toml` does not exist, the serde defaults apply.
pub fn load(config_path: Option<&str>) -> Result<Config, AppError> {
    let log_level_override = env::var("STUDIO_LOG_LEVEL").ok();
    let bind_override = env::var("STUDIO_BIND").ok();
    let api_key = env::var("LLM_API_KEY").ok().filter(|k| !k.trim().is_empty());

    let path = match config_path {
        Some(p) => Some(PathBuf::from(p)),
        None => {
            let default_path = PathBuf::from("config/default.toml");
            default_path.exists().then_some(default_path)
        }
    };

    let mut config = match path {
        Some(p) => load_from(&p, log_level_override.as_deref(), bind_override.as_deref())?,
        None => resolve(
            RawConfig::default(),
            log_level_override.as_deref(),
            bind_override.as_deref(),
        ),
    };
    config.llm_api_key = api_key;
    Ok(config)
}

/// Internal loader — accepts an explicit path and optional overrides.
/// Tests pass overrides directly instead of mutating env vars.
/// Follows `[meta] base = "..."` inheritance chains before resolving.
pub fn load_from(
    path: &Path,
    log_level_override: Option<&str>,
    bind_override: Option<&str>,
) -> Result<Config, AppError> {
    let merged_val = load_raw_merged(path, &mut HashSet::new())?;

    let parsed: RawConfig = Deserialize::deserialize(merged_val).map_err(|e: toml::de::Error| {
        AppError::Config(format!("config error in {}: {e}", path.display()))
    })?;

    Ok(resolve(parsed, log_level_override, bind_override))
}

fn resolve(parsed: RawConfig, log_level_override: Option<&str>, bind_override: Option<&str>) -> Config {
    let s = parsed.studio;
    let log_level = log_level_override.unwrap_or(&s.log_level).to_string();
    let log_file = s.log_file.as_deref().map(expand_home);

    let defaults = IngestConfig::default();
    let ingest = IngestConfig {
        max_upload_bytes: parsed.ingest.max_upload_bytes.unwrap_or(defaults.max_upload_bytes),
        max_image_dimension: parsed
            .ingest
            .max_image_dimension
            .unwrap_or(defaults.max_image_dimension)
            .max(64),
        max_pdf_pages: parsed.ingest.max_pdf_pages.unwrap_or(defaults.max_pdf_pages).max(1),
        max_pdf_text_chars: parsed
            .ingest
            .max_pdf_text_chars
            .unwrap_or(defaults.max_pdf_text_chars)
            .max(1),
    };

    let oai = parsed.llm.openai;
    let vision_model = oai.vision_model.unwrap_or_else(|| oai.model.clone());

    Config {
        studio_name: s.name,
        log_level,
        log_file,
        server: ServerConfig {
            bind: bind_override.unwrap_or(&parsed.server.bind).to_string(),
            request_timeout_seconds: parsed.server.request_timeout_seconds.max(1),
            max_body_bytes: parsed.server.max_body_bytes,
        },
        llm: LlmConfig {
            provider: parsed.llm.provider,
            openai: OpenAiConfig {
                api_base_url: oai.api_base_url.trim_end_matches('/').to_string(),
                model: oai.model,
                vision_model,
                image_model: oai.image_model,
                speech_model: oai.speech_model,
                voice: oai.voice,
                temperature: oai.temperature,
                timeout_seconds: oai.timeout_seconds,
            },
        },
        ingest,
        prompts: PromptsConfig {
            dir: expand_home(&parsed.prompts.dir),
        },
        llm_api_key: None,
    }
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}
