//! Dummy LLM provider — deterministic offline replies.
//!
//! Structured completions synthesise a placeholder instance of the requested
//! schema, so every tool round-trips without an API key. Transcription and
//! media calls return fixed markers.

use serde_json::{Map, Value};

use crate::llm::{MediaKind, MediaUrl, OutputSchema, ProviderError};

/// 1×1 transparent PNG.
const PLACEHOLDER_PNG: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";
/// Bare ID3 header; enough for a player to recognise the container.
const PLACEHOLDER_MP3: &str = "data:audio/mpeg;base64,SUQzBAAAAAAAAA==";

#[derive(Debug, Clone)]
pub struct DummyProvider;

impl DummyProvider {
    pub async fn complete_json(
        &self,
        _content: &str,
        _system: Option<&str>,
        schema: &OutputSchema,
    ) -> Result<Value, ProviderError> {
        Ok(placeholder(&schema.schema, schema.name, 0))
    }

    pub async fn transcribe_image(&self, image_data_uri: &str, _instruction: &str) -> Result<String, ProviderError> {
        if !image_data_uri.starts_with("data:image/") {
            return Err(ProviderError::Request("expected an image data URI".into()));
        }
        Ok("[echo] transcribed image text".to_string())
    }

    pub async fn generate_image(&self, _prompt: &str) -> Result<MediaUrl, ProviderError> {
        Ok(MediaUrl { kind: MediaKind::Image, url: PLACEHOLDER_PNG.to_string() })
    }

    pub async fn synthesize_speech(&self, _text: &str) -> Result<MediaUrl, ProviderError> {
        Ok(MediaUrl { kind: MediaKind::Audio, url: PLACEHOLDER_MP3.to_string() })
    }
}

/// Build a value matching `schema`.
///
/// Strings become `"[echo] <field>"`, enums take their first variant, arrays
/// get `max(minItems, 1)` elements, and integers count up from their
/// `minimum` by array position so ordinal fields (day 1, day 2, …) stay ordered.
fn placeholder(schema: &Value, field: &str, index: usize) -> Value {
    if let Some(first) = schema.get("enum").and_then(Value::as_array).and_then(|e| e.first()) {
        return first.clone();
    }

    match schema.get("type").and_then(Value::as_str).unwrap_or("string") {
        "object" => {
            let mut out = Map::new();
            if let Some(props) = schema.get("properties").and_then(Value::as_object) {
                for (name, prop) in props {
                    out.insert(name.clone(), placeholder(prop, name, index));
                }
            }
            Value::Object(out)
        }
        "array" => {
            let count = schema
                .get("minItems")
                .and_then(Value::as_u64)
                .unwrap_or(1)
                .max(1) as usize;
            let items = schema.get("items").cloned().unwrap_or(Value::Null);
            Value::Array((0..count).map(|i| placeholder(&items, field, i)).collect())
        }
        "integer" => {
            let min = schema.get("minimum").and_then(Value::as_i64).unwrap_or(0);
            Value::from(min + index as i64)
        }
        "number" => {
            let min = schema.get("minimum").and_then(Value::as_f64).unwrap_or(0.0);
            Value::from(min)
        }
        "boolean" => Value::Bool(false),
        _ => Value::String(format!("[echo] {field}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn placeholder_fills_object_fields() {
        let schema = json!({
            "type": "object",
            "properties": {
                "story": { "type": "string" },
                "score": { "type": "number" }
            }
        });
        let v = placeholder(&schema, "root", 0);
        assert_eq!(v["story"], "[echo] story");
        assert_eq!(v["score"], 0.0);
    }

    #[test]
    fn placeholder_respects_min_items_and_ordinals() {
        let schema = json!({
            "type": "array",
            "minItems": 5,
            "items": {
                "type": "object",
                "properties": { "day": { "type": "integer", "minimum": 1 } }
            }
        });
        let v = placeholder(&schema, "lesson_plan", 0);
        let days: Vec<i64> = v.as_array().unwrap().iter().map(|d| d["day"].as_i64().unwrap()).collect();
        assert_eq!(days, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn placeholder_uses_first_enum_value() {
        let schema = json!({ "type": "string", "enum": ["improving", "declining", "stable"] });
        assert_eq!(placeholder(&schema, "trend", 0), "improving");
    }

    #[tokio::test]
    async fn transcribe_rejects_non_image() {
        let p = DummyProvider;
        assert!(p.transcribe_image("data:application/pdf;base64,AA==", "read").await.is_err());
        assert!(p.transcribe_image("data:image/png;base64,AA==", "read").await.is_ok());
    }

    #[tokio::test]
    async fn media_placeholders_are_data_uris() {
        let p = DummyProvider;
        let img = p.generate_image("a farm").await.unwrap();
        assert_eq!(img.kind, MediaKind::Image);
        assert!(img.url.starts_with("data:image/png;base64,"));
        let audio = p.synthesize_speech("once upon a time").await.unwrap();
        assert_eq!(audio.kind, MediaKind::Audio);
        assert!(audio.url.starts_with("data:audio/mpeg;base64,"));
    }
}
