//! OpenAI-compatible provider.
//!
//! Talks to `{api_base_url}/chat/completions` for text, structured JSON and
//! image transcription, `{api_base_url}/images/generations` for pictures and
//! `{api_base_url}/audio/speech` for narration. All wire types are private to
//! this module — callers never see them.

use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, error, trace};

use crate::config::OpenAiConfig;
use crate::llm::{LlmResponse, LlmUsage, MediaKind, MediaUrl, OutputSchema, ProviderError};

// ── Public provider ───────────────────────────────────────────────────────────

/// Adapter for any HTTP API implementing the OpenAI REST surface.
///
/// Covers OpenAI itself, local servers (Ollama, LM Studio…) and hosted
/// alternatives. Constructed once at startup, then cheaply cloned because
/// `reqwest::Client` is an `Arc` internally.
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleProvider {
    client: Client,
    api_base_url: String,
    model: String,
    vision_model: String,
    image_model: String,
    speech_model: String,
    voice: String,
    temperature: f32,
    api_key: Option<String>,
}

impl OpenAiCompatibleProvider {
    /// Build a provider from config values and an optional API key.
    ///
    /// `api_key` is `None` for keyless local models. When present it is sent
    /// as `Authorization: Bearer <key>` on every request.
    pub fn new(config: &OpenAiConfig, api_key: Option<String>) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| ProviderError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            vision_model: config.vision_model.clone(),
            image_model: config.image_model.clone(),
            speech_model: config.speech_model.clone(),
            voice: config.voice.clone(),
            temperature: config.temperature,
            api_key,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base_url, path)
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        let req = self.client.post(self.endpoint(path));
        match &self.api_key {
            Some(key) => req.bearer_auth(key),
            None => req,
        }
    }

    /// Lightweight reachability check.
    ///
    /// Any HTTP response (including 4xx) means the server is reachable. Only a
    /// transport-level failure counts as unreachable. Hard 5-second timeout.
    pub async fn ping(&self) -> Result<(), ProviderError> {
        let mut req = self.client.get(self.endpoint("models")).timeout(Duration::from_secs(5));
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        req.send()
            .await
            .map(|_| ())
            .map_err(|e| ProviderError::Request(format!("unreachable: {e}")))
    }

    /// Request a reply constrained by `schema` via `response_format`.
    pub async fn complete_json(
        &self,
        content: &str,
        system: Option<&str>,
        schema: &OutputSchema,
    ) -> Result<Value, ProviderError> {
        let response_format = json!({
            "type": "json_schema",
            "json_schema": {
                "name": schema.name,
                "schema": schema.schema,
                "strict": true,
            }
        });
        let payload = self.chat_request(&self.model, content_messages(content, system), Some(response_format));
        let reply = self.send_chat(payload).await?;
        parse_json_reply(&reply.text)
    }

    /// OCR through a vision-capable chat model.
    pub async fn transcribe_image(&self, image_data_uri: &str, instruction: &str) -> Result<String, ProviderError> {
        let messages = vec![Message {
            role: "user",
            content: MessageContent::Parts(vec![
                ContentPart::Text { text: instruction.to_string() },
                ContentPart::ImageUrl { image_url: ImageUrl { url: image_data_uri.to_string() } },
            ]),
        }];
        let payload = self.chat_request(&self.vision_model, messages, None);
        Ok(self.send_chat(payload).await?.text)
    }

    pub async fn generate_image(&self, prompt: &str) -> Result<MediaUrl, ProviderError> {
        let payload = json!({
            "model": self.image_model,
            "prompt": prompt,
            "n": 1,
            "size": "1024x1024",
        });
        debug!(model = %self.image_model, prompt_len = prompt.len(), "sending image generation request");

        let response = self.post("images/generations").json(&payload).send().await.map_err(transport_error)?;
        let parsed = check_status(response)
            .await?
            .json::<ImageGenerationResponse>()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("failed to parse image response: {e}")))?;

        let first = parsed
            .data
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::InvalidResponse("image response had no data".into()))?;

        let url = match (first.b64_json, first.url) {
            (Some(b64), _) => format!("data:image/png;base64,{b64}"),
            (None, Some(url)) => url,
            (None, None) => return Err(ProviderError::InvalidResponse("image response had neither b64_json nor url".into())),
        };
        Ok(MediaUrl { kind: MediaKind::Image, url })
    }

    pub async fn synthesize_speech(&self, text: &str) -> Result<MediaUrl, ProviderError> {
        let payload = json!({
            "model": self.speech_model,
            "input": text,
            "voice": self.voice,
            "response_format": "mp3",
        });
        debug!(model = %self.speech_model, text_len = text.len(), "sending speech request");

        let response = self.post("audio/speech").json(&payload).send().await.map_err(transport_error)?;
        let bytes = check_status(response)
            .await?
            .bytes()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("failed to read audio body: {e}")))?;
        if bytes.is_empty() {
            return Err(ProviderError::InvalidResponse("empty audio body".into()));
        }
        Ok(MediaUrl {
            kind: MediaKind::Audio,
            url: format!("data:audio/mpeg;base64,{}", BASE64.encode(&bytes)),
        })
    }

    fn chat_request(&self, model: &str, messages: Vec<Message>, response_format: Option<Value>) -> ChatCompletionRequest {
        // Some models (gpt-5 family) do not accept a temperature parameter.
        let temperature = if model.starts_with("gpt-5") { None } else { Some(self.temperature) };
        ChatCompletionRequest {
            model: model.to_string(),
            messages,
            temperature,
            response_format,
        }
    }

    async fn send_chat(&self, payload: ChatCompletionRequest) -> Result<LlmResponse, ProviderError> {
        debug!(
            model = %payload.model,
            temperature = ?payload.temperature,
            structured = payload.response_format.is_some(),
            "sending LLM request"
        );
        if tracing::enabled!(tracing::Level::TRACE) {
            let json = serde_json::to_string_pretty(&payload)
                .unwrap_or_else(|e| format!("<serialization failed: {e}>"));
            trace!(payload = %json, "full LLM request payload");
        }

        let response = self
            .post("chat/completions")
            .json(&payload)
            .send()
            .await
            .map_err(transport_error)?;

        let parsed = check_status(response)
            .await?
            .json::<ChatCompletionResponse>()
            .await
            .map_err(|e| {
                error!(error = %e, "failed to deserialize LLM response");
                ProviderError::InvalidResponse(format!("failed to parse response body: {e}"))
            })?;

        debug!(choices = parsed.choices.len(), "received LLM response");

        let reply = into_reply(parsed)?;
        if let Some(usage) = reply.usage {
            debug!(
                model = %payload.model,
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                "LLM token usage"
            );
        }
        Ok(reply)
    }
}

fn into_reply(parsed: ChatCompletionResponse) -> Result<LlmResponse, ProviderError> {
    let text = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ProviderError::InvalidResponse("empty or missing content in response".into()))?;

    let usage = parsed.usage.map(|u| LlmUsage {
        input_tokens: u.prompt_tokens,
        output_tokens: u.completion_tokens,
    });

    Ok(LlmResponse { text, usage })
}

fn content_messages(content: &str, system: Option<&str>) -> Vec<Message> {
    let mut messages = Vec::with_capacity(2);
    if let Some(sys) = system {
        messages.push(Message { role: "system", content: MessageContent::Text(sys.to_string()) });
    }
    messages.push(Message { role: "user", content: MessageContent::Text(content.to_string()) });
    messages
}

fn transport_error(e: reqwest::Error) -> ProviderError {
    error!(error = %e, timeout = e.is_timeout(), "LLM HTTP request failed (transport)");
    ProviderError::Request(e.to_string())
}

/// Parse a structured reply, tolerating a Markdown code fence around the JSON.
fn parse_json_reply(text: &str) -> Result<Value, ProviderError> {
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();
    serde_json::from_str(body)
        .map_err(|e| ProviderError::InvalidResponse(format!("reply is not valid JSON: {e}")))
}

// ── Private wire types ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct Message {
    role: &'static str,
    content: MessageContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<UsageData>,
}

#[derive(Debug, Deserialize)]
struct UsageData {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImageGenerationResponse {
    #[serde(default)]
    data: Vec<ImageDatum>,
}

#[derive(Debug, Deserialize)]
struct ImageDatum {
    #[serde(default)]
    b64_json: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

// Error envelope used by OpenAI and compatible APIs.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(default)]
    code: Option<Value>,
}

fn describe_error_body(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(env) => {
            let code = env
                .error
                .code
                .map(|v| match v {
                    Value::String(s) => format!(" [code={s}]"),
                    other => format!(" [code={other}]"),
                })
                .unwrap_or_default();
            format!("HTTP {status}{code}: {}", env.error.message)
        }
        Err(_) => format!("HTTP {status}: {body}"),
    }
}

/// Consume the response and return it if successful, or a structured error.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read error body>".to_string());
    let message = describe_error_body(status, &body);

    error!(%status, %message, "LLM request returned HTTP error");
    Err(ProviderError::Request(message))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> OpenAiCompatibleProvider {
        OpenAiCompatibleProvider::new(&crate::config::Config::test_default().llm.openai, None).unwrap()
    }

    #[test]
    fn constructs_provider() {
        let p = provider();
        assert_eq!(p.model(), "test-model");
        assert_eq!(p.endpoint("chat/completions"), "http://localhost:0/v1/chat/completions");
    }

    #[test]
    fn parses_plain_json_reply() {
        let v = parse_json_reply(r#"{"story":"Once"}"#).unwrap();
        assert_eq!(v["story"], "Once");
    }

    #[test]
    fn parses_fenced_json_reply() {
        let v = parse_json_reply("```json\n{\"answer\": \"42\"}\n```").unwrap();
        assert_eq!(v["answer"], "42");
        let v = parse_json_reply("```\n[1,2]\n```").unwrap();
        assert_eq!(v[1], 2);
    }

    #[test]
    fn rejects_prose_reply() {
        let err = parse_json_reply("Sure! Here is your story.").unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(_)));
    }

    #[test]
    fn vision_message_serialises_content_parts() {
        let msg = Message {
            role: "user",
            content: MessageContent::Parts(vec![
                ContentPart::Text { text: "read".into() },
                ContentPart::ImageUrl { image_url: ImageUrl { url: "data:image/png;base64,AA==".into() } },
            ]),
        };
        let v = serde_json::to_value(&msg).unwrap();
        assert_eq!(v["content"][0]["type"], "text");
        assert_eq!(v["content"][1]["type"], "image_url");
        assert_eq!(v["content"][1]["image_url"]["url"], "data:image/png;base64,AA==");
    }

    #[test]
    fn gpt5_omits_temperature() {
        let p = provider();
        let req = p.chat_request("gpt-5-mini", content_messages("hi", None), None);
        let v = serde_json::to_value(&req).unwrap();
        assert!(v.get("temperature").is_none());
        assert!(v.get("response_format").is_none());
    }

    #[test]
    fn error_envelope_decoded() {
        let msg = describe_error_body(
            reqwest::StatusCode::UNAUTHORIZED,
            r#"{"error":{"message":"bad key","code":"invalid_api_key"}}"#,
        );
        assert_eq!(msg, "HTTP 401 Unauthorized [code=invalid_api_key]: bad key");
    }

    #[test]
    fn reply_keeps_token_usage() {
        let parsed: ChatCompletionResponse = serde_json::from_value(json!({
            "choices": [{ "message": { "content": "  {\"answer\":\"yes\"}  " } }],
            "usage": { "prompt_tokens": 120, "completion_tokens": 8, "total_tokens": 128 }
        }))
        .unwrap();
        let reply = into_reply(parsed).unwrap();
        assert_eq!(reply.text, r#"{"answer":"yes"}"#);
        assert_eq!(reply.usage, Some(LlmUsage { input_tokens: 120, output_tokens: 8 }));
    }

    #[test]
    fn reply_without_content_is_invalid() {
        let parsed: ChatCompletionResponse =
            serde_json::from_value(json!({ "choices": [{ "message": { "content": null } }] })).unwrap();
        assert!(matches!(into_reply(parsed), Err(ProviderError::InvalidResponse(_))));
    }

    #[test]
    fn error_body_passthrough() {
        let msg = describe_error_body(reqwest::StatusCode::BAD_GATEWAY, "upstream down");
        assert!(msg.ends_with("upstream down"));
    }
}
