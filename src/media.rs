//! Optional media for generated content: story illustrations, game-board
//! pictures and spoken narration.
//!
//! Media is requested separately from the text tools so a slow image or
//! audio call never holds up the main result.

use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use crate::error::AppError;
use crate::llm::{LlmProvider, MediaUrl};
use crate::tools::ValidationError;
use crate::tools::story::illustration_prompt;

/// Longest text the speech endpoint accepts in one request.
pub const MAX_SPEECH_CHARS: usize = 4096;

pub const IMAGE_FAILED: &str = "Failed to generate image. Please try again.";
pub const SPEECH_FAILED: &str = "Failed to generate audio. Please try again.";

/// Chat message that should carry the generated media.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct AttachTarget {
    pub notebook_id: Uuid,
    pub message_id: Uuid,
}

/// `POST /api/media/image`. Either a free-form `prompt` (e.g. a game's
/// `game_board_image_prompt`) or a `story_topic` to illustrate.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub story_topic: Option<String>,
    #[serde(default)]
    pub attach_to: Option<AttachTarget>,
}

impl ImageRequest {
    /// The prompt actually sent to the image model.
    pub fn resolve_prompt(&self) -> Result<String, ValidationError> {
        let non_empty = |s: &Option<String>| s.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);
        if let Some(topic) = non_empty(&self.story_topic) {
            return Ok(illustration_prompt(&topic));
        }
        non_empty(&self.prompt).ok_or_else(|| ValidationError::field("prompt", "An image prompt or story topic is required."))
    }
}

/// `POST /api/media/speech`.
#[derive(Debug, Clone, Deserialize)]
pub struct SpeechRequest {
    pub text: String,
    #[serde(default)]
    pub attach_to: Option<AttachTarget>,
}

impl SpeechRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let chars = self.text.trim().chars().count();
        if chars == 0 {
            return Err(ValidationError::field("text", "Text to narrate is required."));
        }
        if chars > MAX_SPEECH_CHARS {
            return Err(ValidationError::field(
                "text",
                format!("Text to narrate must be at most {MAX_SPEECH_CHARS} characters."),
            ));
        }
        Ok(())
    }
}

pub async fn generate_image(llm: &LlmProvider, req: &ImageRequest) -> Result<MediaUrl, AppError> {
    let prompt = req.resolve_prompt()?;
    debug!(prompt_len = prompt.len(), "generating image");
    Ok(llm.generate_image(&prompt).await?)
}

pub async fn narrate(llm: &LlmProvider, req: &SpeechRequest) -> Result<MediaUrl, AppError> {
    req.validate()?;
    debug!(chars = req.text.trim().chars().count(), "synthesizing speech");
    Ok(llm.synthesize_speech(req.text.trim()).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MediaKind;
    use crate::tools::testing;

    #[test]
    fn story_topic_wins_over_prompt() {
        let req = ImageRequest {
            prompt: Some("ignored".into()),
            story_topic: Some("a kite festival".into()),
            attach_to: None,
        };
        let p = req.resolve_prompt().unwrap();
        assert!(p.starts_with("A beautiful, whimsical, and child-friendly illustration"));
        assert!(p.contains("\"a kite festival\""));
    }

    #[test]
    fn raw_prompt_used_verbatim() {
        let req = ImageRequest { prompt: Some(" a snakes and ladders board ".into()), ..Default::default() };
        assert_eq!(req.resolve_prompt().unwrap(), "a snakes and ladders board");
    }

    #[test]
    fn empty_image_request_rejected() {
        let req = ImageRequest { prompt: Some("  ".into()), ..Default::default() };
        assert!(req.resolve_prompt().unwrap_err().is_input());
    }

    #[test]
    fn speech_length_limits() {
        let ok = SpeechRequest { text: "Once upon a time".into(), attach_to: None };
        assert!(ok.validate().is_ok());
        let empty = SpeechRequest { text: " ".into(), attach_to: None };
        assert!(empty.validate().is_err());
        let long = SpeechRequest { text: "a".repeat(MAX_SPEECH_CHARS + 1), attach_to: None };
        assert!(long.validate().is_err());
    }

    #[tokio::test]
    async fn dummy_media_round_trip() {
        let img = generate_image(&testing::dummy(), &ImageRequest { story_topic: Some("rain".into()), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(img.kind, MediaKind::Image);
        let audio = narrate(&testing::dummy(), &SpeechRequest { text: "Hello class".into(), attach_to: None })
            .await
            .unwrap();
        assert_eq!(audio.kind, MediaKind::Audio);
    }
}
