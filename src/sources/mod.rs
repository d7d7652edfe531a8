//! Source documents and the upload ingestion pipeline.
//!
//! An upload arrives as a `data:` URI, is decoded and classified, then
//! turned into plain text:
//!
//! - **text** — decoded as UTF-8;
//! - **pdf** — page text via mupdf (`pdf` feature);
//! - **image** — normalised to PNG and transcribed by the LLM's vision model.
//!
//! The resulting [`Source`] is what the notebook stores and the chat reads.

pub mod data_uri;
pub mod ocr;
pub mod pdf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::IngestConfig;
use crate::llm::{LlmProvider, ProviderError};
use crate::prompt::{PromptLibrary, Template};

pub use data_uri::{DataUri, classify, decode_data_uri};

/// User-facing text for every ingestion failure.
pub const UPLOAD_FAILED: &str = "Failed to process the uploaded file.";

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("invalid data URI: {0}")]
    InvalidDataUri(String),
    #[error("upload is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },
    #[error("unsupported file type: {0}")]
    UnsupportedType(String),
    #[error("no text: {0}")]
    EmptyText(String),
    #[error("{0} must not be empty")]
    MissingField(&'static str),
    #[error("pdf extraction failed: {0}")]
    Pdf(String),
    #[error("pdf support is not compiled into this build")]
    PdfUnavailable,
    #[error("image processing failed: {0}")]
    Image(String),
    #[error("ocr failed: {0}")]
    Ocr(#[from] ProviderError),
    #[error("ingest worker failed: {0}")]
    Worker(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Text,
    Image,
    Pdf,
}

#[derive(Debug, Clone, Serialize)]
pub struct Source {
    pub id: Uuid,
    pub name: String,
    pub content: String,
    pub kind: SourceKind,
    pub is_selected: bool,
}

impl Source {
    /// New sources start selected.
    pub fn new(name: impl Into<String>, content: impl Into<String>, kind: SourceKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            content: content.into(),
            kind,
            is_selected: true,
        }
    }
}

/// Build a text source from pasted content.
pub fn text_source(name: &str, content: &str) -> Result<Source, IngestError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(IngestError::MissingField("name"));
    }
    if content.trim().is_empty() {
        return Err(IngestError::MissingField("content"));
    }
    Ok(Source::new(name, content.trim(), SourceKind::Text))
}

/// Turns uploaded files into text [`Source`]s.
#[derive(Debug, Clone)]
pub struct Ingestor {
    limits: IngestConfig,
}

impl Ingestor {
    pub fn new(limits: IngestConfig) -> Self {
        Self { limits }
    }

    /// Decode, classify and extract `data_uri` into a selected source named `name`.
    pub async fn ingest(
        &self,
        llm: &LlmProvider,
        prompts: &PromptLibrary,
        name: &str,
        data_uri: &str,
    ) -> Result<Source, IngestError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(IngestError::MissingField("name"));
        }

        let DataUri { mime, bytes } = decode_data_uri(data_uri)?;
        if bytes.len() > self.limits.max_upload_bytes {
            return Err(IngestError::TooLarge { size: bytes.len(), limit: self.limits.max_upload_bytes });
        }
        let kind = classify(&mime, &bytes)?;
        debug!(name, %mime, ?kind, size = bytes.len(), "ingesting upload");

        let content = match kind {
            SourceKind::Text => String::from_utf8(bytes)
                .map_err(|_| IngestError::InvalidDataUri("text payload is not valid UTF-8".into()))?,
            SourceKind::Pdf => {
                let (pages, chars) = (self.limits.max_pdf_pages, self.limits.max_pdf_text_chars);
                tokio::task::spawn_blocking(move || pdf::extract_text(&bytes, pages, chars))
                    .await
                    .map_err(|e| IngestError::Worker(format!("pdf task panicked: {e}")))??
            }
            SourceKind::Image => {
                let max_dim = self.limits.max_image_dimension;
                let png_uri = tokio::task::spawn_blocking(move || ocr::prepare_for_ocr(&bytes, max_dim))
                    .await
                    .map_err(|e| IngestError::Worker(format!("image task panicked: {e}")))??;
                let instruction = prompts.builder(Template::Ocr).build();
                llm.transcribe_image(&png_uri, &instruction).await?
            }
        };

        if content.trim().is_empty() {
            return Err(IngestError::EmptyText(format!("{name} produced no text")));
        }

        info!(name, ?kind, chars = content.chars().count(), "source ingested");
        Ok(Source::new(name, content.trim(), kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing;
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD as BASE64;

    fn ingestor() -> Ingestor {
        Ingestor::new(IngestConfig::default())
    }

    fn uri(mime: &str, bytes: &[u8]) -> String {
        format!("data:{mime};base64,{}", BASE64.encode(bytes))
    }

    #[test]
    fn text_source_trims_and_selects() {
        let s = text_source("  Notes ", "  Photosynthesis makes food.\n").unwrap();
        assert_eq!(s.name, "Notes");
        assert_eq!(s.content, "Photosynthesis makes food.");
        assert_eq!(s.kind, SourceKind::Text);
        assert!(s.is_selected);
    }

    #[test]
    fn text_source_requires_name_and_content() {
        assert!(matches!(text_source(" ", "body"), Err(IngestError::MissingField("name"))));
        assert!(matches!(text_source("n", "  "), Err(IngestError::MissingField("content"))));
    }

    #[test]
    fn kind_serialises_lowercase() {
        assert_eq!(serde_json::to_value(SourceKind::Pdf).unwrap(), "pdf");
    }

    #[tokio::test]
    async fn ingests_text_upload() {
        let s = ingestor()
            .ingest(&testing::dummy(), &testing::prompts(), "notes.txt", &uri("text/plain", b"The water cycle."))
            .await
            .unwrap();
        assert_eq!(s.kind, SourceKind::Text);
        assert_eq!(s.content, "The water cycle.");
    }

    #[tokio::test]
    async fn ingests_image_through_ocr() {
        let png = ocr::sample_png(8, 8);
        let s = ingestor()
            .ingest(&testing::dummy(), &testing::prompts(), "board.png", &uri("image/png", &png))
            .await
            .unwrap();
        assert_eq!(s.kind, SourceKind::Image);
        assert_eq!(s.content, "[echo] transcribed image text");
    }

    #[tokio::test]
    async fn rejects_oversized_upload() {
        let mut limits = IngestConfig::default();
        limits.max_upload_bytes = 4;
        let err = Ingestor::new(limits)
            .ingest(&testing::dummy(), &testing::prompts(), "big.txt", &uri("text/plain", b"too long"))
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::TooLarge { size: 8, limit: 4 }));
    }

    #[tokio::test]
    async fn rejects_unsupported_type() {
        let err = ingestor()
            .ingest(&testing::dummy(), &testing::prompts(), "a.zip", &uri("application/zip", b"PK\x03\x04"))
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::UnsupportedType(_)));
    }

    #[tokio::test]
    async fn rejects_invalid_utf8_text() {
        let err = ingestor()
            .ingest(&testing::dummy(), &testing::prompts(), "bin.txt", &uri("text/plain", &[0xff, 0xfe]))
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::InvalidDataUri(_)));
    }

    #[tokio::test]
    async fn rejects_blank_text() {
        let err = ingestor()
            .ingest(&testing::dummy(), &testing::prompts(), "blank.txt", &uri("text/plain", b"   "))
            .await
            .unwrap_err();
        assert!(matches!(err, IngestError::EmptyText(_)));
    }
}
