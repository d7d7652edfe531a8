//! PDF text extraction.
//!
//! Backed by mupdf, which is only built on Unix with the `pdf` feature.
//! Elsewhere [`extract_text`] reports [`IngestError::PdfUnavailable`].

use super::IngestError;

pub const TRUNCATION_MARKER: &str = "\n\n[... text truncated due to length limit ...]";

/// Extract the text of up to `max_pages` pages, separated by
/// `--- Page N ---` headers and capped at `max_chars` characters.
#[cfg(all(unix, feature = "pdf"))]
pub fn extract_text(bytes: &[u8], max_pages: usize, max_chars: usize) -> Result<String, IngestError> {
    use mupdf::Document;

    let document = Document::from_bytes(bytes, "application/pdf")
        .map_err(|e| IngestError::Pdf(format!("cannot open document: {e}")))?;
    let page_count = document
        .page_count()
        .map_err(|e| IngestError::Pdf(format!("cannot count pages: {e}")))?;
    let pages = (page_count.max(0) as usize).min(max_pages);

    let mut texts = Vec::with_capacity(pages);
    for i in 0..pages {
        let page = document
            .load_page(i as i32)
            .map_err(|e| IngestError::Pdf(format!("cannot load page {}: {e}", i + 1)))?;
        let text = page
            .to_text()
            .map_err(|e| IngestError::Pdf(format!("cannot read page {}: {e}", i + 1)))?;
        texts.push(text);
    }

    if pages < page_count.max(0) as usize {
        tracing::debug!(page_count, read = pages, "pdf page limit reached");
    }
    assemble(&texts, max_chars)
}

#[cfg(not(all(unix, feature = "pdf")))]
pub fn extract_text(_bytes: &[u8], _max_pages: usize, _max_chars: usize) -> Result<String, IngestError> {
    Err(IngestError::PdfUnavailable)
}

/// Join per-page text under page headers and enforce the character cap.
/// Fails when no page carries any text (scanned documents, for instance).
#[cfg_attr(not(all(unix, feature = "pdf")), allow(dead_code))]
fn assemble<S: AsRef<str>>(pages: &[S], max_chars: usize) -> Result<String, IngestError> {
    if pages.iter().all(|p| p.as_ref().trim().is_empty()) {
        return Err(IngestError::EmptyText("the PDF contains no extractable text".into()));
    }
    let max_chars = max_chars.max(1);

    let mut full = String::new();
    for (i, text) in pages.iter().enumerate() {
        if full.chars().count() >= max_chars {
            full.push_str(TRUNCATION_MARKER);
            return Ok(full);
        }
        if i > 0 {
            full.push_str("\n\n");
        }
        full.push_str(&format!("--- Page {} ---\n", i + 1));
        full.push_str(text.as_ref().trim_end());
    }

    if full.chars().count() > max_chars {
        let cut = full.char_indices().nth(max_chars).map(|(idx, _)| idx).unwrap_or(full.len());
        full.truncate(cut);
        full.push_str(TRUNCATION_MARKER);
    }
    Ok(full)
}
