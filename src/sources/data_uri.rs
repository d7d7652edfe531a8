//! `data:` URI decoding and content classification.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use super::{IngestError, SourceKind};

/// A decoded `data:` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    /// Lower-cased media type without parameters, e.g. `image/png`.
    /// Empty when the URI omits it.
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Decode `data:<mime>[;param…][;base64],<payload>`.
///
/// Base64 payloads are accepted for every type. Plain (percent-encoded)
/// payloads are only accepted for `text/*`.
pub fn decode_data_uri(uri: &str) -> Result<DataUri, IngestError> {
    let rest = uri
        .trim()
        .strip_prefix("data:")
        .ok_or_else(|| IngestError::InvalidDataUri("missing 'data:' prefix".into()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| IngestError::InvalidDataUri("missing ',' separator".into()))?;

    let mut params = header.split(';');
    let mime = params.next().unwrap_or_default().trim().to_ascii_lowercase();
    let is_base64 = params.any(|p| p.trim().eq_ignore_ascii_case("base64"));

    let bytes = if is_base64 {
        let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        BASE64
            .decode(compact.as_bytes())
            .map_err(|e| IngestError::InvalidDataUri(format!("bad base64 payload: {e}")))?
    } else if mime.starts_with("text/") {
        percent_decode(payload)?
    } else {
        return Err(IngestError::InvalidDataUri(format!(
            "non-base64 payload for {}",
            if mime.is_empty() { "unspecified type" } else { &mime }
        )));
    };

    Ok(DataUri { mime, bytes })
}

fn percent_decode(s: &str) -> Result<Vec<u8>, IngestError> {
    let raw = s.as_bytes();
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'%' {
            let hex = raw
                .get(i + 1..i + 3)
                .and_then(|h| std::str::from_utf8(h).ok())
                .and_then(|h| u8::from_str_radix(h, 16).ok())
                .ok_or_else(|| IngestError::InvalidDataUri(format!("bad percent escape at byte {i}")))?;
            out.push(hex);
            i += 3;
        } else {
            out.push(raw[i]);
            i += 1;
        }
    }
    Ok(out)
}

/// Decide what kind of source `bytes` are.
///
/// The declared MIME type wins when it is recognised; otherwise the leading
/// bytes are sniffed for a PDF header or a known image format.
pub fn classify(mime: &str, bytes: &[u8]) -> Result<SourceKind, IngestError> {
    if mime == "application/pdf" {
        return Ok(SourceKind::Pdf);
    }
    if mime.starts_with("image/") {
        return Ok(SourceKind::Image);
    }
    if mime.starts_with("text/") {
        return Ok(SourceKind::Text);
    }

    if bytes.starts_with(b"%PDF-") {
        return Ok(SourceKind::Pdf);
    }
    if image::guess_format(bytes).is_ok() {
        return Ok(SourceKind::Image);
    }

    Err(IngestError::UnsupportedType(if mime.is_empty() {
        "unknown".to_string()
    } else {
        mime.to_string()
    }))
}
