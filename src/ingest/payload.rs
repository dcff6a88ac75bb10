//! AI request payload construction.
//!
//! Files fall into a closed set of content categories; each category maps
//! to one of two payload shapes: inline base64 bytes with a MIME type, or
//! descriptive text.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

/// Text-like content larger than this is truncated before being sent to
/// the AI, to stay within token limits.
const MAX_TEXT_CHARS: usize = 10_000;

const TRUNCATION_MARKER: &str = "\n...[TRUNCATED]";

/// Content category of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentCategory {
    /// Sent as inline bytes (screenshots, scans)
    Image,
    /// Sent as text content (logs, JSON, markdown, emails, PDFs)
    TextLike,
    /// Only name/type/size metadata is sent (audio, video, unknown binaries)
    Binary,
}

impl ContentCategory {
    /// Classify by MIME type, falling back to the file name extension for
    /// sources that report a generic type.
    pub fn classify(mime_type: &str, name: &str) -> Self {
        if mime_type.starts_with("image/") {
            return Self::Image;
        }
        let text_mime = mime_type.starts_with("text/")
            || matches!(mime_type, "application/json" | "application/xml" | "application/pdf");
        let text_ext = [".log", ".md", ".json", ".xml", ".eml"]
            .iter()
            .any(|ext| name.to_lowercase().ends_with(ext));
        if text_mime || text_ext {
            Self::TextLike
        } else {
            Self::Binary
        }
    }
}

/// One part of a generative-AI request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadPart {
    /// Base64-encoded bytes plus their MIME type
    InlineData { mime_type: String, data: String },
    /// Plain descriptive text
    Text(String),
}

/// Build the payload part for a file.
///
/// Images go inline; text-like files go as (possibly truncated) text with
/// the file name prepended; everything else, including text-like files
/// whose bytes are not valid UTF-8, degrades to a metadata description.
pub fn file_payload(name: &str, mime_type: &str, content: &[u8]) -> PayloadPart {
    match ContentCategory::classify(mime_type, name) {
        ContentCategory::Image => PayloadPart::InlineData {
            mime_type: mime_type.to_string(),
            data: BASE64.encode(content),
        },
        ContentCategory::TextLike => match std::str::from_utf8(content) {
            Ok(text) => PayloadPart::Text(format!("File Name: {name}\n\n{}", truncate(text))),
            Err(_) => PayloadPart::Text(metadata_text(name, mime_type, content.len())),
        },
        ContentCategory::Binary => {
            PayloadPart::Text(metadata_text(name, mime_type, content.len()))
        }
    }
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_TEXT_CHARS {
        return text.to_string();
    }
    let mut out: String = text.chars().take(MAX_TEXT_CHARS).collect();
    out.push_str(TRUNCATION_MARKER);
    out
}

fn metadata_text(name: &str, mime_type: &str, size: usize) -> String {
    format!("File metadata: Name: {name}, Type: {mime_type}, Size: {size} bytes.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_image() {
        assert_eq!(ContentCategory::classify("image/png", "shot.png"), ContentCategory::Image);
    }

    #[test]
    fn test_classify_text_by_mime() {
        assert_eq!(ContentCategory::classify("text/plain", "a.txt"), ContentCategory::TextLike);
        assert_eq!(
            ContentCategory::classify("application/json", "a.json"),
            ContentCategory::TextLike
        );
        assert_eq!(
            ContentCategory::classify("application/pdf", "ticket.pdf"),
            ContentCategory::TextLike
        );
    }

    #[test]
    fn test_classify_text_by_extension() {
        assert_eq!(
            ContentCategory::classify("application/octet-stream", "pacs.LOG"),
            ContentCategory::TextLike
        );
    }

    #[test]
    fn test_classify_binary() {
        assert_eq!(ContentCategory::classify("audio/wav", "dictation.wav"), ContentCategory::Binary);
        assert_eq!(
            ContentCategory::classify("application/octet-stream", "blob.bin"),
            ContentCategory::Binary
        );
    }

    #[test]
    fn test_image_payload_is_base64() {
        let part = file_payload("s.png", "image/png", &[0x89, 0x50, 0x4e, 0x47]);
        match part {
            PayloadPart::InlineData { mime_type, data } => {
                assert_eq!(mime_type, "image/png");
                assert_eq!(data, "iVBORw==");
            }
            PayloadPart::Text(_) => panic!("expected inline data"),
        }
    }

    #[test]
    fn test_text_payload_includes_name() {
        let part = file_payload("a.log", "text/plain", b"line one");
        assert_eq!(part, PayloadPart::Text("File Name: a.log\n\nline one".to_string()));
    }

    #[test]
    fn test_text_payload_truncates() {
        let long = "x".repeat(MAX_TEXT_CHARS + 5);
        let part = file_payload("big.log", "text/plain", long.as_bytes());
        match part {
            PayloadPart::Text(text) => {
                assert!(text.ends_with(TRUNCATION_MARKER));
                assert!(text.len() < long.len() + 100);
            }
            PayloadPart::InlineData { .. } => panic!("expected text"),
        }
    }

    #[test]
    fn test_invalid_utf8_text_degrades_to_metadata() {
        let part = file_payload("weird.log", "text/plain", &[0xff, 0xfe, 0x00]);
        assert_eq!(
            part,
            PayloadPart::Text(
                "File metadata: Name: weird.log, Type: text/plain, Size: 3 bytes.".to_string()
            )
        );
    }

    #[test]
    fn test_binary_payload_is_metadata() {
        let part = file_payload("call.wav", "audio/wav", &[0; 16]);
        assert_eq!(
            part,
            PayloadPart::Text(
                "File metadata: Name: call.wav, Type: audio/wav, Size: 16 bytes.".to_string()
            )
        );
    }
}
