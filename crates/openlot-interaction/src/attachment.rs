//! File attachment helpers.
//!
//! The file-reading facility hands the state layer a binary blob; the two
//! consumers are the chatbot (inline base64 image) and the upload endpoint
//! (remote URL). Encoding lives here so both paths agree on the format.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;

/// Encodes a user-selected blob for inline transport.
pub fn encode_base64(bytes: &[u8]) -> String {
    BASE64_STANDARD.encode(bytes)
}

/// An image prepared for a chatbot turn.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineImage {
    pub base64: String,
    pub mime_type: String,
}

impl InlineImage {
    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>) -> Self {
        Self {
            base64: encode_base64(bytes),
            mime_type: mime_type.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_standard_base64() {
        assert_eq!(encode_base64(b"openlot"), "b3BlbmxvdA==");
    }

    #[test]
    fn inline_image_carries_mime_type() {
        let image = InlineImage::from_bytes(&[0xFF, 0xD8], "image/jpeg");
        assert_eq!(image.mime_type, "image/jpeg");
        assert!(!image.base64.is_empty());
    }
}
