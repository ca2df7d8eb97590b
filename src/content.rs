//! Tagged content representation and content fingerprints
//!
//! Every hunk hands its data out as a [`Content`] value. Raw bytes are
//! normalised exactly once, at ingestion: valid UTF-8 becomes text, anything
//! else stays binary. The kind then travels unchanged through a filter chain.

use crate::error::{MillError, MillResult};
use sha2::{Digest, Sha256};
use std::fmt;

/// Whether content is textual or binary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Text,
    Binary,
}

impl ContentKind {
    fn tag(self) -> u8 {
        match self {
            Self::Text => b't',
            Self::Binary => b'b',
        }
    }
}

/// Content of a hunk
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Content {
    /// Decoded text
    Text(String),
    /// Binary data
    Bytes(Vec<u8>),
}

impl Content {
    /// Normalise raw bytes: valid UTF-8 becomes text, anything else stays binary
    pub fn from_utf8_or_bytes(bytes: Vec<u8>) -> Self {
        match String::from_utf8(bytes) {
            Ok(text) => Self::Text(text),
            Err(e) => Self::Bytes(e.into_bytes()),
        }
    }

    /// Wrap bytes as content of a known kind.
    ///
    /// Fails with [`MillError::Decode`] when text is requested for bytes that
    /// are not valid UTF-8.
    pub fn from_kind(kind: ContentKind, bytes: Vec<u8>) -> MillResult<Self> {
        match kind {
            ContentKind::Binary => Ok(Self::Bytes(bytes)),
            ContentKind::Text => decode_utf8(bytes).map(Self::Text),
        }
    }

    pub fn kind(&self) -> ContentKind {
        match self {
            Self::Text(_) => ContentKind::Text,
            Self::Bytes(_) => ContentKind::Binary,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Bytes(bytes) => bytes,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Text(text) => text.into_bytes(),
            Self::Bytes(bytes) => bytes,
        }
    }

    /// Convert to text, decoding binary content as strict UTF-8
    pub fn into_text(self) -> MillResult<String> {
        match self {
            Self::Text(text) => Ok(text),
            Self::Bytes(bytes) => decode_utf8(bytes),
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }

    /// Content identity
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of(self)
    }
}

fn decode_utf8(bytes: Vec<u8>) -> MillResult<String> {
    String::from_utf8(bytes).map_err(|e| MillError::Decode {
        context: format!("invalid byte at offset {}", e.utf8_error().valid_up_to()),
    })
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Vec<u8>> for Content {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

/// SHA-256 fingerprint of a content value.
///
/// Covers the kind tag and the bytes, so equal fingerprints mean equal
/// `data()`. Collisions between distinct contents are assumed not to happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    pub fn of(content: &Content) -> Self {
        let mut hasher = Sha256::new();
        hasher.update([content.kind().tag()]);
        hasher.update(content.as_bytes());
        Self(hasher.finalize().into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// First 12 hex characters, for log lines
    pub fn short(&self) -> String {
        hex::encode(&self.0[..6])
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_bytes_become_text() {
        let content = Content::from_utf8_or_bytes(b"body{}".to_vec());
        assert_eq!(content, Content::Text("body{}".to_string()));
    }

    #[test]
    fn invalid_utf8_stays_binary() {
        let content = Content::from_utf8_or_bytes(vec![0x1f, 0x8b, 0xff]);
        assert_eq!(content.kind(), ContentKind::Binary);
        assert_eq!(content.as_bytes(), &[0x1f, 0x8b, 0xff]);
    }

    #[test]
    fn strict_text_rejects_invalid_bytes() {
        let err = Content::from_kind(ContentKind::Text, vec![0xff]).unwrap_err();
        assert!(matches!(err, MillError::Decode { .. }));
    }

    #[test]
    fn fingerprint_depends_on_content_only() {
        let a = Content::from("a{color:red}");
        let b = Content::from("a{color:red}".to_string());
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), Content::from("a{color:blue}").fingerprint());
    }

    #[test]
    fn fingerprint_distinguishes_kind() {
        let text = Content::from("abc");
        let bytes = Content::from(b"abc".to_vec());
        assert_ne!(text.fingerprint(), bytes.fingerprint());
    }

    #[test]
    fn fingerprint_display_is_hex() {
        let fp = Content::from("x").fingerprint();
        assert_eq!(fp.to_string().len(), 64);
        assert_eq!(fp.short().len(), 12);
        assert!(fp.to_string().starts_with(&fp.short()));
    }
}
