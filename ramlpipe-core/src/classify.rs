//! Signature sniffing for RAML documents, with an optional JSON fallback.
//!
//! Checks are ordered: the byte-exact RAML 0.8 signature (LF, then CRLF) wins
//! over JSON, so a buffer carrying the signature is never parsed as JSON.
//! Streams are rejected by the caller and never reach [`classify`].

use bytes::Bytes;

use crate::types::SourceBody;

/// RAML 0.8 header with a Unix line ending.
pub const RAML_SIGNATURE_LF: &[u8] = b"#%RAML 0.8\n";

/// RAML 0.8 header with a Windows line ending.
pub const RAML_SIGNATURE_CRLF: &[u8] = b"#%RAML 0.8\r\n";

/// Outcome of classifying a buffer.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// Nothing to convert; the file only passes through.
    NotConvertible,
    /// The buffer starts with a RAML signature.
    RamlSource(Bytes),
    /// JSON fallback enabled and the buffer is a valid JSON document.
    JsonSource(serde_json::Value),
}

impl Classification {
    /// Short label: `raml`, `json` or `skip`.
    pub fn label(&self) -> &'static str {
        match self {
            Classification::NotConvertible => "skip",
            Classification::RamlSource(_) => "raml",
            Classification::JsonSource(_) => "json",
        }
    }

    /// The renderer input for convertible classifications.
    pub fn into_source_body(self) -> Option<SourceBody> {
        match self {
            Classification::NotConvertible => None,
            Classification::RamlSource(bytes) => Some(SourceBody::Raml(bytes)),
            Classification::JsonSource(value) => Some(SourceBody::Json(value)),
        }
    }
}

/// `true` when `buf` begins with either RAML 0.8 signature.
pub fn has_raml_signature(buf: &[u8]) -> bool {
    buf.starts_with(RAML_SIGNATURE_LF) || buf.starts_with(RAML_SIGNATURE_CRLF)
}

/// Classify `contents`.
///
/// `None` (no contents) and empty buffers are never convertible. Malformed
/// JSON is not an error: it simply classifies as
/// [`Classification::NotConvertible`].
pub fn classify(contents: Option<&Bytes>, allow_json_fallback: bool) -> Classification {
    let Some(buf) = contents else {
        return Classification::NotConvertible;
    };

    if has_raml_signature(buf) {
        return Classification::RamlSource(buf.clone());
    }

    if allow_json_fallback {
        if let Ok(value) = serde_json::from_slice::<serde_json::Value>(buf) {
            return Classification::JsonSource(value);
        }
    }

    Classification::NotConvertible
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn buf(s: &'static str) -> Bytes {
        Bytes::from_static(s.as_bytes())
    }

    #[rstest]
    #[case("#%RAML 0.8\n")]
    #[case("#%RAML 0.8\ntitle: Example")]
    #[case("#%RAML 0.8\r\n")]
    #[case("#%RAML 0.8\r\ntitle: Example\r\n")]
    #[case("#%RAML 0.8\n{\"not\": \"json at all\"")]
    fn signature_wins(#[case] text: &'static str, #[values(false, true)] json: bool) {
        let b = buf(text);
        assert_eq!(classify(Some(&b), json), Classification::RamlSource(b.clone()));
    }

    #[rstest]
    #[case("")]
    #[case("#%RAML")]
    #[case("#%RAML 0.8")]
    #[case("#%RAML 0.8\r")]
    #[case("#%RAML 1.0\ntitle: Example")]
    #[case(" #%RAML 0.8\n")]
    #[case("#%raml 0.8\n")]
    fn near_misses_are_not_raml(#[case] text: &'static str) {
        assert_eq!(classify(Some(&buf(text)), false), Classification::NotConvertible);
    }

    #[test]
    fn null_contents_are_not_convertible() {
        assert_eq!(classify(None, true), Classification::NotConvertible);
    }

    #[test]
    fn json_requires_fallback_flag() {
        let b = buf(r#"{"title":"Example"}"#);
        assert_eq!(classify(Some(&b), false), Classification::NotConvertible);
        assert_eq!(
            classify(Some(&b), true),
            Classification::JsonSource(json!({"title": "Example"}))
        );
    }

    #[rstest]
    #[case("{\"title\":")]
    #[case("title: Example")]
    #[case("   ")]
    #[case("")]
    fn malformed_json_is_silently_skipped(#[case] text: &'static str) {
        assert_eq!(classify(Some(&buf(text)), true), Classification::NotConvertible);
    }

    #[test]
    fn classification_is_idempotent() {
        for text in ["#%RAML 0.8\nx", "[1,2]", "nope"] {
            let b = buf(text);
            assert_eq!(classify(Some(&b), true), classify(Some(&b), true));
        }
    }

    #[test]
    fn non_utf8_bytes_after_signature_are_still_raml() {
        let mut raw = RAML_SIGNATURE_LF.to_vec();
        raw.extend_from_slice(&[0xff, 0xfe, 0x00]);
        let b = Bytes::from(raw);
        assert_eq!(classify(Some(&b), true).label(), "raml");
    }

    #[test]
    fn into_source_body_maps_variants() {
        assert!(Classification::NotConvertible.into_source_body().is_none());
        assert_eq!(
            Classification::JsonSource(json!(1)).into_source_body(),
            Some(SourceBody::Json(json!(1)))
        );
    }
}
