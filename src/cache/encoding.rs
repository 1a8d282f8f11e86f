//! Best-effort text transport for structured cache documents.
//!
//! Bodies embedded in a JSON document must be text. The cascade is UTF-8
//! strict, then a statistical encoding guess, then lossy replacement. This is
//! necessarily lossy for byte sequences no detected encoding can represent;
//! that is an accepted limitation of the GET+query/POST document shape (the
//! raw GET shape stores bytes verbatim and is unaffected).

use chardetng::EncodingDetector;

/// Decode bytes to a `String`, guessing the source encoding when the content
/// is not valid UTF-8.
pub fn detect_and_decode(content: &[u8]) -> String {
    if content.is_empty() {
        return String::new();
    }
    if let Ok(text) = std::str::from_utf8(content) {
        return text.to_string();
    }

    let mut detector = EncodingDetector::new();
    detector.feed(content, true);
    let encoding = detector.guess(None, true);
    let (text, _, had_errors) = encoding.decode(content);
    if !had_errors {
        return text.into_owned();
    }

    String::from_utf8_lossy(content).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_content_passes_through() {
        assert_eq!(detect_and_decode("héllo wörld".as_bytes()), "héllo wörld");
    }

    #[test]
    fn empty_content_decodes_to_empty_string() {
        assert_eq!(detect_and_decode(b""), "");
    }

    #[test]
    fn legacy_single_byte_encoding_is_detected() {
        // "caché préférée du café" in windows-1252, not valid UTF-8.
        let latin1: Vec<u8> = "la cach\u{e9} pr\u{e9}f\u{e9}r\u{e9}e du caf\u{e9} est ici"
            .chars()
            .map(|c| if c == '\u{e9}' { 0xE9 } else { c as u8 })
            .collect();
        assert!(std::str::from_utf8(&latin1).is_err());
        let decoded = detect_and_decode(&latin1);
        assert!(decoded.contains('é'), "got: {decoded}");
    }

    #[test]
    fn undecodable_bytes_fall_back_to_replacement() {
        let decoded = detect_and_decode(&[0xFF, 0xFE, 0x00, 0x00, 0xFF]);
        assert!(!decoded.is_empty());
    }
}
