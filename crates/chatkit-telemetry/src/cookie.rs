// Copyright 2026 Dropbox

//! Session-cookie extraction.
//!
//! The ingest handler falls back to a session cookie for the message
//! key when the event carries no explicit `userId`. This is a small,
//! exact parsing routine: tolerant of malformed segments and of bad
//! percent-encoding (both are treated as "no cookie", never as a
//! request failure).

use percent_encoding::percent_decode_str;

/// Extract a cookie value from a `Cookie` request header.
///
/// Splits the header on `;`, each segment on the first `=` (segments
/// without one are skipped), trims the name, and percent-decodes the
/// matched value (rejoined if it contained further `=` characters).
/// Returns `None` for a missing header, no match, or a value that does
/// not decode to UTF-8.
#[must_use]
pub fn cookie_value(cookie_header: &str, name: &str) -> Option<String> {
    if cookie_header.is_empty() {
        return None;
    }

    for segment in cookie_header.split(';') {
        let Some((raw_name, raw_value)) = segment.split_once('=') else {
            continue;
        };
        if raw_name.trim() != name {
            continue;
        }
        return percent_decode_str(raw_value.trim())
            .decode_utf8()
            .ok()
            .map(|decoded| decoded.into_owned());
    }

    None
}

#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_value_among_others() {
        assert_eq!(
            cookie_value("a=1; chatkit_session_id=abc123; b=2", "chatkit_session_id"),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn test_cookie_value_empty_header() {
        assert_eq!(cookie_value("", "chatkit_session_id"), None);
    }

    #[test]
    fn test_cookie_value_no_match() {
        assert_eq!(cookie_value("a=1; b=2", "chatkit_session_id"), None);
    }

    #[test]
    fn test_cookie_value_percent_decoded() {
        assert_eq!(
            cookie_value("chatkit_session_id=%20space", "chatkit_session_id"),
            Some(" space".to_string())
        );
    }

    #[test]
    fn test_cookie_value_preserves_embedded_equals() {
        // The value is everything after the first '='.
        assert_eq!(
            cookie_value("chatkit_session_id=a=b=c", "chatkit_session_id"),
            Some("a=b=c".to_string())
        );
    }

    #[test]
    fn test_cookie_value_skips_segments_without_equals() {
        assert_eq!(
            cookie_value("junk; chatkit_session_id=ok", "chatkit_session_id"),
            Some("ok".to_string())
        );
    }

    #[test]
    fn test_cookie_value_bad_percent_encoding_is_missing() {
        // %FF is not valid UTF-8 after decoding; treated as no cookie,
        // not an error.
        assert_eq!(cookie_value("chatkit_session_id=%FF", "chatkit_session_id"), None);
    }

    #[test]
    fn test_cookie_value_name_is_trimmed() {
        assert_eq!(
            cookie_value("  chatkit_session_id  =abc", "chatkit_session_id"),
            Some("abc".to_string())
        );
    }
}
