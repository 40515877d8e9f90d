//! Base64 framing for free-form strings crossing the bridge or the store.
//!
//! Any value that can contain quotes, newlines or non-ASCII bytes is encoded
//! here before it is embedded in a script-invocation string, and decoded
//! immediately on arrival. The codec knows nothing about transport; the
//! bridge channel and the annotation sync pipeline both go through these
//! functions so the two representations can never disagree.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

/// Separator between the two segments of a multi-field event payload.
/// `,` is not part of the base64 alphabet, so the first occurrence is
/// unambiguous.
pub const PAIR_SEPARATOR: char = ',';

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("invalid base64 payload: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("payload is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("expected two `{PAIR_SEPARATOR}`-separated segments")]
    MissingSeparator,

    #[error("invalid numeric token `{0}`")]
    InvalidNumber(String),

    #[error("unknown event method `{0}`")]
    UnknownMethod(String),
}

pub type Result<T> = std::result::Result<T, CodecError>;

/// Encode arbitrary text as base64 over its UTF-8 bytes.
#[must_use]
pub fn encode_text(text: &str) -> String {
    STANDARD.encode(text.as_bytes())
}

/// Inverse of [`encode_text`]. `decode_text(&encode_text(t)) == t` for all `t`.
pub fn decode_text(wire: &str) -> Result<String> {
    let bytes = STANDARD.decode(wire.trim())?;
    Ok(String::from_utf8(bytes)?)
}

/// Frame two values as `base64(first),base64(second)`.
#[must_use]
pub fn encode_event_pair(first: &str, second: &str) -> String {
    format!(
        "{}{PAIR_SEPARATOR}{}",
        encode_text(first),
        encode_text(second)
    )
}

/// Split a two-segment payload on the first separator only and decode both
/// segments. A comment text containing commas survives because base64 never
/// emits the separator character.
pub fn split_event_pair(payload: &str) -> Result<(String, String)> {
    let (first, second) = payload
        .split_once(PAIR_SEPARATOR)
        .ok_or(CodecError::MissingSeparator)?;
    Ok((decode_text(first)?, decode_text(second)?))
}

/// Parse a bare numeric token (highlight ids on the event side).
pub fn decode_number(token: &str) -> Result<u64> {
    token
        .trim()
        .parse::<u64>()
        .map_err(|_| CodecError::InvalidNumber(token.to_string()))
}

#[cfg(test)]
mod tests {
    use super::{decode_number, decode_text, encode_event_pair, encode_text, split_event_pair};

    #[test]
    fn text_round_trips_arbitrary_unicode_and_control_characters() {
        let samples = [
            "",
            "plain ascii",
            "with 'single' and \"double\" quotes",
            "line\nbreaks\r\nand\ttabs",
            "emoji 🔦 and combining é plus CJK 注釈",
            "null byte \u{0} and bell \u{7}",
            "comma, separated, text",
        ];
        for text in samples {
            let decoded = decode_text(&encode_text(text)).unwrap();
            assert_eq!(decoded, text);
        }
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode_text("not!base64!!").is_err());
    }

    #[test]
    fn event_pair_splits_on_first_separator_only() {
        let payload = encode_event_pair("note, with commas", "anchor-7");
        let (text, anchor) = split_event_pair(&payload).unwrap();
        assert_eq!(text, "note, with commas");
        assert_eq!(anchor, "anchor-7");
    }

    #[test]
    fn event_pair_frames_both_segments() {
        let payload = encode_event_pair("my note", "blk-3");
        let (_, second) = payload.split_once(',').unwrap();
        assert_eq!(second, encode_text("blk-3"), "anchor rides the wire framed");

        let (text, anchor) = split_event_pair(&payload).unwrap();
        assert_eq!(text, "my note");
        assert_eq!(anchor, "blk-3");
    }

    #[test]
    fn event_pair_without_separator_is_an_error() {
        assert!(split_event_pair("bm8gc2VwYXJhdG9y").is_err());
    }

    #[test]
    fn numeric_tokens_parse_and_reject_junk() {
        assert_eq!(decode_number("42").unwrap(), 42);
        assert_eq!(decode_number(" 7 ").unwrap(), 7);
        assert!(decode_number("-1").is_err());
        assert!(decode_number("id42").is_err());
    }
}
