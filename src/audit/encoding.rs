//! Decoding of audit logs written in legacy encodings.
//!
//! Older deployments wrote the log with the host's ANSI code page, so a log
//! may be UTF-8, Big5/CP950 or GBK. Each candidate decodes the whole buffer;
//! the first one without a malformed sequence wins.

use encoding_rs::{BIG5, Encoding, GBK, UTF_8};
use thiserror::Error;

/// Decode order. WHATWG Big5 is a superset of CP950, so one entry covers both.
pub const LOG_ENCODINGS: &[&Encoding] = &[UTF_8, BIG5, GBK];

const BOM: char = '\u{feff}';

/// No candidate encoding could decode the log.
#[derive(Debug, Error)]
#[error("log is not valid in any of: {tried}")]
pub struct DecodeError {
    tried: String,
}

/// Text decoded from a log file, with the encoding that produced it.
#[derive(Debug, Clone)]
pub struct DecodedText {
    pub text: String,
    pub encoding: &'static Encoding,
}

/// Decode `bytes` with the first encoding in `encodings` that accepts all of it.
pub fn decode_with_fallback(
    bytes: &[u8],
    encodings: &[&'static Encoding],
) -> Result<DecodedText, DecodeError> {
    for &encoding in encodings {
        match encoding.decode_without_bom_handling_and_without_replacement(bytes) {
            Some(text) => {
                let text = text.strip_prefix(BOM).unwrap_or(&*text).to_string();
                return Ok(DecodedText { text, encoding });
            }
            None => {
                tracing::debug!(encoding = encoding.name(), "Audit log does not decode, trying next encoding");
            }
        }
    }

    Err(DecodeError {
        tried: encodings
            .iter()
            .map(|e| e.name())
            .collect::<Vec<_>>()
            .join(", "),
    })
}
