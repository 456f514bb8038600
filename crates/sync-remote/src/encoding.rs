//! Base64 <-> UTF-8 text conversion for blob content.
//!
//! Decoding never fails: a corrupt blob decodes to
//! [`DECODE_ERROR_PLACEHOLDER`] so one bad file cannot abort a bulk import.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Content substituted for blobs that are not valid base64-encoded UTF-8.
pub const DECODE_ERROR_PLACEHOLDER: &str = "[Error decoding file content]";

/// Encode UTF-8 text as standard padded base64.
pub fn encode_base64_utf8(text: &str) -> String {
    STANDARD.encode(text.as_bytes())
}

/// Decode base64 into UTF-8 text.
///
/// Whitespace (the hosting API wraps blob content every 60 columns) is
/// ignored.
pub fn decode_base64_utf8(encoded: &str) -> String {
    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD
        .decode(compact.as_bytes())
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_else(|| DECODE_ERROR_PLACEHOLDER.to_string())
}

/// Decode blob content according to its declared encoding.
pub fn decode_blob_content(content: &str, encoding: &str) -> String {
    match encoding {
        "base64" => decode_base64_utf8(content),
        "utf-8" | "utf8" => content.to_string(),
        _ => DECODE_ERROR_PLACEHOLDER.to_string(),
    }
}
