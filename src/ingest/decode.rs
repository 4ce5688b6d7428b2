/// Raw payload decoding.

use serde_json::Value;

use crate::error::DecodeError;

/// Decodes UTF-8 JSON bytes into an untyped value.
///
/// The parser's error is wrapped with the source name; nothing partial is
/// ever returned.
pub fn decode(bytes: &[u8], source_name: &str) -> Result<Value, DecodeError> {
    let text = std::str::from_utf8(bytes).map_err(|e| DecodeError {
        source_name: source_name.to_string(),
        cause: e.to_string(),
    })?;

    // The WRA API prefixes some responses with a UTF-8 byte order mark.
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    serde_json::from_str(text).map_err(|e| DecodeError {
        source_name: source_name.to_string(),
        cause: e.to_string(),
    })
}
