//! Header block parsing and `Content-Type` helpers.
//!
//! Embedded MIME parts and embedded HTTP messages share one header syntax:
//! `Name: value` lines terminated by an empty line. Names are matched
//! case-insensitively and stored lowercase.
//!
//! # Examples
//!
//! ```
//! use odata_batch_http::protocol::{boundary_param, is_multipart, format_multipart_content_type};
//!
//! let ct = format_multipart_content_type("batch_42");
//! assert_eq!(ct, "multipart/mixed; boundary=batch_42");
//! assert!(is_multipart(&ct));
//! assert_eq!(boundary_param(&ct).as_deref(), Some("batch_42"));
//!
//! let quoted = r#"multipart/mixed; boundary="changesetresponse_7""#;
//! assert_eq!(boundary_param(quoted).as_deref(), Some("changesetresponse_7"));
//! ```

use crate::protocol::constants::media_types;
use bytes::BytesMut;
use std::collections::BTreeMap;

/// Parse a `Content-Type` value, `None` when it is not a valid media type.
pub fn parse_content_type(content_type: &str) -> Option<mime::Mime> {
    content_type.trim().parse::<mime::Mime>().ok()
}

/// Extract the `boundary` parameter of a `Content-Type` value.
pub fn boundary_param(content_type: &str) -> Option<String> {
    let parsed = parse_content_type(content_type)?;
    let boundary = parsed.get_param(mime::BOUNDARY)?;
    let boundary = boundary.as_str().trim_matches('"');
    if boundary.is_empty() {
        None
    } else {
        Some(boundary.to_string())
    }
}

/// The media type without parameters, lowercase. Empty when unparseable.
pub fn media_type(content_type: &str) -> String {
    parse_content_type(content_type)
        .map(|parsed| parsed.essence_str().to_ascii_lowercase())
        .unwrap_or_default()
}

/// Check for any `multipart/*` media type.
pub fn is_multipart(content_type: &str) -> bool {
    parse_content_type(content_type).is_some_and(|parsed| parsed.type_() == mime::MULTIPART)
}

/// Check for `application/http`, with or without `msgtype`.
pub fn is_application_http(content_type: &str) -> bool {
    media_type(content_type) == media_types::APPLICATION_HTTP
}

/// `multipart/mixed; boundary=<boundary>`
pub fn format_multipart_content_type(boundary: &str) -> String {
    format!("{}; boundary={}", media_types::MULTIPART_MIXED, boundary)
}

/// Parse `Name: value` lines into a lowercase-keyed map.
///
/// Lines without a colon are skipped. A repeated name keeps its first value.
pub fn parse_header_lines(block: &str) -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();
    for line in block.lines() {
        if let Some(colon_pos) = line.find(':') {
            let key = line[..colon_pos].trim().to_ascii_lowercase();
            if key.is_empty() {
                continue;
            }
            let value = line[colon_pos + 1..].trim().to_string();
            headers.entry(key).or_insert(value);
        }
    }
    headers
}

/// Locate the empty line ending a header block.
///
/// Returns `(end_of_headers, start_of_body)`. Accepts CRLF and bare LF line endings.
pub fn find_header_end(data: &[u8]) -> Option<(usize, usize)> {
    let crlf = find_bytes(data, b"\r\n\r\n", 0).map(|p| (p, p + 4));
    let lf = find_bytes(data, b"\n\n", 0).map(|p| (p, p + 2));
    match (crlf, lf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

/// First position of `needle` in `haystack` at or after `from`.
pub fn find_bytes(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if needle.is_empty() || from >= haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + from)
}

/// Append one `Name: value\r\n` line.
pub fn write_header(buffer: &mut BytesMut, name: &str, value: &str) {
    buffer.extend_from_slice(name.as_bytes());
    buffer.extend_from_slice(b": ");
    buffer.extend_from_slice(value.as_bytes());
    buffer.extend_from_slice(b"\r\n");
}
