//! Batch response demultiplexer.
//!
//! Walks the MIME tree of a `$batch` response and returns one [`SubResponse`]
//! per embedded HTTP response, in document order. Changeset responses are
//! nested one level down and get flattened into their position:
//!
//! ```text
//! batchresponse
//! ├── changesetresponse ──┬── 204 (Content-ID 1)   -> responses[0]
//! │                       └── 204 (Content-ID 2)   -> responses[1]
//! └── 200 (GET)                                    -> responses[2]
//! ```
//!
//! Each part is handled by kind:
//!
//! 1. **Multipart**: descend using the part's own boundary
//! 2. **`application/http`**: parse the payload as an HTTP response
//! 3. **Anything else**: try the raw bytes as an HTTP response anyway
//!
//! A part that yields nothing parseable is dropped with a warning so that one
//! bad record does not lose its siblings. Descent is bounded by the nesting
//! depth of the body itself.
//!
//! # Examples
//!
//! ```
//! use odata_batch_http::client::decode;
//!
//! let body = "--batchresponse_1\r\n\
//!     Content-Type: application/http\r\n\
//!     Content-Transfer-Encoding: binary\r\n\
//!     \r\n\
//!     HTTP/1.1 200 OK\r\n\
//!     Content-Type: application/json\r\n\
//!     \r\n\
//!     {\"value\":[]}\r\n\
//!     --batchresponse_1--\r\n";
//!
//! let responses = decode("multipart/mixed; boundary=batchresponse_1", body.as_bytes()).unwrap();
//! assert_eq!(responses.len(), 1);
//! assert_eq!(responses[0].body_text(), "{\"value\":[]}");
//! ```

use crate::error::{BatchError, Result};
use crate::protocol::{
    boundary_param, is_application_http, is_multipart, parse_response, sniff_boundary,
    split_parts, MimePart,
};
use crate::types::SubResponse;

/// How a MIME part is decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PartKind {
    /// Nested multipart body with its boundary.
    Multipart(String),
    /// Nested multipart body without a usable boundary.
    MultipartWithoutBoundary,
    /// Declared `application/http` message.
    HttpMessage,
    /// Undeclared payload, tried as an HTTP message.
    Opaque,
}

impl PartKind {
    fn of(part: &MimePart) -> Self {
        let content_type = part.content_type();
        if is_multipart(content_type) {
            match boundary_param(content_type).or_else(|| sniff_boundary(&part.body)) {
                Some(boundary) => PartKind::Multipart(boundary),
                None => PartKind::MultipartWithoutBoundary,
            }
        } else if is_application_http(content_type) {
            PartKind::HttpMessage
        } else {
            PartKind::Opaque
        }
    }
}

/// Decode a batch response body given its `Content-Type` header.
///
/// Falls back to the first delimiter line of the body when the header carries
/// no boundary.
pub fn decode(content_type: &str, body: &[u8]) -> Result<Vec<SubResponse>> {
    let boundary = boundary_param(content_type)
        .or_else(|| sniff_boundary(body))
        .ok_or_else(|| {
            BatchError::Multipart(format!(
                "response is not a multipart body (Content-Type: {:?})",
                content_type
            ))
        })?;
    decode_with_boundary(&boundary, body)
}

/// Decode a batch response body with a known top-level boundary.
pub fn decode_with_boundary(boundary: &str, body: &[u8]) -> Result<Vec<SubResponse>> {
    let parts = split_parts(body, boundary)?;
    let mut responses = Vec::with_capacity(parts.len());
    collect(&parts, 0, &mut responses);
    tracing::debug!(
        boundary = %boundary,
        responses = responses.len(),
        "Decoded batch response"
    );
    Ok(responses)
}

fn collect(parts: &[MimePart], depth: usize, out: &mut Vec<SubResponse>) {
    for (index, part) in parts.iter().enumerate() {
        match PartKind::of(part) {
            PartKind::Multipart(boundary) => match split_parts(&part.body, &boundary) {
                Ok(nested) => collect(&nested, depth + 1, out),
                Err(e) => {
                    tracing::warn!(depth, index, boundary = %boundary, "Dropping nested multipart part: {}", e);
                }
            },
            PartKind::MultipartWithoutBoundary => {
                tracing::warn!(depth, index, "Dropping multipart part without boundary");
            }
            PartKind::HttpMessage => match parse_response(&part.body) {
                Ok(response) => out.push(response),
                Err(e) => {
                    tracing::warn!(depth, index, "Dropping unparseable application/http part: {}", e);
                }
            },
            PartKind::Opaque => match parse_response(&part.body) {
                Ok(response) => out.push(response),
                Err(e) => {
                    tracing::warn!(
                        depth,
                        index,
                        content_type = %part.content_type(),
                        "Dropping part that is not an HTTP response: {}",
                        e
                    );
                }
            },
        }
    }
}
