//! Embedded HTTP messages.
//!
//! Each part of a batch carries a complete HTTP/1.1 message as its payload: a
//! request on the way out, a response on the way back.
//!
//! ```text
//! POST https://org/api/data/v8.2/contacts HTTP/1.1
//! Content-Type: application/json;type=entry
//!
//! {"firstname":"Peter","lastname":"Cambel"}
//! ```
//!
//! ```text
//! HTTP/1.1 204 No Content
//! OData-Version: 4.0
//! OData-EntityId: https://org/api/data/v8.2/contacts(465b158c-541c-e511-80d3-3863bb347ba8)
//! ```

use crate::error::{BatchError, Result};
use crate::protocol::constants::{headers, media_types, HTTP_VERSION};
use crate::protocol::headers::{find_header_end, write_header};
use crate::types::{SubRequest, SubResponse};
use bytes::{Bytes, BytesMut};
use http::{Method, StatusCode};
use once_cell::sync::Lazy;
use regex::Regex;

static STATUS_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^HTTP/\d(?:\.\d)?\s+(\d{3})(?:\s+(.*))?$").expect("status line pattern is valid")
});

/// Serialize a sub-request as a raw HTTP/1.1 request message.
///
/// GET requests get `Accept: application/json` and never a body. Other methods
/// carry their JSON body, when present, as `application/json;type=entry`.
pub fn serialize_request(request: &SubRequest) -> Result<Bytes> {
    let mut buffer = BytesMut::new();
    buffer.extend_from_slice(
        format!("{} {} {}\r\n", request.method, request.uri, HTTP_VERSION).as_bytes(),
    );

    if request.method == Method::GET {
        write_header(&mut buffer, headers::ACCEPT, media_types::APPLICATION_JSON);
        buffer.extend_from_slice(b"\r\n");
        return Ok(buffer.freeze());
    }

    match &request.body {
        Some(body) => {
            let json = serde_json::to_string(body)?;
            write_header(&mut buffer, headers::CONTENT_TYPE, media_types::JSON_ENTRY);
            buffer.extend_from_slice(b"\r\n");
            buffer.extend_from_slice(json.as_bytes());
        }
        None => buffer.extend_from_slice(b"\r\n"),
    }

    Ok(buffer.freeze())
}

/// Parse a raw HTTP/1.1 response message.
///
/// Leading blank lines are skipped. When `Content-Length` is present and fits,
/// exactly that many body bytes are kept; otherwise the remainder is the body.
pub fn parse_response(data: &[u8]) -> Result<SubResponse> {
    let start = data
        .iter()
        .position(|b| !matches!(b, b'\r' | b'\n' | b' ' | b'\t'))
        .ok_or_else(|| BatchError::HttpMessage("empty message".into()))?;
    let data = &data[start..];

    let (header_end, body_start) = match find_header_end(data) {
        Some(found) => found,
        None => (data.len(), data.len()),
    };

    let head = std::str::from_utf8(&data[..header_end])
        .map_err(|e| BatchError::HttpMessage(format!("non UTF-8 header block: {}", e)))?;
    let mut lines = head.lines();
    let status_line = lines.next().unwrap_or_default().trim();

    let caps = STATUS_LINE
        .captures(status_line)
        .ok_or_else(|| BatchError::HttpMessage(format!("invalid status line: {:?}", status_line)))?;
    let code: u16 = caps[1]
        .parse()
        .map_err(|_| BatchError::HttpMessage(format!("invalid status code: {}", &caps[1])))?;
    let status = StatusCode::from_u16(code)
        .map_err(|_| BatchError::HttpMessage(format!("invalid status code: {}", code)))?;

    let mut response = SubResponse::new(status);
    if let Some(reason) = caps.get(2).map(|m| m.as_str().trim()).filter(|r| !r.is_empty()) {
        response.reason = reason.to_string();
    }

    for line in lines {
        if let Some(colon_pos) = line.find(':') {
            let name = line[..colon_pos].trim();
            if !name.is_empty() {
                response.append_header(name, line[colon_pos + 1..].trim());
            }
        }
    }

    let rest = &data[body_start..];
    let body = match response
        .header(headers::CONTENT_LENGTH)
        .and_then(|v| v.parse::<usize>().ok())
    {
        Some(len) if len <= rest.len() => &rest[..len],
        _ => rest,
    };
    if !body.is_empty() {
        response.body = Some(Bytes::copy_from_slice(body));
    }

    Ok(response)
}
