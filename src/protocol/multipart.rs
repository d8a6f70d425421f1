//! `multipart/mixed` body splitting.
//!
//! A multipart body is a sequence of parts separated by delimiter lines. The
//! line break before a delimiter belongs to the delimiter, not to the part.
//!
//! ```text
//! preamble (ignored)
//! --boundary\r\n
//! Part-Header: value\r\n
//! \r\n
//! part body\r\n
//! --boundary\r\n
//! ...
//! --boundary--\r\n
//! epilogue (ignored)
//! ```
//!
//! Splitting is lenient: a missing close delimiter ends the last part at the end
//! of the body, and a part without a header block is kept with empty headers.

use crate::error::{BatchError, Result};
use crate::protocol::headers::{find_bytes, find_header_end, parse_header_lines};
use bytes::Bytes;
use std::collections::BTreeMap;

/// One part of a multipart body.
#[derive(Clone, Debug, PartialEq)]
pub struct MimePart {
    /// Part headers, lowercase names.
    pub headers: BTreeMap<String, String>,
    /// Part payload.
    pub body: Bytes,
}

impl MimePart {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// `Content-Type` of the part, empty when absent.
    pub fn content_type(&self) -> &str {
        self.header("content-type").unwrap_or_default()
    }
}

/// Split a multipart body on `boundary`.
///
/// Fails only when no opening delimiter is present.
pub fn split_parts(body: &[u8], boundary: &str) -> Result<Vec<MimePart>> {
    let delimiter = format!("--{}", boundary);
    let delimiter = delimiter.as_bytes();

    let mut pos = find_delimiter(body, delimiter, 0).ok_or_else(|| {
        BatchError::Multipart(format!("no delimiter for boundary {:?}", boundary))
    })?;

    let mut parts = Vec::new();
    loop {
        let after = pos + delimiter.len();
        if body[after..].starts_with(b"--") {
            break;
        }
        // Skip transport padding up to the end of the delimiter line.
        let content_start = match find_bytes(body, b"\n", after) {
            Some(nl) => nl + 1,
            None => break,
        };

        let next = find_delimiter(body, delimiter, content_start);
        let content_end = match next {
            Some(next_pos) => trim_line_break(body, content_start, next_pos),
            None => body.len(),
        };

        parts.push(parse_part(&body[content_start..content_end]));

        match next {
            Some(next_pos) => pos = next_pos,
            None => break,
        }
    }

    Ok(parts)
}

/// Find the boundary sniffed from the first delimiter line of a body.
///
/// Used when a response omits the `boundary` parameter.
pub fn sniff_boundary(body: &[u8]) -> Option<String> {
    let start = body.iter().position(|b| !b.is_ascii_whitespace())?;
    let rest = &body[start..];
    if !rest.starts_with(b"--") {
        return None;
    }
    let line_end = rest
        .iter()
        .position(|&b| b == b'\r' || b == b'\n')
        .unwrap_or(rest.len());
    let boundary = std::str::from_utf8(&rest[2..line_end]).ok()?.trim();
    let boundary = boundary.strip_suffix("--").unwrap_or(boundary);
    if boundary.is_empty() {
        None
    } else {
        Some(boundary.to_string())
    }
}

/// A delimiter counts only at the start of the body or of a line, and only when
/// the rest of its line is an optional `--` plus linear whitespace.
fn find_delimiter(body: &[u8], delimiter: &[u8], from: usize) -> Option<usize> {
    let mut search = from;
    while let Some(found) = find_bytes(body, delimiter, search) {
        let at_line_start = found == 0 || body[found - 1] == b'\n';
        if at_line_start && ends_delimiter_line(&body[found + delimiter.len()..]) {
            return Some(found);
        }
        search = found + 1;
    }
    None
}

fn ends_delimiter_line(rest: &[u8]) -> bool {
    let rest = rest.strip_prefix(b"--").unwrap_or(rest);
    for &b in rest {
        match b {
            b' ' | b'\t' => continue,
            b'\r' | b'\n' => return true,
            _ => return false,
        }
    }
    true
}

/// End of part content: drop the CRLF (or LF) that precedes the next delimiter.
fn trim_line_break(body: &[u8], start: usize, delimiter_pos: usize) -> usize {
    let mut end = delimiter_pos;
    if end > start && body[end - 1] == b'\n' {
        end -= 1;
        if end > start && body[end - 1] == b'\r' {
            end -= 1;
        }
    }
    end
}

fn parse_part(content: &[u8]) -> MimePart {
    let (head, payload) = if content.starts_with(b"\r\n") {
        (&content[..0], &content[2..])
    } else if content.starts_with(b"\n") {
        (&content[..0], &content[1..])
    } else {
        match find_header_end(content) {
            Some((header_end, body_start)) => (&content[..header_end], &content[body_start..]),
            None => (content, &content[content.len()..]),
        }
    };

    MimePart {
        headers: parse_header_lines(&String::from_utf8_lossy(head)),
        body: Bytes::copy_from_slice(payload),
    }
}
