//! Batch envelope encoding.
//!
//! Turns a [`BatchEnvelope`] into the `multipart/mixed` body of a `$batch` call.
//! Every changeset becomes one nested `multipart/mixed` part with its own
//! boundary; every standalone request becomes one `application/http` part.
//!
//! ```text
//! --batch_1f0c...
//! Content-Type: multipart/mixed; boundary=changeset_9a7e...
//!
//! --changeset_9a7e...
//! Content-Type: application/http
//! Content-Transfer-Encoding: binary
//! Content-ID: 1
//!
//! POST https://org/api/data/v8.2/contacts HTTP/1.1
//! Content-Type: application/json;type=entry
//!
//! {"firstname":"Peter"}
//! --changeset_9a7e...--
//! --batch_1f0c...
//! Content-Type: application/http
//! Content-Transfer-Encoding: binary
//!
//! GET https://org/api/data/v8.2/Account_Tasks?$select=subject HTTP/1.1
//! Accept: application/json
//!
//!
//! --batch_1f0c...--
//! ```
//!
//! Boundaries are `batch_` / `changeset_` followed by a random v4 UUID, fresh for
//! every call.

use crate::error::Result;
use crate::protocol::constants::{
    headers, media_types, BATCH_BOUNDARY_PREFIX, BINARY, CHANGESET_BOUNDARY_PREFIX, CRLF,
};
use crate::protocol::headers::{format_multipart_content_type, write_header};
use crate::protocol::message::serialize_request;
use crate::types::{BatchEnvelope, BatchPart, Changeset, SubRequest};
use bytes::{Bytes, BytesMut};
use uuid::Uuid;

/// An encoded `$batch` body plus its boundary metadata.
#[derive(Clone, Debug)]
pub struct EncodedBatch {
    /// Outer boundary.
    pub boundary: String,
    /// One boundary per changeset, in envelope order.
    pub changeset_boundaries: Vec<String>,
    /// The multipart body.
    pub body: Bytes,
}

impl EncodedBatch {
    /// `Content-Type` header value of the batch request.
    pub fn content_type(&self) -> String {
        format_multipart_content_type(&self.boundary)
    }
}

/// Generate a fresh boundary token with the given prefix.
pub fn generate_boundary(prefix: &str) -> String {
    format!("{}{}", prefix, Uuid::new_v4())
}

/// Encode an envelope with freshly generated boundaries.
pub fn encode(envelope: &BatchEnvelope) -> Result<EncodedBatch> {
    let boundary = generate_boundary(BATCH_BOUNDARY_PREFIX);
    let mut changeset_boundaries = Vec::new();
    let mut buffer = BytesMut::new();

    for part in envelope.parts() {
        open_part(&mut buffer, &boundary);
        match part {
            BatchPart::Changeset(changeset) => {
                let inner = generate_boundary(CHANGESET_BOUNDARY_PREFIX);
                write_header(
                    &mut buffer,
                    headers::CONTENT_TYPE,
                    &format_multipart_content_type(&inner),
                );
                buffer.extend_from_slice(CRLF);
                encode_changeset(&mut buffer, changeset, &inner)?;
                changeset_boundaries.push(inner);
            }
            BatchPart::Request(request) => {
                encode_request_part(&mut buffer, request)?;
            }
        }
        buffer.extend_from_slice(CRLF);
    }
    close(&mut buffer, &boundary);
    buffer.extend_from_slice(CRLF);

    tracing::debug!(
        boundary = %boundary,
        changesets = changeset_boundaries.len(),
        requests = envelope.request_count(),
        bytes = buffer.len(),
        "Encoded batch envelope"
    );

    Ok(EncodedBatch {
        boundary,
        changeset_boundaries,
        body: buffer.freeze(),
    })
}

fn encode_changeset(buffer: &mut BytesMut, changeset: &Changeset, boundary: &str) -> Result<()> {
    for request in changeset.requests() {
        open_part(buffer, boundary);
        encode_request_part(buffer, request)?;
        buffer.extend_from_slice(CRLF);
    }
    close(buffer, boundary);
    Ok(())
}

/// `application/http` framing headers, the blank line, and the raw request.
fn encode_request_part(buffer: &mut BytesMut, request: &SubRequest) -> Result<()> {
    write_header(buffer, headers::CONTENT_TYPE, media_types::APPLICATION_HTTP);
    write_header(buffer, headers::CONTENT_TRANSFER_ENCODING, BINARY);
    if let Some(id) = request.content_id {
        write_header(buffer, headers::CONTENT_ID, &id.to_string());
    }
    buffer.extend_from_slice(CRLF);
    buffer.extend_from_slice(&serialize_request(request)?);
    Ok(())
}

fn open_part(buffer: &mut BytesMut, boundary: &str) {
    buffer.extend_from_slice(b"--");
    buffer.extend_from_slice(boundary.as_bytes());
    buffer.extend_from_slice(CRLF);
}

fn close(buffer: &mut BytesMut, boundary: &str) {
    buffer.extend_from_slice(b"--");
    buffer.extend_from_slice(boundary.as_bytes());
    buffer.extend_from_slice(b"--");
}
