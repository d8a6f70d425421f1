//! Logical operations and the batch envelope they are packed into.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Operation`] | What the caller wants done, with a relative path |
//! | [`SubRequest`] | One embedded HTTP request with an absolute uri |
//! | [`Changeset`] | Atomic group of write sub-requests |
//! | [`BatchPart`] | One top-level part of the envelope |
//! | [`BatchEnvelope`] | Ordered top-level parts of one `$batch` call |

use crate::error::{BatchError, Result};
use http::Method;
use serde_json::Value;

/// A requested logical operation, before path resolution.
#[derive(Clone, Debug, PartialEq)]
pub struct Operation {
    pub method: Method,
    pub path: String,
    pub payload: Option<Value>,
    /// Explicit correlation id; the builder assigns one when absent.
    pub content_id: Option<u32>,
}

impl Operation {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Operation {
            method,
            path: path.into(),
            payload: None,
            content_id: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>, payload: Value) -> Self {
        Self::new(Method::POST, path).with_payload(payload)
    }

    pub fn patch(path: impl Into<String>, payload: Value) -> Self {
        Self::new(Method::PATCH, path).with_payload(payload)
    }

    pub fn put(path: impl Into<String>, payload: Value) -> Self {
        Self::new(Method::PUT, path).with_payload(payload)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn with_content_id(mut self, id: u32) -> Self {
        self.content_id = Some(id);
        self
    }

    /// Reads are placed outside the changeset.
    #[inline]
    pub fn is_read(&self) -> bool {
        self.method == Method::GET
    }
}

/// One embedded HTTP request.
#[derive(Clone, Debug, PartialEq)]
pub struct SubRequest {
    pub method: Method,
    pub uri: String,
    pub content_id: Option<u32>,
    pub body: Option<Value>,
}

impl SubRequest {
    /// A read. Carries neither body nor correlation id.
    pub fn get(uri: impl Into<String>) -> Self {
        SubRequest {
            method: Method::GET,
            uri: uri.into(),
            content_id: None,
            body: None,
        }
    }

    /// A write with the given correlation id.
    pub fn write(method: Method, uri: impl Into<String>, content_id: u32, body: Option<Value>) -> Self {
        SubRequest {
            method,
            uri: uri.into(),
            content_id: Some(content_id),
            body,
        }
    }

    /// Check the GET / non-GET invariants.
    pub fn validate(&self) -> Result<()> {
        if self.method == Method::GET {
            if self.body.is_some() {
                return Err(BatchError::Validation(format!(
                    "GET {} must not carry a body",
                    self.uri
                )));
            }
            if let Some(id) = self.content_id {
                return Err(BatchError::Validation(format!(
                    "GET {} must not carry Content-ID {}",
                    self.uri, id
                )));
            }
        } else if self.content_id.is_none() {
            return Err(BatchError::Validation(format!(
                "{} {} requires a Content-ID",
                self.method, self.uri
            )));
        }
        Ok(())
    }
}

/// An atomic group of sub-requests; the server applies all of them or none.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Changeset {
    requests: Vec<SubRequest>,
}

impl Changeset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a member, enforcing its invariants and Content-ID uniqueness.
    pub fn push(&mut self, request: SubRequest) -> Result<()> {
        request.validate()?;
        if request.method == Method::GET {
            return Err(BatchError::Validation(format!(
                "GET {} cannot be part of a changeset",
                request.uri
            )));
        }
        if let Some(id) = request.content_id {
            if self.requests.iter().any(|r| r.content_id == Some(id)) {
                return Err(BatchError::Validation(format!(
                    "Duplicate Content-ID {} in changeset",
                    id
                )));
            }
        }
        self.requests.push(request);
        Ok(())
    }

    pub fn requests(&self) -> &[SubRequest] {
        &self.requests
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

/// One top-level part of the envelope.
#[derive(Clone, Debug, PartialEq)]
pub enum BatchPart {
    Changeset(Changeset),
    Request(SubRequest),
}

impl BatchPart {
    /// Number of sub-responses this part produces.
    pub fn request_count(&self) -> usize {
        match self {
            BatchPart::Changeset(cs) => cs.len(),
            BatchPart::Request(_) => 1,
        }
    }
}

/// The ordered top-level parts of one `$batch` call.
///
/// Part order defines response order; changeset members are flattened in place.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchEnvelope {
    parts: Vec<BatchPart>,
}

impl BatchEnvelope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a changeset. An empty changeset is rejected.
    pub fn with_changeset(mut self, changeset: Changeset) -> Result<Self> {
        self.push(BatchPart::Changeset(changeset))?;
        Ok(self)
    }

    pub fn with_request(mut self, request: SubRequest) -> Self {
        self.parts.push(BatchPart::Request(request));
        self
    }

    /// Append a part. A changeset without members would encode as a nested
    /// multipart with no parts, which the service rejects.
    pub fn push(&mut self, part: BatchPart) -> Result<()> {
        if let BatchPart::Changeset(cs) = &part {
            if cs.is_empty() {
                return Err(BatchError::Validation("changeset has no requests".into()));
            }
        }
        self.parts.push(part);
        Ok(())
    }

    pub fn parts(&self) -> &[BatchPart] {
        &self.parts
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Total number of sub-requests, i.e. of expected sub-responses.
    pub fn request_count(&self) -> usize {
        self.parts.iter().map(BatchPart::request_count).sum()
    }

    /// All sub-requests in response order.
    pub fn requests(&self) -> impl Iterator<Item = &SubRequest> {
        self.parts.iter().flat_map(|part| match part {
            BatchPart::Changeset(cs) => cs.requests().iter().collect::<Vec<_>>(),
            BatchPart::Request(req) => vec![req],
        })
    }
}
