//! Decoded sub-response of a batch.

use bytes::Bytes;
use http::StatusCode;
use std::collections::BTreeMap;

/// One HTTP response recovered from a batch envelope.
///
/// Header names are stored lowercase; a header may repeat, so each name maps to
/// every value in arrival order.
#[derive(Clone, Debug, PartialEq)]
pub struct SubResponse {
    pub status: StatusCode,
    pub reason: String,
    pub headers: BTreeMap<String, Vec<String>>,
    pub body: Option<Bytes>,
}

impl SubResponse {
    pub fn new(status: StatusCode) -> Self {
        SubResponse {
            status,
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            headers: BTreeMap::new(),
            body: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.append_header(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn append_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers
            .entry(name.to_ascii_lowercase())
            .or_default()
            .push(value.into());
    }

    /// First value of a header, case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Every value of a header, case-insensitive.
    pub fn header_values(&self, name: &str) -> &[String] {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Body as text, replacing invalid UTF-8.
    pub fn body_text(&self) -> String {
        self.body
            .as_ref()
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .unwrap_or_default()
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}
