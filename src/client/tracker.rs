//! Entity lifecycle tracking and best-effort cleanup.
//!
//! The tracker collects the address of every entity a run creates and deletes
//! them at the end. Cleanup is exhaustive: every tracked URI is attempted, in
//! order, one at a time, and the tally is reported even when some deletes fail.

use crate::client::transport::Transport;
use crate::error::{BatchError, Result};
use serde::Serialize;

/// Tally of one cleanup pass.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    /// Deletes answered with a 2xx status.
    pub deleted: usize,
    /// Deletes answered with 404. The entity may have been removed by a cascade
    /// or by someone else; this does not prove it was.
    pub not_found: usize,
    /// Deletes answered with any other status, or that failed in transport.
    pub failed: usize,
    /// Body of the last failed delete.
    pub last_failure: Option<String>,
}

impl CleanupReport {
    /// Total number of delete attempts.
    pub fn attempted(&self) -> usize {
        self.deleted + self.not_found + self.failed
    }

    /// `Ok(self)` without failures, else [`BatchError::Cleanup`].
    pub fn into_result(self) -> Result<CleanupReport> {
        if self.failed == 0 {
            return Ok(self);
        }
        let body = self.last_failure.clone().unwrap_or_default();
        Err(BatchError::Cleanup { report: self, body })
    }
}

/// URIs of entities created during one run.
#[derive(Clone, Debug, Default)]
pub struct EntityTracker {
    uris: Vec<String>,
}

impl EntityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, uri: impl Into<String>) {
        self.uris.push(uri.into());
    }

    pub fn uris(&self) -> &[String] {
        &self.uris
    }

    pub fn len(&self) -> usize {
        self.uris.len()
    }

    pub fn is_empty(&self) -> bool {
        self.uris.is_empty()
    }

    /// Delete every tracked entity when `confirm` is set.
    ///
    /// Without confirmation the list is dropped and nothing is sent. The list is
    /// empty afterwards in every case. Returns [`BatchError::Cleanup`] carrying
    /// the full report when at least one delete failed.
    pub async fn cleanup<T>(&mut self, transport: &T, confirm: bool) -> Result<CleanupReport>
    where
        T: Transport + ?Sized,
    {
        let uris = std::mem::take(&mut self.uris);
        let mut report = CleanupReport::default();

        if !confirm {
            tracing::info!(skipped = uris.len(), "Cleanup declined, keeping created entities");
            return Ok(report);
        }

        for uri in &uris {
            match transport.delete(uri).await {
                Ok(response) if response.is_success() => {
                    tracing::info!("Entity deleted: {}", uri);
                    report.deleted += 1;
                }
                Ok(response) if response.status == 404 => {
                    tracing::info!("Entity not found: {}", uri);
                    report.not_found += 1;
                }
                Ok(response) => {
                    tracing::warn!(status = response.status, "Failed to delete: {}", uri);
                    report.failed += 1;
                    report.last_failure = Some(response.body_text());
                }
                Err(e) => {
                    tracing::warn!("Failed to delete: {}: {}", uri, e);
                    report.failed += 1;
                    report.last_failure = Some(e.to_string());
                }
            }
        }

        tracing::info!(
            "Entities deleted: {}, not found: {}, delete failures: {}",
            report.deleted,
            report.not_found,
            report.failed
        );
        report.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TransportRequest, TransportResponse};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Answers deletes from a fixed table and records the order of calls.
    struct ScriptedTransport {
        answers: HashMap<String, Result<TransportResponse>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        fn new(answers: Vec<(&str, Result<TransportResponse>)>) -> Self {
            ScriptedTransport {
                answers: answers
                    .into_iter()
                    .map(|(uri, answer)| (uri.to_string(), answer))
                    .collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn send(&self, _request: TransportRequest) -> Result<TransportResponse> {
            Err(BatchError::Http("send not scripted".into()))
        }

        async fn delete(&self, uri: &str) -> Result<TransportResponse> {
            self.calls.lock().unwrap().push(uri.to_string());
            match self.answers.get(uri) {
                Some(Ok(response)) => Ok(response.clone()),
                Some(Err(_)) => Err(BatchError::Timeout),
                None => Ok(TransportResponse::new(204, "")),
            }
        }
    }

    #[tokio::test]
    async fn test_cleanup_tally_and_last_failure() {
        let transport = ScriptedTransport::new(vec![
            ("https://x/a(1)", Ok(TransportResponse::new(204, ""))),
            ("https://x/a(2)", Ok(TransportResponse::new(404, "gone"))),
            ("https://x/a(3)", Ok(TransportResponse::new(500, "server exploded"))),
        ]);
        let mut tracker = EntityTracker::new();
        tracker.record("https://x/a(1)");
        tracker.record("https://x/a(2)");
        tracker.record("https://x/a(3)");

        let err = tracker.cleanup(&transport, true).await.unwrap_err();
        match err {
            BatchError::Cleanup { report, body } => {
                assert_eq!(report.deleted, 1);
                assert_eq!(report.not_found, 1);
                assert_eq!(report.failed, 1);
                assert_eq!(body, "server exploded");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(tracker.is_empty());
        assert_eq!(transport.calls(), ["https://x/a(1)", "https://x/a(2)", "https://x/a(3)"]);
    }

    #[tokio::test]
    async fn test_failure_does_not_short_circuit() {
        let transport = ScriptedTransport::new(vec![
            ("https://x/a(1)", Ok(TransportResponse::new(500, "first"))),
            ("https://x/a(2)", Ok(TransportResponse::new(204, ""))),
            ("https://x/a(3)", Ok(TransportResponse::new(403, "last"))),
        ]);
        let mut tracker = EntityTracker::new();
        for i in 1..=3 {
            tracker.record(format!("https://x/a({})", i));
        }

        let err = tracker.cleanup(&transport, true).await.unwrap_err();
        assert_eq!(transport.calls().len(), 3);
        match err {
            BatchError::Cleanup { report, body } => {
                assert_eq!(report.failed, 2);
                assert_eq!(report.deleted, 1);
                assert_eq!(body, "last");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_transport_error_counts_as_failure() {
        let transport = ScriptedTransport::new(vec![
            ("https://x/a(1)", Err(BatchError::Timeout)),
            ("https://x/a(2)", Ok(TransportResponse::new(204, ""))),
        ]);
        let mut tracker = EntityTracker::new();
        tracker.record("https://x/a(1)");
        tracker.record("https://x/a(2)");

        let err = tracker.cleanup(&transport, true).await.unwrap_err();
        assert!(matches!(
            err,
            BatchError::Cleanup { ref report, .. } if report.failed == 1 && report.deleted == 1
        ));
        assert_eq!(transport.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_all_deleted_is_ok() {
        let transport = ScriptedTransport::new(vec![]);
        let mut tracker = EntityTracker::new();
        tracker.record("https://x/a(1)");
        tracker.record("https://x/a(2)");

        let report = tracker.cleanup(&transport, true).await.unwrap();
        assert_eq!(report.deleted, 2);
        assert_eq!(report.attempted(), 2);
        assert!(report.last_failure.is_none());
    }

    #[test]
    fn test_declined_cleanup_sends_nothing() {
        let transport = ScriptedTransport::new(vec![]);
        let mut tracker = EntityTracker::new();
        tracker.record("https://x/a(1)");

        let report = tokio_test::block_on(tracker.cleanup(&transport, false)).unwrap();
        assert_eq!(report, CleanupReport::default());
        assert!(tracker.is_empty());
        assert!(transport.calls().is_empty());
    }

    #[test]
    fn test_report_into_result() {
        assert!(CleanupReport::default().into_result().is_ok());
        let failing = CleanupReport {
            failed: 1,
            last_failure: Some("nope".into()),
            ..Default::default()
        };
        assert!(matches!(
            failing.into_result(),
            Err(BatchError::Cleanup { body, .. }) if body == "nope"
        ));
    }
}
