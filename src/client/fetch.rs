//! Main batch client implementation.
//!
//! Provides [`BatchClient`], the only component that issues network calls:
//! the version discovery GET, the `$batch` POST, and the cleanup deletes.
//!
//! # Examples
//!
//! ```ignore
//! use odata_batch_http::client::{BatchClient, BearerToken, ClientConfig, EntityTracker};
//! use odata_batch_http::Operation;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::new("https://org.crm.dynamics.com/api/data/");
//!     let client = BatchClient::new(config, Arc::new(BearerToken::new("token")))?;
//!
//!     let root = client.discover_version().await?;
//!     let envelope = client
//!         .builder(&root)
//!         .push(Operation::post("contacts", json!({"firstname": "Peter"})))
//!         .push(Operation::get("Account_Tasks?$select=subject"))
//!         .build()?;
//!
//!     let mut tracker = EntityTracker::new();
//!     let outcomes = client.execute(&root, &envelope, &mut tracker).await?;
//!     println!("{:?}", outcomes);
//!
//!     client.cleanup(&mut tracker, true).await?;
//!     Ok(())
//! }
//! ```

use crate::client::builder::BatchBuilder;
use crate::client::classify::{classify_all, Outcome};
use crate::client::config::ClientConfig;
use crate::client::parser;
use crate::client::tracker::{CleanupReport, EntityTracker};
use crate::client::transport::{CredentialProvider, ReqwestTransport, Transport};
use crate::error::{BatchError, Result};
use crate::protocol::constants::{headers, media_types, ODATA_PROTOCOL_VERSION};
use crate::protocol::envelope;
use crate::types::{ApiRoot, ApiVersion, BatchEnvelope, SubResponse, TransportRequest};
use http::Method;
use serde::Deserialize;
use std::sync::Arc;

/// Body of a `RetrieveVersion` response.
#[derive(Debug, Deserialize)]
struct RetrieveVersionResponse {
    #[serde(rename = "Version")]
    version: String,
}

/// The OData batch client.
///
/// Holds one transport, reused for every call of a session. Not meant for
/// concurrent batches over the same transport.
#[derive(Clone)]
pub struct BatchClient<T = ReqwestTransport> {
    transport: T,
    config: Arc<ClientConfig>,
}

impl BatchClient<ReqwestTransport> {
    /// Create a client over `reqwest` with the given credentials.
    pub fn new(config: ClientConfig, credentials: Arc<dyn CredentialProvider>) -> Result<Self> {
        let transport = ReqwestTransport::new(&config, credentials)?;
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> BatchClient<T> {
    /// Create a client over any transport.
    pub fn with_transport(config: ClientConfig, transport: T) -> Result<Self> {
        config.validate()?;
        Ok(BatchClient {
            transport,
            config: Arc::new(config),
        })
    }

    /// Discover the service's API version.
    ///
    /// Issues one unbatched `GET .../v{fallback}/RetrieveVersion` and returns the
    /// root to use for the rest of the session. Any status but 200, or a body
    /// without a parseable `Version`, is [`BatchError::VersionDiscovery`].
    pub async fn discover_version(&self) -> Result<ApiRoot> {
        let fallback = self.config.api_root()?;
        let request = with_odata_headers(TransportRequest::get(fallback.retrieve_version_url()));
        let response = self.transport.send(request).await?;

        if response.status != 200 {
            tracing::error!(status = response.status, "Failed to retrieve the version");
            return Err(BatchError::VersionDiscovery {
                status: response.status,
                body: response.body_text(),
            });
        }

        let version = serde_json::from_slice::<RetrieveVersionResponse>(&response.body)
            .ok()
            .and_then(|parsed| parsed.version.parse::<ApiVersion>().ok())
            .ok_or_else(|| {
                tracing::error!("RetrieveVersion answered without a usable Version");
                BatchError::VersionDiscovery {
                    status: response.status,
                    body: response.body_text(),
                }
            })?;
        tracing::info!("RetrieveVersion: {}", version);
        Ok(fallback.with_version(version))
    }

    /// A builder resolving paths against `root`.
    pub fn builder(&self, root: &ApiRoot) -> BatchBuilder {
        BatchBuilder::new(root)
    }

    /// Send one envelope as a single `$batch` call and demultiplex the answer.
    ///
    /// The returned responses follow envelope order. A non-2xx top-level status
    /// is [`BatchError::BatchRejected`]; failures of individual operations are
    /// left in the returned responses.
    pub async fn send_batch(&self, root: &ApiRoot, batch: &BatchEnvelope) -> Result<Vec<SubResponse>> {
        if batch.is_empty() {
            return Err(BatchError::Validation("batch has no operations".into()));
        }

        let encoded = envelope::encode(batch)?;
        let request = with_odata_headers(TransportRequest::new(Method::POST, root.batch_url()))
            .with_header(headers::PREFER, self.config.prefer.as_str())
            .with_header(headers::CONTENT_TYPE, encoded.content_type())
            .with_body(encoded.body.clone());

        tracing::debug!(
            url = %root.batch_url(),
            boundary = %encoded.boundary,
            requests = batch.request_count(),
            "Sending batch"
        );
        let response = self.transport.send(request).await?;

        if !response.is_success() {
            return Err(BatchError::BatchRejected {
                status: response.status,
                body: response.body_text(),
            });
        }

        let content_type = response.header(headers::CONTENT_TYPE).unwrap_or_default();
        let responses = parser::decode(content_type, &response.body)?;

        if responses.len() != batch.request_count() {
            tracing::warn!(
                expected = batch.request_count(),
                decoded = responses.len(),
                "Batch response count differs from request count"
            );
        }
        Ok(responses)
    }

    /// Send a batch, classify every response, and record created entities.
    pub async fn execute(
        &self,
        root: &ApiRoot,
        batch: &BatchEnvelope,
        tracker: &mut EntityTracker,
    ) -> Result<Vec<Outcome>> {
        let responses = self.send_batch(root, batch).await?;
        Ok(classify_all(&responses, tracker))
    }

    /// Delete every tracked entity over this client's transport.
    pub async fn cleanup(&self, tracker: &mut EntityTracker, confirm: bool) -> Result<CleanupReport> {
        tracker.cleanup(&self.transport, confirm).await
    }

    /// Close a run: clean up whatever it created, then report its result.
    ///
    /// Cleanup runs whenever the tracker holds entities, whether or not `run`
    /// failed. A cleanup error becomes the result of the run; an earlier run
    /// error it replaces is logged.
    pub async fn finish_run<R>(
        &self,
        tracker: &mut EntityTracker,
        confirm: bool,
        run: Result<R>,
    ) -> Result<R> {
        if tracker.is_empty() {
            return run;
        }
        match (self.cleanup(tracker, confirm).await, run) {
            (Err(cleanup), Err(earlier)) => {
                tracing::warn!("Run failed before cleanup: {}", earlier);
                Err(cleanup)
            }
            (Err(cleanup), Ok(_)) => Err(cleanup),
            (Ok(_), run) => run,
        }
    }

    /// Get the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

fn with_odata_headers(request: TransportRequest) -> TransportRequest {
    request
        .with_header(headers::ODATA_MAX_VERSION, ODATA_PROTOCOL_VERSION)
        .with_header(headers::ODATA_VERSION, ODATA_PROTOCOL_VERSION)
        .with_header(headers::ACCEPT, media_types::APPLICATION_JSON)
}
