//! The transport seam and its `reqwest` implementation.
//!
//! The batch client never talks to the network directly; it hands a
//! [`TransportRequest`] to a [`Transport`] and gets a [`TransportResponse`]
//! back. Authentication is the transport's concern: [`ReqwestTransport`] asks
//! its [`CredentialProvider`] for an `Authorization` value on every request.
//!
//! A transport is reused for version discovery, the batch call, and cleanup.
//! Calls are issued one at a time.

use crate::client::config::ClientConfig;
use crate::error::{BatchError, Result};
use crate::protocol::constants::headers;
use crate::types::{TransportRequest, TransportResponse};
use async_trait::async_trait;
use http::Method;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Physical HTTP exchange.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request and wait for its response.
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse>;

    /// Delete the resource at an absolute uri.
    async fn delete(&self, uri: &str) -> Result<TransportResponse> {
        self.send(TransportRequest::new(Method::DELETE, uri)).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse> {
        (**self).send(request).await
    }

    async fn delete(&self, uri: &str) -> Result<TransportResponse> {
        (**self).delete(uri).await
    }
}

/// Source of the `Authorization` header value.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Header value for the next request, or `None` to send it unauthenticated.
    async fn authorization(&self) -> Result<Option<String>>;
}

/// No credentials.
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

#[async_trait]
impl CredentialProvider for Anonymous {
    async fn authorization(&self) -> Result<Option<String>> {
        Ok(None)
    }
}

/// A pre-acquired OAuth bearer token.
#[derive(Clone)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        BearerToken(token.into())
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BearerToken(..)")
    }
}

#[async_trait]
impl CredentialProvider for BearerToken {
    async fn authorization(&self) -> Result<Option<String>> {
        Ok(Some(format!("Bearer {}", self.0)))
    }
}

/// [`Transport`] over a `reqwest::Client`.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    credentials: Arc<dyn CredentialProvider>,
    enable_logging: bool,
}

impl ReqwestTransport {
    /// Build a transport from the client configuration.
    pub fn new(config: &ClientConfig, credentials: Arc<dyn CredentialProvider>) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(config.max_idle_connections);

        if !config.proxy_url.is_empty() {
            let proxy = reqwest::Proxy::all(&config.proxy_url)
                .map_err(|e| BatchError::Config(format!("Invalid proxy url: {}", e)))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| BatchError::Config(format!("Cannot build HTTP client: {}", e)))?;

        Ok(ReqwestTransport {
            client,
            credentials,
            enable_logging: config.enable_logging,
        })
    }

    /// Unauthenticated transport.
    pub fn anonymous(config: &ClientConfig) -> Result<Self> {
        Self::new(config, Arc::new(Anonymous))
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse> {
        let method = request.method.clone();
        let url = request.url.clone();
        if self.enable_logging {
            tracing::debug!(method = %method, url = %url, bytes = request.body.len(), "Sending request");
        }

        let mut req_builder = self.client.request(request.method, &request.url);
        for (k, v) in &request.headers {
            req_builder = req_builder.header(k.as_str(), v.as_str());
        }
        if let Some(auth) = self.credentials.authorization().await? {
            req_builder = req_builder.header(headers::AUTHORIZATION, auth);
        }
        if !request.body.is_empty() {
            req_builder = req_builder.body(request.body);
        }

        let response = req_builder.send().await?;
        let status = response.status().as_u16();

        let mut response_headers = BTreeMap::new();
        for (k, v) in response.headers() {
            if let Ok(val) = v.to_str() {
                response_headers
                    .entry(k.as_str().to_string())
                    .or_insert_with(|| val.to_string());
            }
        }

        let body = response.bytes().await?;

        if self.enable_logging {
            tracing::debug!(method = %method, url = %url, status, bytes = body.len(), "Received response");
        }

        Ok(TransportResponse {
            status,
            headers: response_headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bearer_token_header() {
        let token = BearerToken::new("abc");
        assert_eq!(token.authorization().await.unwrap().as_deref(), Some("Bearer abc"));
        assert_eq!(format!("{:?}", token), "BearerToken(..)");
    }

    #[tokio::test]
    async fn test_anonymous_has_no_header() {
        assert!(Anonymous.authorization().await.unwrap().is_none());
    }

    #[test]
    fn test_invalid_proxy_rejected() {
        let config = ClientConfig {
            proxy_url: "http://[bad".into(),
            ..ClientConfig::new("https://x/api/data/")
        };
        assert!(matches!(
            ReqwestTransport::anonymous(&config),
            Err(BatchError::Config(_))
        ));
    }
}
