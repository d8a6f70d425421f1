//! OData batch client implementation.
//!
//! This module turns logical operations into one `$batch` call and the answer
//! back into ordered outcomes:
//!
//! - **Build** an envelope from operations, assigning Content-IDs
//! - **Send** it as one physical request through a [`Transport`]
//! - **Demultiplex** the nested multipart response in submission order
//! - **Classify** every sub-response and track created entities
//! - **Clean up** tracked entities with a best-effort delete pass
//!
//! # Module Organization
//!
//! ```text
//! client/
//! ├── builder   - BatchBuilder, operations to envelope
//! ├── classify  - Outcome and status classification
//! ├── config    - Client configuration
//! ├── fetch     - BatchClient and the network calls
//! ├── parser    - Batch response demultiplexer
//! ├── tracker   - EntityTracker and cleanup tally
//! └── transport - Transport seam, credentials, reqwest transport
//! ```
//!
//! # Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`BatchClient`] | Version discovery, batch send, cleanup |
//! | [`BatchBuilder`] | Validating envelope builder |
//! | [`Outcome`] | Classified result of one sub-response |
//! | [`EntityTracker`] | Created entity URIs of one run |
//! | [`Transport`] | Physical HTTP exchange |
//! | [`ClientConfig`] | Client configuration options |
//!
//! # Examples
//!
//! ## Classifying a decoded batch
//!
//! ```
//! use odata_batch_http::client::{classify_all, EntityTracker, Outcome};
//! use odata_batch_http::SubResponse;
//! use http::StatusCode;
//!
//! let responses = vec![
//!     SubResponse::new(StatusCode::NO_CONTENT)
//!         .with_header("OData-EntityId", "https://org/api/data/v8.2/contacts(1)"),
//!     SubResponse::new(StatusCode::OK).with_body("{\"value\":[]}"),
//! ];
//!
//! let mut tracker = EntityTracker::new();
//! let outcomes = classify_all(&responses, &mut tracker);
//! assert!(matches!(outcomes[0], Outcome::Created { .. }));
//! assert_eq!(tracker.len(), 1);
//! ```

mod builder;
mod classify;
mod config;
mod fetch;
mod parser;
mod tracker;
mod transport;

pub use builder::BatchBuilder;
pub use classify::{classify, classify_all, entity_location, Outcome};
pub use config::ClientConfig;
pub use fetch::BatchClient;
pub use parser::{decode, decode_with_boundary};
pub use tracker::{CleanupReport, EntityTracker};
pub use transport::{Anonymous, BearerToken, CredentialProvider, ReqwestTransport, Transport};
