//! # OData Batch over HTTP
//!
//! This crate packages several logical HTTP operations into one physical
//! `$batch` request using the OData multipart convention, and unpacks the
//! nested multipart response into ordered, individually addressable results.
//!
//! ## Overview
//!
//! A batch envelope is a `multipart/mixed` body. Each top-level part is either:
//!
//! 1. **A changeset**: a nested `multipart/mixed` part holding write requests
//!    that the server applies atomically, each tagged with a `Content-ID`
//! 2. **A standalone request**: typically a read, embedded directly
//!
//! The response mirrors that structure. Responses carry no key back to their
//! request; their position is the only correlation, so the demultiplexer keeps
//! document order exactly.
//!
//! ## Control Flow
//!
//! ```text
//! Operation* ─► BatchBuilder ─► BatchEnvelope ─► encode ─► Transport (POST $batch)
//!                                                              │
//! EntityTracker ◄─ classify_all ◄─ Vec<SubResponse> ◄─ decode ◄┘
//!       │
//!       └─► cleanup (DELETE each created entity)
//! ```
//!
//! Only the transport touches the network. Everything else is a pure data
//! transformation and can be tested without a server.
//!
//! ## Client Usage
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
//!     // One unbatched call establishes the version segment for the session.
//!     let root = client.discover_version().await?;
//!
//!     let batch = client
//!         .builder(&root)
//!         .push(Operation::post("contacts", json!({"firstname": "Peter", "lastname": "Cambel"})))
//!         .push(Operation::post("contacts", json!({"firstname": "Susie", "lastname": "Curtis"})))
//!         .push(Operation::get("Account_Tasks?$select=subject"))
//!         .build()?;
//!
//!     let mut tracker = EntityTracker::new();
//!     for outcome in client.execute(&root, &batch, &mut tracker).await? {
//!         println!("{:?}", outcome);
//!     }
//!
//!     let report = client.cleanup(&mut tracker, true).await?;
//!     println!("deleted {}", report.deleted);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Structure
//!
//! - **[types]** - Operations, envelope parts, sub-responses, API version
//! - **[error]** - Error types and result handling
//! - **[protocol]** - Envelope encoding, multipart splitting, embedded HTTP messages
//! - **[client]** - Builder, batch client, demultiplexer, classifier, tracker

pub mod client;
pub mod error;
pub mod protocol;
pub mod types;

pub use client::{BatchBuilder, BatchClient, ClientConfig, EntityTracker, Outcome};
pub use error::{BatchError, Result};
pub use types::{
    ApiRoot, ApiVersion, BatchEnvelope, BatchPart, Changeset, Operation, SubRequest, SubResponse,
};
