//! Core data types for OData batch requests and responses.

mod request;
mod response;
mod transport;
mod version;

pub use bytes::Bytes;
pub use request::{BatchEnvelope, BatchPart, Changeset, Operation, SubRequest};
pub use response::SubResponse;
pub use transport::{TransportRequest, TransportResponse};
pub use version::{ApiRoot, ApiVersion};
