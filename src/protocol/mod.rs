//! Protocol-level building blocks of the OData batch convention.
//!
//! | Module | Role |
//! |--------|------|
//! | `constants` | Header names, media types, fixed header values |
//! | `headers` | Header blocks and `Content-Type` parameters |
//! | `message` | Embedded HTTP request serialization and response parsing |
//! | `multipart` | Splitting `multipart/mixed` bodies |
//! | `envelope` | Encoding a [`BatchEnvelope`](crate::BatchEnvelope) |
//!
//! Nothing here touches the network.

pub mod constants;
pub mod envelope;
pub mod headers;
pub mod message;
pub mod multipart;

pub use envelope::{encode, generate_boundary, EncodedBatch};
pub use headers::*;
pub use message::{parse_response, serialize_request};
pub use multipart::{sniff_boundary, split_parts, MimePart};
