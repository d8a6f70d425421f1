//! Batch request builder.
//!
//! Turns an ordered list of [`Operation`]s into a [`BatchEnvelope`]:
//!
//! - writes (anything but GET) go into one changeset, with Content-IDs `1..N`
//!   in submission order unless the operation carries an explicit id;
//! - reads become standalone top-level parts;
//! - the changeset sits where the first write was submitted.
//!
//! ```
//! use odata_batch_http::client::BatchBuilder;
//! use odata_batch_http::{ApiRoot, ApiVersion, BatchPart, Operation};
//! use serde_json::json;
//!
//! let root = ApiRoot::new("https://org/api/data/", ApiVersion::new(9, 1)).unwrap();
//! let envelope = BatchBuilder::new(&root)
//!     .push(Operation::post("contacts", json!({"firstname": "Peter"})))
//!     .push(Operation::post("contacts", json!({"firstname": "Susie"})))
//!     .push(Operation::get("Account_Tasks?$select=subject"))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(envelope.parts().len(), 2);
//! assert!(matches!(envelope.parts()[0], BatchPart::Changeset(_)));
//! assert_eq!(envelope.request_count(), 3);
//! ```

use crate::error::{BatchError, Result};
use crate::types::{ApiRoot, BatchEnvelope, BatchPart, Changeset, Operation, SubRequest};
use http::Method;

/// Builds one envelope from requested operations.
#[derive(Debug, Clone)]
pub struct BatchBuilder {
    root: ApiRoot,
    operations: Vec<Operation>,
}

impl BatchBuilder {
    pub fn new(root: &ApiRoot) -> Self {
        BatchBuilder {
            root: root.clone(),
            operations: Vec::new(),
        }
    }

    pub fn push(mut self, operation: Operation) -> Self {
        self.operations.push(operation);
        self
    }

    pub fn extend(mut self, operations: impl IntoIterator<Item = Operation>) -> Self {
        self.operations.extend(operations);
        self
    }

    /// Validate, partition, and resolve the operations.
    pub fn build(self) -> Result<BatchEnvelope> {
        let mut leading = Vec::new();
        let mut trailing = Vec::new();
        let mut changeset = Changeset::new();
        let mut next_id = 1u32;

        for operation in &self.operations {
            validate(operation)?;
            let uri = self.root.resolve(&operation.path);

            if operation.is_read() {
                let request = SubRequest::get(uri);
                if changeset.is_empty() {
                    leading.push(request);
                } else {
                    trailing.push(request);
                }
            } else {
                let id = operation.content_id.unwrap_or(next_id);
                next_id += 1;
                changeset.push(SubRequest::write(
                    operation.method.clone(),
                    uri,
                    id,
                    operation.payload.clone(),
                ))?;
            }
        }

        let mut envelope = BatchEnvelope::new();
        for request in leading {
            envelope.push(BatchPart::Request(request))?;
        }
        if !changeset.is_empty() {
            envelope.push(BatchPart::Changeset(changeset))?;
        }
        for request in trailing {
            envelope.push(BatchPart::Request(request))?;
        }

        tracing::debug!(
            parts = envelope.parts().len(),
            requests = envelope.request_count(),
            version = %self.root.version(),
            "Built batch envelope"
        );
        Ok(envelope)
    }
}

/// Methods whose request carries an entity.
fn requires_payload(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

fn validate(operation: &Operation) -> Result<()> {
    if operation.is_read() {
        if operation.payload.is_some() {
            return Err(BatchError::Validation(format!(
                "GET {} must not carry a payload",
                operation.path
            )));
        }
        if let Some(id) = operation.content_id {
            return Err(BatchError::Validation(format!(
                "GET {} must not carry Content-ID {}",
                operation.path, id
            )));
        }
    } else if requires_payload(&operation.method) && operation.payload.is_none() {
        return Err(BatchError::Validation(format!(
            "{} {} requires a payload",
            operation.method, operation.path
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ApiVersion;
    use serde_json::json;

    fn root() -> ApiRoot {
        ApiRoot::new("https://x/api/data/", ApiVersion::new(8, 2)).unwrap()
    }

    fn ids(envelope: &BatchEnvelope) -> Vec<Option<u32>> {
        envelope.requests().map(|r| r.content_id).collect()
    }

    #[test]
    fn test_writes_get_sequential_ids() {
        let envelope = BatchBuilder::new(&root())
            .extend((1..=5).map(|i| Operation::post("tasks", json!({"subject": format!("Task {}", i)}))))
            .build()
            .unwrap();
        assert_eq!(envelope.parts().len(), 1);
        assert_eq!(ids(&envelope), [Some(1), Some(2), Some(3), Some(4), Some(5)]);
    }

    #[test]
    fn test_paths_are_version_qualified() {
        let envelope = BatchBuilder::new(&root())
            .push(Operation::get("accounts"))
            .build()
            .unwrap();
        let uri = &envelope.requests().next().unwrap().uri;
        assert_eq!(uri, "https://x/api/data/v8.2/accounts");
    }

    #[test]
    fn test_reads_keep_position_around_changeset() {
        let envelope = BatchBuilder::new(&root())
            .push(Operation::get("first"))
            .push(Operation::post("contacts", json!({})))
            .push(Operation::get("second"))
            .push(Operation::patch("contacts(1)", json!({"a": 1})))
            .build()
            .unwrap();

        let parts = envelope.parts();
        assert_eq!(parts.len(), 3);
        assert!(matches!(&parts[0], BatchPart::Request(r) if r.uri.ends_with("first")));
        assert!(matches!(&parts[1], BatchPart::Changeset(cs) if cs.len() == 2));
        assert!(matches!(&parts[2], BatchPart::Request(r) if r.uri.ends_with("second")));
        assert_eq!(ids(&envelope), [None, Some(1), Some(2), None]);
    }

    #[test]
    fn test_reads_only_no_changeset() {
        let envelope = BatchBuilder::new(&root())
            .push(Operation::get("a"))
            .push(Operation::get("b"))
            .build()
            .unwrap();
        assert!(envelope
            .parts()
            .iter()
            .all(|p| matches!(p, BatchPart::Request(_))));
    }

    #[test]
    fn test_duplicate_explicit_id_fails() {
        let err = BatchBuilder::new(&root())
            .push(Operation::post("contacts", json!({})).with_content_id(7))
            .push(Operation::post("contacts", json!({})).with_content_id(7))
            .build()
            .unwrap_err();
        assert!(matches!(err, BatchError::Validation(_)));
    }

    #[test]
    fn test_explicit_id_colliding_with_auto_id_fails() {
        let result = BatchBuilder::new(&root())
            .push(Operation::post("contacts", json!({})))
            .push(Operation::post("contacts", json!({})).with_content_id(1))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_post_without_payload_fails() {
        let result = BatchBuilder::new(&root())
            .push(Operation::new(Method::POST, "contacts"))
            .build();
        assert!(matches!(result, Err(BatchError::Validation(_))));
    }

    #[test]
    fn test_delete_without_payload_allowed() {
        let envelope = BatchBuilder::new(&root())
            .push(Operation::delete("contacts(1)"))
            .build()
            .unwrap();
        assert_eq!(ids(&envelope), [Some(1)]);
    }

    #[test]
    fn test_get_with_payload_fails() {
        let result = BatchBuilder::new(&root())
            .push(Operation::get("accounts").with_payload(json!({})))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_get_with_content_id_fails() {
        let result = BatchBuilder::new(&root())
            .push(Operation::get("accounts").with_content_id(3))
            .build();
        assert!(result.is_err());
    }
}
