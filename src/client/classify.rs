//! Response classification.
//!
//! | Status | Outcome |
//! |--------|---------|
//! | 204 with `OData-EntityId` (or `Location`) | [`Outcome::Created`] |
//! | 204 without a location header | [`Outcome::Success`] with an empty body |
//! | 200 | [`Outcome::Success`] with the body verbatim |
//! | anything else | [`Outcome::Failed`] with the reason phrase |
//!
//! A failed sub-response is an outcome, not an error: the batch as a whole was
//! accepted and sibling results remain meaningful.

use crate::client::tracker::EntityTracker;
use crate::protocol::constants::headers;
use crate::types::SubResponse;
use http::StatusCode;

/// Semantic result of one sub-response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// A new entity exists at `entity_uri`.
    Created { entity_uri: String },
    /// The operation succeeded; `body` is the raw response text.
    Success { body: String },
    /// The operation failed.
    Failed { status: u16, reason: String },
}

impl Outcome {
    #[inline]
    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failed { .. })
    }

    pub fn entity_uri(&self) -> Option<&str> {
        match self {
            Outcome::Created { entity_uri } => Some(entity_uri),
            _ => None,
        }
    }
}

/// Where a creating response puts the new entity's address.
pub fn entity_location(response: &SubResponse) -> Option<&str> {
    response
        .header(headers::ODATA_ENTITY_ID)
        .or_else(|| response.header(headers::LOCATION))
        .filter(|uri| !uri.is_empty())
}

/// Classify one sub-response.
pub fn classify(response: &SubResponse) -> Outcome {
    match response.status {
        StatusCode::NO_CONTENT => match entity_location(response) {
            Some(uri) => Outcome::Created {
                entity_uri: uri.to_string(),
            },
            None => Outcome::Success {
                body: String::new(),
            },
        },
        StatusCode::OK => Outcome::Success {
            body: response.body_text(),
        },
        status => Outcome::Failed {
            status: status.as_u16(),
            reason: response.reason.clone(),
        },
    }
}

/// Classify every sub-response in order, recording created entities.
pub fn classify_all(responses: &[SubResponse], tracker: &mut EntityTracker) -> Vec<Outcome> {
    responses
        .iter()
        .map(|response| {
            let outcome = classify(response);
            match &outcome {
                Outcome::Created { entity_uri } => {
                    tracing::info!("Entity URI: {}", entity_uri);
                    tracker.record(entity_uri.clone());
                }
                Outcome::Success { body } => {
                    tracing::info!("Request was successful: {}", body);
                }
                Outcome::Failed { status, reason } => {
                    tracing::warn!(status, "Request failed for reason: {}", reason);
                }
            }
            outcome
        })
        .collect()
}
