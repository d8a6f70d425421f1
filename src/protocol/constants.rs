//! Wire constants of the OData batch convention.

/// Header names, in the canonical casing they are written with.
pub mod headers {
    pub const ACCEPT: &str = "Accept";
    pub const AUTHORIZATION: &str = "Authorization";
    pub const CONTENT_ID: &str = "Content-ID";
    pub const CONTENT_LENGTH: &str = "Content-Length";
    pub const CONTENT_TRANSFER_ENCODING: &str = "Content-Transfer-Encoding";
    pub const CONTENT_TYPE: &str = "Content-Type";
    pub const LOCATION: &str = "Location";
    pub const ODATA_ENTITY_ID: &str = "OData-EntityId";
    pub const ODATA_MAX_VERSION: &str = "OData-MaxVersion";
    pub const ODATA_VERSION: &str = "OData-Version";
    pub const PREFER: &str = "Prefer";
}

/// Media types used in envelopes.
pub mod media_types {
    pub const APPLICATION_HTTP: &str = "application/http";
    pub const APPLICATION_JSON: &str = "application/json";
    pub const JSON_ENTRY: &str = "application/json;type=entry";
    pub const MULTIPART_MIXED: &str = "multipart/mixed";
}

/// `OData-Version` and `OData-MaxVersion` value.
pub const ODATA_PROTOCOL_VERSION: &str = "4.0";

/// `Prefer` value asking for formatted display values.
pub const PREFER_FORMATTED_VALUES: &str =
    "odata.include-annotations=\"OData.Community.Display.V1.FormattedValue\"";

/// Protocol token of embedded request lines.
pub const HTTP_VERSION: &str = "HTTP/1.1";

/// `Content-Transfer-Encoding` of embedded messages.
pub const BINARY: &str = "binary";

pub const CRLF: &[u8] = b"\r\n";

/// Boundary prefix of the outer envelope.
pub const BATCH_BOUNDARY_PREFIX: &str = "batch_";

/// Boundary prefix of a changeset.
pub const CHANGESET_BOUNDARY_PREFIX: &str = "changeset_";
