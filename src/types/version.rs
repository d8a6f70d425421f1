//! Web API version and the version-qualified service root.
//!
//! Every resource path of an OData Web API lives under a version segment:
//!
//! ```text
//! https://org.example.com/api/data/v8.2/contacts
//! \_____________ base ____________/\__/\_______/
//!                              version  relative path
//! ```
//!
//! The version is not known before the session starts. A fallback (8.2) is used
//! for the one unbatched `RetrieveVersion` call, and the discovered value is
//! carried in an [`ApiRoot`] for every later path resolution.
//!
//! # Examples
//!
//! ```
//! use odata_batch_http::{ApiRoot, ApiVersion};
//!
//! let version: ApiVersion = "9.1.0.643".parse().unwrap();
//! assert_eq!(version, ApiVersion::new(9, 1));
//! assert_eq!(version.path_segment(), "v9.1/");
//!
//! let root = ApiRoot::new("https://org.example.com/api/data/", version).unwrap();
//! assert_eq!(
//!     root.resolve("contacts"),
//!     "https://org.example.com/api/data/v9.1/contacts"
//! );
//! ```

use crate::error::{BatchError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// A `major.minor` Web API version.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ApiVersion {
    /// Major component.
    pub major: u32,
    /// Minor component.
    pub minor: u32,
}

impl ApiVersion {
    /// Version used before discovery completes.
    pub const FALLBACK: ApiVersion = ApiVersion { major: 8, minor: 2 };

    /// Create a version from its components.
    pub const fn new(major: u32, minor: u32) -> Self {
        ApiVersion { major, minor }
    }

    /// The path segment for this version, e.g. `v8.2/`.
    pub fn path_segment(&self) -> String {
        format!("v{}/", self)
    }
}

impl Default for ApiVersion {
    fn default() -> Self {
        Self::FALLBACK
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for ApiVersion {
    type Err = BatchError;

    /// Parse `"8.2"`, `"8.2.0"`, `"9.1.0.643"`; components past the minor are ignored.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || BatchError::Config(format!("Invalid API version: {:?}", s));
        let mut parts = s.trim().split('.');
        let major = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(invalid)?;
        let minor = parts
            .next()
            .and_then(|p| p.parse().ok())
            .ok_or_else(invalid)?;
        Ok(ApiVersion { major, minor })
    }
}

/// The service base address paired with the session's API version.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiRoot {
    base: Url,
    version: ApiVersion,
}

impl ApiRoot {
    /// Create a root from a base address such as `https://org/api/data/`.
    ///
    /// A missing trailing `/` is added so that relative joins keep the last segment.
    pub fn new(base: &str, version: ApiVersion) -> Result<Self> {
        let trimmed = base.trim();
        let normalized = if trimmed.ends_with('/') {
            trimmed.to_string()
        } else {
            format!("{}/", trimmed)
        };
        let base = Url::parse(&normalized)?;
        if base.cannot_be_a_base() {
            return Err(BatchError::Config(format!(
                "Service url cannot be used as a base: {}",
                base
            )));
        }
        Ok(ApiRoot { base, version })
    }

    /// The unversioned base address.
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// The session's API version.
    pub fn version(&self) -> ApiVersion {
        self.version
    }

    /// Same base address with a different version.
    pub fn with_version(&self, version: ApiVersion) -> Self {
        ApiRoot {
            base: self.base.clone(),
            version,
        }
    }

    /// Base address plus version segment, e.g. `https://org/api/data/v8.2/`.
    pub fn versioned_base(&self) -> String {
        format!("{}{}", self.base.as_str(), self.version.path_segment())
    }

    /// Resolve a relative resource path against the versioned base.
    ///
    /// A path that already starts with the versioned base is returned unchanged.
    pub fn resolve(&self, path: &str) -> String {
        let versioned = self.versioned_base();
        if path.starts_with(&versioned) {
            path.to_string()
        } else {
            format!("{}{}", versioned, path.trim_start_matches('/'))
        }
    }

    /// Address of the `$batch` endpoint.
    pub fn batch_url(&self) -> String {
        self.resolve("$batch")
    }

    /// Address of the `RetrieveVersion` function.
    pub fn retrieve_version_url(&self) -> String {
        self.resolve("RetrieveVersion")
    }
}
