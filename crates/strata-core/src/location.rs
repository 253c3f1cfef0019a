//! Storage location parsing and rendering.
//!
//! A [`StorageLocation`] is the parsed form of a table's storage URI plus the
//! connection parameters needed to reach it (endpoint, credentials, region).
//! Locations are established once, at table creation or attach time, and are
//! never rewritten afterwards; everything under the location prefix belongs to
//! the table whose commit protocol writes there.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Supported object-storage schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LocationScheme {
    /// Amazon S3 and S3-compatible endpoints.
    S3,
    /// Google Cloud Storage.
    Gcs,
    /// Azure Blob Storage.
    Azblob,
    /// In-memory backend, used in tests.
    Memory,
}

impl LocationScheme {
    /// Parses a scheme using case-insensitive matching.
    ///
    /// # Errors
    ///
    /// Returns [`LocationError::UnknownScheme`] when `raw` is not a supported
    /// scheme.
    pub fn parse(raw: &str) -> Result<Self, LocationError> {
        match raw.to_ascii_lowercase().as_str() {
            "s3" => Ok(Self::S3),
            "gs" | "gcs" => Ok(Self::Gcs),
            "azblob" => Ok(Self::Azblob),
            "memory" => Ok(Self::Memory),
            other => Err(LocationError::UnknownScheme {
                scheme: other.to_string(),
            }),
        }
    }

    /// Returns the canonical lowercase scheme string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::S3 => "s3",
            Self::Gcs => "gs",
            Self::Azblob => "azblob",
            Self::Memory => "memory",
        }
    }
}

impl fmt::Display for LocationScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors for storage location parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    /// The URI was empty.
    #[error("location URI cannot be empty")]
    Empty,

    /// The URI has no `scheme://` separator.
    #[error("location URI '{uri}' has no scheme (expected scheme://bucket/path)")]
    MissingScheme {
        /// The URI that failed to parse.
        uri: String,
    },

    /// The scheme is not supported.
    #[error("unknown storage scheme '{scheme}'; expected one of: s3, gs, azblob, memory")]
    UnknownScheme {
        /// The unsupported scheme.
        scheme: String,
    },

    /// The URI has no bucket component.
    #[error("location URI '{uri}' has no bucket")]
    MissingBucket {
        /// The URI that failed to parse.
        uri: String,
    },

    /// A connection parameter key was empty.
    #[error("connection parameter keys cannot be empty")]
    EmptyConnectionKey,
}

/// Parsed storage location: `scheme://bucket/prefix` plus connection
/// parameters.
///
/// The prefix is stored without leading or trailing slashes; an empty prefix
/// addresses the bucket root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageLocation {
    /// Object-storage scheme.
    pub scheme: LocationScheme,
    /// Bucket (or container) name.
    pub bucket: String,
    /// Key prefix under the bucket.
    pub prefix: String,
    /// Connection parameters (endpoint, region, credentials references).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub connection: BTreeMap<String, String>,
}

impl StorageLocation {
    /// Parses a storage URI of the form `scheme://bucket/prefix`.
    ///
    /// # Errors
    ///
    /// Returns a [`LocationError`] when the URI is empty, has no scheme, an
    /// unknown scheme, or no bucket.
    pub fn parse(uri: &str) -> Result<Self, LocationError> {
        let uri = uri.trim();
        if uri.is_empty() {
            return Err(LocationError::Empty);
        }

        let (scheme_raw, rest) = uri
            .split_once("://")
            .ok_or_else(|| LocationError::MissingScheme {
                uri: uri.to_string(),
            })?;
        let scheme = LocationScheme::parse(scheme_raw)?;

        let (bucket, prefix) = match rest.split_once('/') {
            Some((bucket, prefix)) => (bucket, prefix.trim_matches('/')),
            None => (rest, ""),
        };
        if bucket.is_empty() {
            return Err(LocationError::MissingBucket {
                uri: uri.to_string(),
            });
        }

        Ok(Self {
            scheme,
            bucket: bucket.to_string(),
            prefix: prefix.to_string(),
            connection: BTreeMap::new(),
        })
    }

    /// Attaches connection parameters to this location.
    ///
    /// # Errors
    ///
    /// Returns [`LocationError::EmptyConnectionKey`] if any key is empty.
    pub fn with_connection(
        mut self,
        params: impl IntoIterator<Item = (String, String)>,
    ) -> Result<Self, LocationError> {
        for (key, value) in params {
            if key.trim().is_empty() {
                return Err(LocationError::EmptyConnectionKey);
            }
            self.connection.insert(key, value);
        }
        Ok(self)
    }

    /// Renders the canonical URI form: `scheme://bucket/prefix`.
    #[must_use]
    pub fn uri(&self) -> String {
        if self.prefix.is_empty() {
            format!("{}://{}", self.scheme, self.bucket)
        } else {
            format!("{}://{}/{}", self.scheme, self.bucket, self.prefix)
        }
    }

    /// Returns the backend object key for a path relative to this location.
    #[must_use]
    pub fn key(&self, relative: &str) -> String {
        let relative = relative.trim_start_matches('/');
        if self.prefix.is_empty() {
            format!("{}/{relative}", self.bucket)
        } else {
            format!("{}/{}/{relative}", self.bucket, self.prefix)
        }
    }

    /// Returns the backend key prefix covering every object at this location.
    #[must_use]
    pub fn key_prefix(&self) -> String {
        if self.prefix.is_empty() {
            format!("{}/", self.bucket)
        } else {
            format!("{}/{}/", self.bucket, self.prefix)
        }
    }
}

impl fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri())
    }
}
