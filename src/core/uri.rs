//! Storage URI parsing and formatting
//!
//! Two location forms are supported:
//! - [`StorageUriPrefix`]: a directory-like grouping, `s3://bucket/some/dir/`
//! - [`StorageUriObject`]: a fully qualified object, `s3://bucket/some/dir/file.csv`
//!
//! Which form a string denotes is declared by the caller, never sniffed. Parsing
//! into the wrong form fails with [`AccessError::MalformedUri`].

use crate::error::{AccessError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Scheme written by the `Display` implementations
pub const CANONICAL_SCHEME: &str = "s3";

/// `scheme://bucket` followed by an optional `/rest`
///
/// Dot-all: keys may contain any character, newlines included.
const URI_PATTERN: &str =
    r"(?s)^([A-Za-z][A-Za-z0-9+.\-]*)://([A-Za-z0-9][A-Za-z0-9._\-]*)(/.*)?$";

/// Characters accepted in a bucket name
const BUCKET_PATTERN: &str = r"^[A-Za-z0-9][A-Za-z0-9._\-]*$";

fn uri_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(URI_PATTERN).expect("storage URI pattern is valid"))
}

fn validate_bucket(bucket: &str, uri: &str) -> Result<()> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(BUCKET_PATTERN).expect("bucket pattern is valid"));
    if !re.is_match(bucket) {
        return Err(AccessError::malformed_uri(uri, "invalid bucket name"));
    }
    Ok(())
}

/// Split a raw URI into `(bucket, rest)`, with every leading `/` of `rest` removed.
fn split_uri(s: &str) -> Result<(&str, &str)> {
    let Some(caps) = uri_regex().captures(s) else {
        let reason = match s.split_once("://") {
            None => "expected scheme://bucket/key",
            Some((_, "")) => "missing bucket name",
            Some(_) => "invalid scheme or bucket name",
        };
        return Err(AccessError::malformed_uri(s, reason));
    };

    let bucket = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
    let rest = caps
        .get(3)
        .map(|m| m.as_str().trim_start_matches('/'))
        .unwrap_or_default();

    Ok((bucket, rest))
}

/// A directory-like storage location
///
/// `key_prefix` is either empty (the bucket root) or ends with `/`, and never
/// starts with `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StorageUriPrefix {
    bucket: String,
    key_prefix: String,
}

impl StorageUriPrefix {
    /// Build a prefix from its parts, enforcing the key prefix invariants
    pub fn new(bucket: impl Into<String>, key_prefix: impl Into<String>) -> Result<Self> {
        let bucket = bucket.into();
        let key_prefix = key_prefix.into();
        let uri = format!("{}://{}/{}", CANONICAL_SCHEME, bucket, key_prefix);

        validate_bucket(&bucket, &uri)?;
        if key_prefix.starts_with('/') {
            return Err(AccessError::malformed_uri(&uri, "key prefix must not start with /"));
        }
        if !key_prefix.is_empty() && !key_prefix.ends_with('/') {
            return Err(AccessError::malformed_uri(&uri, "key prefix must end with /"));
        }

        Ok(StorageUriPrefix { bucket, key_prefix })
    }

    /// Parse `scheme://bucket/rest` into a prefix
    ///
    /// In strict mode a non-empty `rest` must end with `/`. In lenient mode the
    /// trailing `/` is appended when missing.
    ///
    /// # Examples
    ///
    /// ```
    /// use storage_access::StorageUriPrefix;
    ///
    /// let p = StorageUriPrefix::parse("s3://bucket/data/raw", false).unwrap();
    /// assert_eq!(p.key_prefix(), "data/raw/");
    /// assert!(StorageUriPrefix::parse("s3://bucket/data/raw", true).is_err());
    /// ```
    pub fn parse(s: &str, strict: bool) -> Result<Self> {
        let (bucket, rest) = split_uri(s)?;

        let key_prefix = if rest.is_empty() || rest.ends_with('/') {
            rest.to_string()
        } else if strict {
            return Err(AccessError::malformed_uri(s, "must end with /"));
        } else {
            format!("{}/", rest)
        };

        Ok(StorageUriPrefix {
            bucket: bucket.to_string(),
            key_prefix,
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    /// True for `s3://bucket/`
    pub fn is_bucket_root(&self) -> bool {
        self.key_prefix.is_empty()
    }

    /// Enclosing prefix, `None` at the bucket root
    pub fn parent(&self) -> Option<StorageUriPrefix> {
        if self.is_bucket_root() {
            return None;
        }
        let trimmed = &self.key_prefix[..self.key_prefix.len() - 1];
        let key_prefix = match trimmed.rfind('/') {
            Some(idx) => trimmed[..=idx].to_string(),
            None => String::new(),
        };
        Some(StorageUriPrefix {
            bucket: self.bucket.clone(),
            key_prefix,
        })
    }

    /// Last directory name, empty at the bucket root
    pub fn dirname(&self) -> &str {
        let trimmed = self.key_prefix.trim_end_matches('/');
        trimmed.rsplit('/').next().unwrap_or(trimmed)
    }

    /// Child directory of this prefix
    pub fn join_prefix(&self, dirname: &str) -> Result<StorageUriPrefix> {
        let dirname = dirname.trim_matches('/');
        if dirname.is_empty() {
            return Err(AccessError::malformed_uri(
                &format!("{}{}", self, dirname),
                "empty directory name",
            ));
        }
        StorageUriPrefix::new(
            self.bucket.clone(),
            format!("{}{}/", self.key_prefix, dirname),
        )
    }

    /// Object directly under this prefix
    pub fn join_object(&self, basename: &str) -> Result<StorageUriObject> {
        StorageUriObject::new(
            self.bucket.clone(),
            format!("{}{}", self.key_prefix, basename),
        )
    }
}

impl fmt::Display for StorageUriPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}/{}", CANONICAL_SCHEME, self.bucket, self.key_prefix)
    }
}

impl FromStr for StorageUriPrefix {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self> {
        StorageUriPrefix::parse(s, true)
    }
}

impl TryFrom<String> for StorageUriPrefix {
    type Error = AccessError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<StorageUriPrefix> for String {
    fn from(p: StorageUriPrefix) -> String {
        p.to_string()
    }
}

/// A fully qualified object location
///
/// `key` is non-empty and never ends with `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StorageUriObject {
    bucket: String,
    key: String,
}

impl StorageUriObject {
    /// Build an object location from its parts
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Result<Self> {
        let bucket = bucket.into();
        let key = key.into();
        let uri = format!("{}://{}/{}", CANONICAL_SCHEME, bucket, key);

        validate_bucket(&bucket, &uri)?;
        if key.is_empty() || key.ends_with('/') {
            return Err(AccessError::malformed_uri(
                &uri,
                "denotes a directory, expected an object key",
            ));
        }
        if key.starts_with('/') {
            return Err(AccessError::malformed_uri(&uri, "key must not start with /"));
        }

        Ok(StorageUriObject { bucket, key })
    }

    /// Parse a fully qualified object URI
    ///
    /// Goes through lenient prefix parsing and then rejects inputs that denote
    /// a directory (empty key or trailing `/`).
    pub fn parse(s: &str) -> Result<Self> {
        let (_, rest) = split_uri(s)?;
        if rest.is_empty() || rest.ends_with('/') {
            return Err(AccessError::malformed_uri(
                s,
                "denotes a directory, expected an object key",
            ));
        }

        let prefix = StorageUriPrefix::parse(s, false)?;
        let key = prefix.key_prefix.trim_end_matches('/').to_string();

        Ok(StorageUriObject {
            bucket: prefix.bucket,
            key,
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// File name component of the key
    pub fn basename(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or(&self.key)
    }

    /// Prefix the object lives in
    pub fn parent(&self) -> StorageUriPrefix {
        let key_prefix = match self.key.rfind('/') {
            Some(idx) => self.key[..=idx].to_string(),
            None => String::new(),
        };
        StorageUriPrefix {
            bucket: self.bucket.clone(),
            key_prefix,
        }
    }
}

impl fmt::Display for StorageUriObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}/{}", CANONICAL_SCHEME, self.bucket, self.key)
    }
}

impl FromStr for StorageUriObject {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self> {
        StorageUriObject::parse(s)
    }
}

impl TryFrom<String> for StorageUriObject {
    type Error = AccessError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<StorageUriObject> for String {
    fn from(o: StorageUriObject) -> String {
        o.to_string()
    }
}

/// Parse a prefix URI (see [`StorageUriPrefix::parse`])
pub fn parse_prefix(s: &str, strict: bool) -> Result<StorageUriPrefix> {
    StorageUriPrefix::parse(s, strict)
}

/// Format a prefix as `s3://bucket/key_prefix`
pub fn stringify_prefix(prefix: &StorageUriPrefix) -> String {
    prefix.to_string()
}

/// Parse a fully qualified object URI (see [`StorageUriObject::parse`])
pub fn parse_object(s: &str) -> Result<StorageUriObject> {
    StorageUriObject::parse(s)
}

/// True iff `s` parses as a prefix in strict mode
pub fn is_prefix(s: &str) -> bool {
    StorageUriPrefix::parse(s, true).is_ok()
}
