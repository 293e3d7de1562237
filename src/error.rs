//! Error types for storage access operations

use std::sync::Arc;
use thiserror::Error;

/// Storage access result type
pub type Result<T> = std::result::Result<T, AccessError>;

/// Storage access errors
///
/// Cloneable so that a single failed credential acquisition can be handed to
/// every caller that was waiting on it.
#[derive(Error, Debug, Clone)]
pub enum AccessError {
    /// Storage URI could not be parsed
    #[error("Malformed storage URI '{uri}': {reason}")]
    MalformedUri { uri: String, reason: String },

    /// Credential collaborator failed
    #[error("Credential acquisition failed: {0:#}")]
    CredentialAcquisitionFailed(Arc<anyhow::Error>),

    /// Listing one directory of the tree failed
    #[error("Directory listing failed for '{path}': {cause:#}")]
    DirectoryListingFailed {
        path: String,
        cause: Arc<anyhow::Error>,
    },

    /// Allow-list entry is structurally invalid
    #[error("Invalid allow-list pattern '{pattern}': {reason}")]
    InvalidAllowListPattern { pattern: String, reason: String },

    /// Key inherits its public status from a parent rule
    #[error("Policy of '{0}' is inherited from a parent rule and cannot be changed")]
    PolicyNotChangeable(String),

    /// Configuration could not be loaded or failed validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl AccessError {
    pub(crate) fn malformed_uri(uri: &str, reason: impl Into<String>) -> Self {
        AccessError::MalformedUri {
            uri: uri.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_pattern(pattern: &str, reason: impl Into<String>) -> Self {
        AccessError::InvalidAllowListPattern {
            pattern: pattern.to_string(),
            reason: reason.into(),
        }
    }
}
