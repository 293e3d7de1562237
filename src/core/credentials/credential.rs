//! Short-lived storage credentials and their renewal policy

use crate::error::{AccessError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Temporary storage credential issued by the identity provider
///
/// Immutable once created. The broker replaces it wholesale on renewal.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    /// Expiration as Unix epoch milliseconds
    pub expiration_time_ms: i64,
    /// Issue time as Unix epoch milliseconds
    pub acquisition_time_ms: i64,
}

impl Credential {
    /// Lifetime granted at acquisition
    pub fn ttl_ms(&self) -> i64 {
        self.expiration_time_ms - self.acquisition_time_ms
    }

    /// Milliseconds left before expiration at `now_ms` (negative once expired)
    pub fn remaining_ms(&self, now_ms: i64) -> i64 {
        self.expiration_time_ms - now_ms
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"***")
            .field("session_token", &"***")
            .field("expiration_time_ms", &self.expiration_time_ms)
            .field("acquisition_time_ms", &self.acquisition_time_ms)
            .finish()
    }
}

/// Cached credential with its lifetime computed once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialCacheEntry {
    credential: Credential,
    ttl_ms: i64,
}

impl CredentialCacheEntry {
    pub fn new(credential: Credential) -> Self {
        let ttl_ms = credential.ttl_ms();
        CredentialCacheEntry { credential, ttl_ms }
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn ttl_ms(&self) -> i64 {
        self.ttl_ms
    }

    /// Whether the entry can still be served at `now_ms`
    ///
    /// Fresh while the remaining lifetime is at least `threshold` percent of
    /// the total lifetime. An entry with no lifetime is never fresh.
    pub fn is_fresh(&self, now_ms: i64, threshold: RenewalThreshold) -> bool {
        if self.ttl_ms <= 0 {
            return false;
        }
        let remaining = i128::from(self.credential.remaining_ms(now_ms));
        remaining * 100 >= i128::from(threshold.percent()) * i128::from(self.ttl_ms)
    }
}

/// Renew once the remaining lifetime drops below this share of the total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum RenewalThreshold {
    Percent50,
    Percent80,
    #[default]
    Percent90,
    Percent99,
}

impl RenewalThreshold {
    pub fn percent(self) -> u8 {
        match self {
            RenewalThreshold::Percent50 => 50,
            RenewalThreshold::Percent80 => 80,
            RenewalThreshold::Percent90 => 90,
            RenewalThreshold::Percent99 => 99,
        }
    }
}

impl TryFrom<u8> for RenewalThreshold {
    type Error = AccessError;

    fn try_from(percent: u8) -> Result<Self> {
        match percent {
            50 => Ok(RenewalThreshold::Percent50),
            80 => Ok(RenewalThreshold::Percent80),
            90 => Ok(RenewalThreshold::Percent90),
            99 => Ok(RenewalThreshold::Percent99),
            other => Err(AccessError::InvalidConfig(format!(
                "renewal threshold must be one of 50, 80, 90, 99 (got {})",
                other
            ))),
        }
    }
}

impl From<RenewalThreshold> for u8 {
    fn from(threshold: RenewalThreshold) -> u8 {
        threshold.percent()
    }
}

impl fmt::Display for RenewalThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.percent())
    }
}
