//! Configuration for the credential broker and the tree crawler
//!
//! Loaded from TOML. Every section and every key is optional:
//!
//! ```toml
//! [credentials]
//! renewal_threshold_percent = 90   # one of 50, 80, 90, 99
//!
//! [crawler]
//! max_concurrent_listings = 32     # 1..=256
//! ```

use crate::core::crawl::DEFAULT_MAX_CONCURRENT_LISTINGS;
use crate::core::credentials::RenewalThreshold;
use crate::error::{AccessError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;
use validator::Validate;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct AccessConfig {
    #[validate(nested)]
    pub credentials: CredentialConfig,
    #[validate(nested)]
    pub crawler: CrawlerConfig,
}

/// `[credentials]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct CredentialConfig {
    /// Renew once less than this share of the lifetime remains
    #[serde(rename = "renewal_threshold_percent")]
    pub renewal_threshold: RenewalThreshold,
}

/// `[crawler]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default, deny_unknown_fields)]
pub struct CrawlerConfig {
    #[validate(range(min = 1, max = 256))]
    pub max_concurrent_listings: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        CrawlerConfig {
            max_concurrent_listings: DEFAULT_MAX_CONCURRENT_LISTINGS,
        }
    }
}

impl AccessConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: AccessConfig =
            toml::from_str(s).map_err(|e| AccessError::InvalidConfig(e.to_string()))?;
        config.check()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading configuration from {}", path.display());

        let contents = std::fs::read_to_string(path).map_err(|e| {
            AccessError::InvalidConfig(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&contents)
    }

    /// Serialize back to TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| AccessError::InvalidConfig(e.to_string()))
    }

    /// Run the range checks
    pub fn check(&self) -> Result<()> {
        self.validate()
            .map_err(|e| AccessError::InvalidConfig(e.to_string()))
    }
}
