//! # Storage Access - Object-Storage Access Support Layer
//!
//! `storage-access` holds the logic a storage client needs around its calls to
//! an S3-compatible service:
//!
//! - **Credentials**: short-lived keys cached under a renewal threshold, with
//!   concurrent renewals coalesced into one acquisition
//! - **URIs**: strict parsing and canonical formatting of `s3://bucket/key` locations
//! - **Crawling**: recursive listing of a remote tree into a flat file list
//! - **Access policy**: public/private resolution over a bucket allow-list
//! - **Upload progress**: byte-weighted aggregation of per-file progress
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use storage_access::{
//!     credential_source_fn, directory_lister_fn, get_upload_progress, AccessConfig,
//!     Credential, CredentialBroker, DirectoryListing, PolicyResolver, Result,
//!     StorageUriPrefix, TreeCrawler, UploadEntry,
//! };
//!
//! async fn sts_exchange() -> anyhow::Result<Credential> {
//!     anyhow::bail!("identity provider not configured")
//! }
//!
//! async fn list_remote(path: String) -> anyhow::Result<DirectoryListing> {
//!     anyhow::bail!("no storage client for {}", path)
//! }
//!
//! # async fn example() -> Result<()> {
//! let config = AccessConfig::load("storage-access.toml")?;
//!
//! // One broker per identity, shared by every request
//! let broker = CredentialBroker::from_config(credential_source_fn(sts_exchange), &config.credentials);
//! let credential = broker.get_credential().await?;
//!
//! // Interpret a location typed by the user
//! let location: StorageUriPrefix = "s3://my-bucket/datasets/".parse()?;
//!
//! // Expand it into files
//! let crawler = TreeCrawler::from_config(directory_lister_fn(list_remote), &config.crawler);
//! let files = crawler.crawl(location.key_prefix()).await?;
//!
//! // Visibility of each file
//! let policy = PolicyResolver::new(["datasets/*"])?;
//! for path in &files.file_paths {
//!     println!("{} {:?}", path, policy.get_policy_attributes(path).policy);
//! }
//!
//! let progress = get_upload_progress(&[UploadEntry::new("datasets", "iris.csv", 4_551, 50.0)]);
//! println!("{}% with {}", progress.upload_percent, credential.access_key_id);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod error;

pub use crate::core::{crawl, credentials, iam, progress, uri};

// Re-export the types most callers need
pub use crate::config::{AccessConfig, CrawlerConfig, CredentialConfig};
pub use crate::core::{
    crawl::{
        directory_lister_fn, CrawlResult, DirectoryLister, DirectoryListing, FnDirectoryLister,
        TreeCrawler,
    },
    credentials::{
        credential_source_fn, Clock, Credential, CredentialBroker, CredentialSource,
        RenewalThreshold, SystemClock,
    },
    iam::{Policy, PolicyAttributes, PolicyResolver},
    progress::{get_upload_progress, UploadEntry, UploadProgress},
    uri::{StorageUriObject, StorageUriPrefix},
};
pub use crate::error::{AccessError, Result};
