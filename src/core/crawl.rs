//! Recursive enumeration of an object-storage tree
//!
//! The only primitive is "list the immediate children of one directory". The
//! crawler drives it over a work queue, keeping up to a fixed number of
//! listings in flight, and returns every file path relative to the root.

use crate::config::CrawlerConfig;
use crate::error::{AccessError, Result};
use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default cap on concurrent directory listings
pub const DEFAULT_MAX_CONCURRENT_LISTINGS: usize = 32;

/// Immediate children of one directory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryListing {
    pub file_basenames: Vec<String>,
    pub directory_basenames: Vec<String>,
}

impl DirectoryListing {
    pub fn new<F, D>(files: F, directories: D) -> Self
    where
        F: IntoIterator,
        F::Item: Into<String>,
        D: IntoIterator,
        D::Item: Into<String>,
    {
        DirectoryListing {
            file_basenames: files.into_iter().map(Into::into).collect(),
            directory_basenames: directories.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.file_basenames.is_empty() && self.directory_basenames.is_empty()
    }
}

/// Lists one directory of the storage tree
///
/// Implementations must tolerate concurrent calls.
#[async_trait]
pub trait DirectoryLister: Send + Sync {
    async fn list(&self, directory_path: &str) -> anyhow::Result<DirectoryListing>;
}

#[async_trait]
impl<T: DirectoryLister + ?Sized> DirectoryLister for Arc<T> {
    async fn list(&self, directory_path: &str) -> anyhow::Result<DirectoryListing> {
        (**self).list(directory_path).await
    }
}

/// A directory lister that wraps an async closure
pub struct FnDirectoryLister<F> {
    list: F,
}

impl<F, Fut> FnDirectoryLister<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<DirectoryListing>> + Send,
{
    pub fn new(list: F) -> Self {
        FnDirectoryLister { list }
    }
}

#[async_trait]
impl<F, Fut> DirectoryLister for FnDirectoryLister<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<DirectoryListing>> + Send,
{
    async fn list(&self, directory_path: &str) -> anyhow::Result<DirectoryListing> {
        (self.list)(directory_path.to_string()).await
    }
}

/// Create a directory lister from an async closure
pub fn directory_lister_fn<F, Fut>(f: F) -> FnDirectoryLister<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<DirectoryListing>> + Send,
{
    FnDirectoryLister::new(f)
}

/// Files found under a root directory
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlResult {
    /// Paths relative to the crawl root, in no particular order
    pub file_paths: Vec<String>,
    /// Number of listing calls made
    pub directories_listed: usize,
}

/// Join a directory path and a child name with exactly one `/`
fn join_path(directory: &str, name: &str) -> String {
    if name.is_empty() {
        directory.to_string()
    } else if directory.is_empty() || directory.ends_with('/') {
        format!("{}{}", directory, name)
    } else {
        format!("{}/{}", directory, name)
    }
}

/// Expands a storage tree into a flat list of files
pub struct TreeCrawler<L> {
    lister: L,
    max_concurrent_listings: usize,
}

impl<L: DirectoryLister> TreeCrawler<L> {
    pub fn new(lister: L) -> Self {
        TreeCrawler {
            lister,
            max_concurrent_listings: DEFAULT_MAX_CONCURRENT_LISTINGS,
        }
    }

    /// Create a crawler from the `[crawler]` configuration section
    pub fn from_config(lister: L, config: &CrawlerConfig) -> Self {
        Self::new(lister).with_max_concurrent_listings(config.max_concurrent_listings)
    }

    /// Cap the number of listings in flight (at least one)
    pub fn with_max_concurrent_listings(mut self, max: usize) -> Self {
        self.max_concurrent_listings = max.max(1);
        self
    }

    pub fn max_concurrent_listings(&self) -> usize {
        self.max_concurrent_listings
    }

    pub fn lister(&self) -> &L {
        &self.lister
    }

    /// Discover every file below `root_path`
    ///
    /// # Errors
    ///
    /// `DirectoryListingFailed` naming the first directory whose listing
    /// failed. Listings still in flight are dropped and nothing partial is
    /// returned.
    pub async fn crawl(&self, root_path: &str) -> Result<CrawlResult> {
        let mut result = CrawlResult::default();
        // Directories still to list, relative to the root
        let mut pending: VecDeque<String> = VecDeque::from([String::new()]);
        let mut in_flight = FuturesUnordered::new();

        loop {
            while in_flight.len() < self.max_concurrent_listings {
                let Some(relative) = pending.pop_front() else {
                    break;
                };
                in_flight.push(self.list_relative(root_path, relative));
            }

            let Some(outcome) = in_flight.next().await else {
                break;
            };
            let (relative, listing) = outcome?;
            result.directories_listed += 1;

            for basename in listing.file_basenames {
                result.file_paths.push(join_path(&relative, &basename));
            }

            for basename in listing.directory_basenames {
                let name = basename.trim_matches('/');
                if name.is_empty() {
                    warn!(
                        "Skipping unnamed subdirectory under {}",
                        join_path(root_path, &relative)
                    );
                    continue;
                }
                pending.push_back(join_path(&relative, name));
            }
        }

        info!(
            "Crawled {}: {} files in {} directories",
            root_path,
            result.file_paths.len(),
            result.directories_listed
        );

        Ok(result)
    }

    async fn list_relative(
        &self,
        root_path: &str,
        relative: String,
    ) -> Result<(String, DirectoryListing)> {
        let path = join_path(root_path, &relative);
        debug!("Listing directory {}", path);

        match self.lister.list(&path).await {
            Ok(listing) => Ok((relative, listing)),
            Err(e) => {
                warn!("Listing {} failed: {:#}", path, e);
                Err(AccessError::DirectoryListingFailed {
                    path,
                    cause: Arc::new(e),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};

    struct MapLister(HashMap<String, DirectoryListing>);

    #[async_trait]
    impl DirectoryLister for MapLister {
        async fn list(&self, directory_path: &str) -> anyhow::Result<DirectoryListing> {
            self.0
                .get(directory_path)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("no such directory"))
        }
    }

    fn as_set(result: &CrawlResult) -> HashSet<&str> {
        result.file_paths.iter().map(String::as_str).collect()
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("/", "a"), "/a");
        assert_eq!(join_path("/a", "x.txt"), "/a/x.txt");
        assert_eq!(join_path("bucket/dir/", "x"), "bucket/dir/x");
        assert_eq!(join_path("", "x"), "x");
        assert_eq!(join_path("/a", ""), "/a");
    }

    #[tokio::test]
    async fn test_crawl_small_tree() {
        let lister = MapLister(HashMap::from([
            ("/".to_string(), DirectoryListing::new(["r.txt"], ["a"])),
            (
                "/a".to_string(),
                DirectoryListing::new(["x.txt", "y.txt"], Vec::<String>::new()),
            ),
        ]));

        let result = TreeCrawler::new(lister).crawl("/").await.unwrap();
        assert_eq!(as_set(&result), HashSet::from(["r.txt", "a/x.txt", "a/y.txt"]));
        assert_eq!(result.directories_listed, 2);
    }

    #[tokio::test]
    async fn test_empty_directory_contributes_nothing() {
        let lister = MapLister(HashMap::from([
            ("data".to_string(), DirectoryListing::new(["f"], ["empty"])),
            ("data/empty".to_string(), DirectoryListing::default()),
        ]));

        let result = TreeCrawler::new(lister).crawl("data").await.unwrap();
        assert_eq!(result.file_paths, vec!["f".to_string()]);
    }

    #[tokio::test]
    async fn test_failure_names_path() {
        let lister = MapLister(HashMap::from([(
            "/".to_string(),
            DirectoryListing::new(["ok.txt"], ["missing"]),
        )]));

        let err = TreeCrawler::new(lister).crawl("/").await.unwrap_err();
        match err {
            AccessError::DirectoryListingFailed { path, .. } => assert_eq!(path, "/missing"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_trailing_slash_directory_names() {
        let lister = MapLister(HashMap::from([
            ("root/".to_string(), DirectoryListing::new(Vec::<String>::new(), ["sub/", ""])),
            ("root/sub".to_string(), DirectoryListing::new(["leaf"], Vec::<String>::new())),
        ]));

        let result = TreeCrawler::new(lister).crawl("root/").await.unwrap();
        assert_eq!(result.file_paths, vec!["sub/leaf".to_string()]);
    }

    #[test]
    fn test_concurrency_floor() {
        let crawler = TreeCrawler::new(MapLister(HashMap::new())).with_max_concurrent_listings(0);
        assert_eq!(crawler.max_concurrent_listings(), 1);
    }
}
