//! Object-storage access components
//!
//! Each submodule is independent of the others; they only share the error type
//! and the configuration sections.

pub mod crawl;
pub mod credentials;
pub mod iam;
pub mod progress;
pub mod uri;
