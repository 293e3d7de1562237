//! Short-lived storage credentials
//!
//! The broker owns a single cache slot and coalesces concurrent renewals into
//! one call to the injected [`CredentialSource`].

mod broker;
mod clock;
mod credential;
mod source;

pub use broker::CredentialBroker;
pub use clock::{Clock, ManualClock, SystemClock};
pub use credential::{Credential, CredentialCacheEntry, RenewalThreshold};
pub use source::{credential_source_fn, CredentialSource, FnCredentialSource};
