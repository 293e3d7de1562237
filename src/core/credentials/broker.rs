//! Credential cache with single-flight renewal
//!
//! ```text
//! ┌──────────────────────── CredentialBroker ────────────────────────┐
//! │  Mutex<BrokerState>                                              │
//! │    cached:    Option<CredentialCacheEntry>                       │
//! │    in_flight: Option<Shared<acquisition task>>                   │
//! └──────────────────────────────────────────────────────────────────┘
//!   caller ──► fresh entry?      ──► clone and return
//!          ──► in-flight task?   ──► await the shared result
//!          ──► otherwise         ──► spawn task, register, await
//! ```
//!
//! The lock is never held across an await. The acquisition runs on its own
//! task so it completes and fills the cache even if every caller goes away.

use super::{Clock, Credential, CredentialCacheEntry, CredentialSource, RenewalThreshold, SystemClock};
use crate::config::CredentialConfig;
use crate::error::{AccessError, Result};
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Outcome of one acquisition, delivered to every waiter.
type AcquireResult = Result<Credential>;

/// Shared handle on the acquisition currently in flight.
type SharedAcquisition = Shared<BoxFuture<'static, AcquireResult>>;

#[derive(Default)]
struct BrokerState {
    cached: Option<CredentialCacheEntry>,
    in_flight: Option<SharedAcquisition>,
}

/// Serves a valid credential, renewing it at most once at a time
///
/// Cheap to clone; clones share the same cache slot.
///
/// # Examples
///
/// ```no_run
/// use storage_access::{credential_source_fn, Credential, CredentialBroker, RenewalThreshold};
///
/// async fn exchange_identity_token() -> anyhow::Result<Credential> {
///     // call the identity provider's STS endpoint here
///     anyhow::bail!("not wired up")
/// }
///
/// # async fn example() -> storage_access::Result<()> {
/// let broker = CredentialBroker::new(
///     credential_source_fn(exchange_identity_token),
///     RenewalThreshold::Percent90,
/// );
///
/// let credential = broker.get_credential().await?;
/// println!("using {}", credential.access_key_id);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct CredentialBroker {
    source: Arc<dyn CredentialSource>,
    clock: Arc<dyn Clock>,
    threshold: RenewalThreshold,
    state: Arc<Mutex<BrokerState>>,
    acquisitions: Arc<AtomicU64>,
}

impl CredentialBroker {
    /// Create a broker reading the system clock
    pub fn new<S>(source: S, threshold: RenewalThreshold) -> Self
    where
        S: CredentialSource + 'static,
    {
        Self::with_clock(Arc::new(source), threshold, Arc::new(SystemClock))
    }

    /// Create a broker with an explicit clock
    pub fn with_clock(
        source: Arc<dyn CredentialSource>,
        threshold: RenewalThreshold,
        clock: Arc<dyn Clock>,
    ) -> Self {
        debug!("Creating credential broker (renewal threshold {})", threshold);
        CredentialBroker {
            source,
            clock,
            threshold,
            state: Arc::new(Mutex::new(BrokerState::default())),
            acquisitions: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Create a broker from the `[credentials]` configuration section
    pub fn from_config<S>(source: S, config: &CredentialConfig) -> Self
    where
        S: CredentialSource + 'static,
    {
        Self::new(source, config.renewal_threshold)
    }

    pub fn threshold(&self) -> RenewalThreshold {
        self.threshold
    }

    /// Number of acquisitions started since creation
    pub fn acquisition_count(&self) -> u64 {
        self.acquisitions.load(Ordering::SeqCst)
    }

    /// Snapshot of the cache slot
    pub fn cached(&self) -> Option<CredentialCacheEntry> {
        self.state.lock().cached.clone()
    }

    /// Drop the cached credential so the next call acquires a new one
    pub fn invalidate(&self) {
        if self.state.lock().cached.take().is_some() {
            debug!("Cached credential invalidated");
        }
    }

    /// Return a credential that is still within its renewal threshold
    ///
    /// Joins the acquisition already in flight if there is one, otherwise
    /// starts one. Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// `CredentialAcquisitionFailed` when the source fails. Every caller
    /// waiting on that acquisition receives the same error, the cache slot is
    /// left as it was, and the next call starts over.
    pub async fn get_credential(&self) -> Result<Credential> {
        let acquisition = {
            let mut state = self.state.lock();
            let now = self.clock.now_ms();

            if let Some(entry) = &state.cached {
                if entry.is_fresh(now, self.threshold) {
                    debug!(
                        "Serving cached credential ({}ms remaining)",
                        entry.credential().remaining_ms(now)
                    );
                    return Ok(entry.credential().clone());
                }
                debug!("Cached credential past renewal threshold, renewing");
            }

            self.join_or_start(&mut state)
        };

        acquisition.await
    }

    /// Acquire a new credential regardless of the cache
    ///
    /// Still joins an acquisition that is already in flight.
    pub async fn force_refresh(&self) -> Result<Credential> {
        let acquisition = {
            let mut state = self.state.lock();
            self.join_or_start(&mut state)
        };

        acquisition.await
    }

    fn join_or_start(&self, state: &mut BrokerState) -> SharedAcquisition {
        if let Some(in_flight) = &state.in_flight {
            debug!("Joining in-flight credential acquisition");
            return in_flight.clone();
        }

        let acquisition = self.spawn_acquisition();
        state.in_flight = Some(acquisition.clone());
        acquisition
    }

    fn spawn_acquisition(&self) -> SharedAcquisition {
        let source = Arc::clone(&self.source);
        let slot = Arc::clone(&self.state);
        let count = self.acquisitions.fetch_add(1, Ordering::SeqCst) + 1;

        debug!("Starting credential acquisition #{}", count);

        let task = tokio::spawn(async move {
            let result = source.acquire().await;

            // Granted only once the spawner has registered this acquisition
            let mut state = slot.lock();
            state.in_flight = None;

            match result {
                Ok(credential) => {
                    info!(
                        "Acquired credential {} (ttl {}ms)",
                        credential.access_key_id,
                        credential.ttl_ms()
                    );
                    state.cached = Some(CredentialCacheEntry::new(credential.clone()));
                    Ok(credential)
                }
                Err(e) => {
                    warn!("Credential acquisition failed: {:#}", e);
                    Err(AccessError::CredentialAcquisitionFailed(Arc::new(e)))
                }
            }
        });

        let slot = Arc::clone(&self.state);
        async move {
            match task.await {
                Ok(result) => result,
                Err(join_error) => {
                    // The task died before clearing its registration
                    slot.lock().in_flight = None;
                    warn!("Credential acquisition task aborted: {}", join_error);
                    Err(AccessError::CredentialAcquisitionFailed(Arc::new(
                        anyhow::anyhow!("credential acquisition task aborted: {}", join_error),
                    )))
                }
            }
        }
        .boxed()
        .shared()
    }
}
