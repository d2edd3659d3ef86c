//! The mutex facade.
//!
//! [`MutexService`] asks its [`CapabilityProbe`] for the usable backends, picks
//! the best one for every call (native lock, then persistent storage, then
//! session storage) and starts the matching driver on the current tokio
//! runtime.
//!
//! ```no_run
//! use kvmutex::{AcquireOptions, MutexConfig, MutexService};
//! use std::time::Duration;
//!
//! # async fn demo() -> kvmutex::Result<()> {
//! let service = MutexService::from_config(&MutexConfig::default());
//! let handle = service
//!     .acquire("nightly-report", AcquireOptions::new().timeout(Duration::from_secs(5)))?
//!     .await?;
//! // ... exclusive work ...
//! handle.release();
//! # Ok(())
//! # }
//! ```

mod backend;
mod probe;


pub use backend::{Backend, BackendKind, CapabilityProbe};
pub use probe::ConfiguredProbe;

use crate::config::MutexConfig;
use crate::engine::{RequestCore, RequestParams, native, storage};
use crate::error::{MutexError, Result};
use crate::handle::{AcquireOptions, MutexHandle, PendingAcquire};
use crate::lease::{Clock, SystemClock, Timing, owner_string};
use std::fmt;
use std::sync::Arc;

/// Entry point for acquiring named mutexes.
pub struct MutexService {
    probe: Arc<dyn CapabilityProbe>,
    timing: Timing,
    clock: Arc<dyn Clock>,
    owner: Option<String>,
}

impl MutexService {
    /// A service over `probe` with default timing and the system clock.
    pub fn new(probe: impl CapabilityProbe + 'static) -> Self {
        Self {
            probe: Arc::new(probe),
            timing: Timing::default(),
            clock: Arc::new(SystemClock::new()),
            owner: None,
        }
    }

    /// A service whose backends, timing and record owner come from `config`.
    pub fn from_config(config: &MutexConfig) -> Self {
        let mut service =
            Self::new(ConfiguredProbe::from_config(config)).with_timing(config.timing());
        if config.record_owner {
            service.owner = Some(owner_string());
        }
        service
    }

    /// Replace the protocol periods. [`acquire`](Self::acquire) rejects an
    /// invalid set with [`MutexError::Config`].
    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Informational owner written into lease records.
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    /// Whether any backend is usable.
    pub fn supported(&self) -> bool {
        self.supported_by().is_some()
    }

    /// The backend `acquire` would use right now.
    pub fn supported_by(&self) -> Option<BackendKind> {
        self.select_backend().ok().map(|backend| backend.kind())
    }

    /// The usable backends, best first.
    pub fn backends(&self) -> Vec<Backend> {
        self.probe.ranked_available_backends()
    }

    fn select_backend(&self) -> Result<Backend> {
        self.probe
            .ranked_available_backends()
            .into_iter()
            .min_by_key(Backend::kind)
            .ok_or_else(|| {
                MutexError::CapabilityUnavailable(
                    "no native lock, persistent storage or session storage is available"
                        .to_string(),
                )
            })
    }

    /// Start acquiring the mutex `name`.
    ///
    /// Fails at once when no backend is usable, when the timing is invalid or
    /// when called outside a tokio runtime. Otherwise the returned future settles with the handle once the
    /// lock is held, or with a [`Rejection`](crate::Rejection) on timeout or
    /// early release.
    ///
    /// Dropping the returned future before it resolves abandons the request,
    /// exactly as [`MutexHandle::release`] would.
    pub fn acquire(&self, name: &str, options: AcquireOptions) -> Result<PendingAcquire> {
        let backend = self.select_backend()?;
        self.timing.validate()?;
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| MutexError::NoRuntime)?;

        let (core, settled) = RequestCore::new(
            RequestParams {
                name: name.to_string(),
                backend: backend.kind(),
                medium: backend.medium(name),
                timing: self.timing,
                clock: Arc::clone(&self.clock),
                owner: self.owner.clone(),
            },
            options,
        );

        tracing::debug!(
            name = %name,
            holder = %core.holder_id(),
            backend = %backend.kind(),
            timeout = ?core.timeout(),
            "acquiring mutex"
        );

        core.begin();
        let driver = match backend {
            Backend::NativeLock(lock) => runtime.spawn(native::drive_acquire(Arc::clone(&core), lock)),
            Backend::PersistentStorage(_) | Backend::SessionStorage(_) => {
                runtime.spawn(storage::drive_acquire(Arc::clone(&core)))
            }
        };
        core.track_driver(driver.abort_handle());

        Ok(PendingAcquire::new(MutexHandle::new(core), settled))
    }
}

impl fmt::Debug for MutexService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutexService")
            .field("timing", &self.timing)
            .field("clock", &self.clock)
            .field("owner", &self.owner)
            .finish_non_exhaustive()
    }
}
