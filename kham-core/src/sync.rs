//! Serialized progress persistence on top of a [`SyncGateway`].
//!
//! At most one save is in flight per player. Snapshots arriving meanwhile
//! replace each other in a single pending slot, and the in-flight writer
//! flushes the latest one when it finishes:
//!
//! ```text
//! save(s1) ──► write s1 ────────────► write s3 ──► done
//! save(s2) ──► pending = s2 (Coalesced)   ▲
//! save(s3) ──► pending = s3 (Coalesced) ──┘
//! ```
//!
//! Failed writes are logged and dropped; the next save carries the full
//! state again.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::gateway::{GatewayError, SyncGateway};
use crate::progress::ProgressState;

/// What happened to a snapshot handed to [`ProgressSync::save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The last write performed by this call succeeded.
    Saved,
    /// The last write performed by this call failed and was dropped.
    Failed(GatewayError),
    /// Another save was in flight; it will write this snapshot or a newer one.
    Coalesced,
}

/// Counters for observability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Successful writes.
    pub saved: u64,
    /// Failed writes.
    pub failed: u64,
    /// Snapshots handed off to an in-flight writer.
    pub coalesced: u64,
}

/// Per-player progress writer and loader.
#[derive(Clone)]
pub struct ProgressSync {
    inner: Arc<SyncInner>,
}

struct SyncInner {
    gateway: Arc<dyn SyncGateway>,
    user_id: String,
    pending: Mutex<Option<ProgressState>>,
    in_flight: AtomicBool,
    saved: AtomicU64,
    failed: AtomicU64,
    coalesced: AtomicU64,
}

/// Writer slot held by the saving call; cleared on drop so a cancelled save
/// does not block later ones.
struct InFlight<'a> {
    flag: &'a AtomicBool,
    held: bool,
}

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        let mut guard = Self { flag, held: false };
        guard.reacquire().then_some(guard)
    }

    fn reacquire(&mut self) -> bool {
        self.held = !self.flag.swap(true, Ordering::AcqRel);
        self.held
    }

    fn release(&mut self) {
        if std::mem::take(&mut self.held) {
            self.flag.store(false, Ordering::Release);
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for ProgressSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressSync")
            .field("user_id", &self.inner.user_id)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl ProgressSync {
    /// Create a writer for one player.
    pub fn new(gateway: Arc<dyn SyncGateway>, user_id: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(SyncInner {
                gateway,
                user_id: user_id.into(),
                pending: Mutex::new(None),
                in_flight: AtomicBool::new(false),
                saved: AtomicU64::new(0),
                failed: AtomicU64::new(0),
                coalesced: AtomicU64::new(0),
            }),
        }
    }

    /// Player this writer belongs to.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.inner.user_id
    }

    /// Underlying gateway.
    #[must_use]
    pub fn gateway(&self) -> &Arc<dyn SyncGateway> {
        &self.inner.gateway
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> SyncStats {
        SyncStats {
            saved: self.inner.saved.load(Ordering::Relaxed),
            failed: self.inner.failed.load(Ordering::Relaxed),
            coalesced: self.inner.coalesced.load(Ordering::Relaxed),
        }
    }

    fn park(&self, state: Option<ProgressState>) -> Option<ProgressState> {
        let mut slot = self
            .inner
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match state {
            Some(state) => slot.replace(state),
            None => slot.take(),
        }
    }

    fn has_pending(&self) -> bool {
        self.inner
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Persist a snapshot, serialized behind any save already in flight.
    pub async fn save(&self, state: ProgressState) -> SaveOutcome {
        self.park(Some(state));

        let Some(mut guard) = InFlight::acquire(&self.inner.in_flight) else {
            self.inner.coalesced.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(user_id = %self.inner.user_id, "Save coalesced into in-flight write");
            return SaveOutcome::Coalesced;
        };

        let mut outcome = SaveOutcome::Saved;
        loop {
            if let Some(snapshot) = self.park(None) {
                outcome = self.write(&snapshot).await;
                continue;
            }

            guard.release();
            // A snapshot parked after the take above but before the release
            // would otherwise wait for the next save.
            if self.has_pending() && guard.reacquire() {
                continue;
            }
            return outcome;
        }
    }

    async fn write(&self, snapshot: &ProgressState) -> SaveOutcome {
        match self
            .inner
            .gateway
            .save_progress(&self.inner.user_id, snapshot)
            .await
        {
            Ok(()) => {
                self.inner.saved.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(
                    user_id = %self.inner.user_id,
                    unlocked = %snapshot.unlocked_level(),
                    "Progress saved"
                );
                SaveOutcome::Saved
            }
            Err(err) => {
                self.inner.failed.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(user_id = %self.inner.user_id, error = %err, "Progress save dropped");
                SaveOutcome::Failed(err)
            }
        }
    }

    /// Load progress, falling back to a fresh state when none is stored or
    /// storage is unreachable.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Auth`] and other non-recoverable errors so the
    /// caller can force re-authentication.
    pub async fn load(&self) -> Result<ProgressState, GatewayError> {
        match self.inner.gateway.load_progress(&self.inner.user_id).await {
            Ok(state) => Ok(state),
            Err(GatewayError::NotFound(_)) => {
                tracing::info!(user_id = %self.inner.user_id, "No stored progress, starting fresh");
                Ok(ProgressState::default())
            }
            Err(err) if err.is_recoverable() => {
                tracing::warn!(
                    user_id = %self.inner.user_id,
                    error = %err,
                    "Progress load failed, starting fresh"
                );
                Ok(ProgressState::default())
            }
            Err(err) => Err(err),
        }
    }
}
