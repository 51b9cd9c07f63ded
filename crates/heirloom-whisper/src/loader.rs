//! Single-flight model loading with observable progress.
//!
//! The Whisper model is multi-megabyte, so the instance and its in-flight
//! load are shared process-wide: any number of voice-answer fields may
//! request the model, but only one physical fetch ever runs. Followers of an
//! in-flight load await the same operation; a failed load clears the way for
//! a retry on the next call.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::sync::watch;

use heirloom_core::error::HeirloomError;

/// Lifecycle phase of the shared model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    /// No load attempted yet.
    Idle,
    /// A fetch is in flight.
    Loading,
    /// The model is cached and usable.
    Ready,
    /// The last fetch failed; a new `load()` call retries.
    Error,
}

/// Observable load state: phase, 0-100 progress, and a user-facing message
/// for the error phase.
#[derive(Debug, Clone)]
pub struct LoadStatus {
    pub phase: LoadPhase,
    pub progress: u8,
    pub error: Option<String>,
}

impl LoadStatus {
    fn idle() -> Self {
        Self {
            phase: LoadPhase::Idle,
            progress: 0,
            error: None,
        }
    }
}

/// Handle given to the fetch function for reporting download/init progress.
///
/// Progress is clamped to 0-100 and only ever moves forward within a load;
/// `done()` forces it to 100.
#[derive(Clone)]
pub struct ProgressHandle {
    tx: watch::Sender<LoadStatus>,
}

impl ProgressHandle {
    /// Report a progress percentage. Values above 100 are clamped; values
    /// below the current progress are ignored.
    pub fn report(&self, pct: u8) {
        let pct = pct.min(100);
        self.tx.send_modify(|status| {
            if pct > status.progress {
                status.progress = pct;
            }
        });
    }

    /// Signal that the fetch finished; forces progress to 100.
    pub fn done(&self) {
        self.tx.send_modify(|status| status.progress = 100);
    }
}

/// Future returned by a model fetch function.
pub type FetchFuture<M> = Pin<Box<dyn Future<Output = Result<M, HeirloomError>> + Send>>;

/// A function that fetches and initializes the model, reporting progress
/// through the given handle.
pub type ModelFetchFn<M> = Box<dyn Fn(ProgressHandle) -> FetchFuture<M> + Send + Sync>;

/// Process-wide, single-flight model loader.
///
/// Share one `Arc<ModelLoader>` across every recording session. The runtime
/// is multi-threaded, so single-flight is enforced with an async gate rather
/// than an event-loop promise: the first caller through the gate runs the
/// fetch, concurrent callers park on the gate and then observe the cache.
pub struct ModelLoader<M> {
    fetch: ModelFetchFn<M>,
    cache: Mutex<Option<Arc<M>>>,
    gate: tokio::sync::Mutex<()>,
    status_tx: watch::Sender<LoadStatus>,
}

impl<M: Send + Sync + 'static> std::fmt::Debug for ModelLoader<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelLoader")
            .field("loaded", &self.cached().is_some())
            .finish()
    }
}

impl<M: Send + Sync + 'static> ModelLoader<M> {
    /// Create a loader around the given fetch function. Nothing is fetched
    /// until the first `load()` call.
    pub fn new(fetch: ModelFetchFn<M>) -> Self {
        let (status_tx, _) = watch::channel(LoadStatus::idle());
        Self {
            fetch,
            cache: Mutex::new(None),
            gate: tokio::sync::Mutex::new(()),
            status_tx,
        }
    }

    /// Subscribe to load status/progress updates.
    pub fn status(&self) -> watch::Receiver<LoadStatus> {
        self.status_tx.subscribe()
    }

    /// The cached model instance, if a load has completed.
    pub fn cached(&self) -> Option<Arc<M>> {
        self.cache.lock().expect("model cache mutex poisoned").clone()
    }

    /// Load the model, deduplicating concurrent calls.
    ///
    /// - Already cached: returns immediately.
    /// - Load in flight: awaits that load and returns its result.
    /// - Otherwise: runs the fetch with progress reset to 0, caches on
    ///   success, records an error message on failure. Failure is
    ///   recoverable - the next call starts a fresh fetch.
    pub async fn load(&self) -> Result<Arc<M>, HeirloomError> {
        if let Some(model) = self.cached() {
            return Ok(model);
        }

        let _leader = self.gate.lock().await;

        // A concurrent leader may have finished while we waited on the gate.
        if let Some(model) = self.cached() {
            return Ok(model);
        }

        self.status_tx.send_replace(LoadStatus {
            phase: LoadPhase::Loading,
            progress: 0,
            error: None,
        });
        tracing::info!("Loading speech model");

        let progress = ProgressHandle {
            tx: self.status_tx.clone(),
        };

        match (self.fetch)(progress).await {
            Ok(model) => {
                let model = Arc::new(model);
                *self.cache.lock().expect("model cache mutex poisoned") = Some(model.clone());
                self.status_tx.send_replace(LoadStatus {
                    phase: LoadPhase::Ready,
                    progress: 100,
                    error: None,
                });
                tracing::info!("Speech model ready");
                Ok(model)
            }
            Err(e) => {
                let message = format!("Could not load the speech model: {}", e);
                tracing::warn!(error = %e, "Speech model load failed");
                self.status_tx.send_modify(|status| {
                    status.phase = LoadPhase::Error;
                    status.error = Some(message);
                });
                Err(e)
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
