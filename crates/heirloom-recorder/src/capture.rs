//! Microphone capture abstraction.
//!
//! The hosting platform owns the physical input device; this module defines
//! the contract the controller drives, plus a mock device for testing. The
//! contract's one hard rule: an opened capture must be released on every
//! exit path, so the microphone lock never outlives the recording session.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use heirloom_core::error::HeirloomError;

/// An open microphone capture.
///
/// Audio arrives as time-sliced chunks on an internal channel. Dropping the
/// handle releases the device; `release()` additionally drains and returns
/// everything buffered so far.
pub struct ActiveCapture {
    chunks: mpsc::UnboundedReceiver<Vec<f32>>,
    _lease: DeviceLease,
}

impl ActiveCapture {
    /// Wrap a chunk channel and a device lease counter. The counter must
    /// already account for this capture; it is decremented when the capture
    /// is released or dropped.
    pub fn new(chunks: mpsc::UnboundedReceiver<Vec<f32>>, leases: Arc<AtomicUsize>) -> Self {
        Self {
            chunks,
            _lease: DeviceLease { leases },
        }
    }

    /// Stop the capture, release the device, and return the buffered clip.
    pub fn release(mut self) -> Vec<f32> {
        let mut samples = Vec::new();
        while let Ok(chunk) = self.chunks.try_recv() {
            samples.extend_from_slice(&chunk);
        }
        samples
        // self drops here, freeing the lease.
    }
}

impl std::fmt::Debug for ActiveCapture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveCapture").finish()
    }
}

/// Decrements the device lease count when the capture goes away, on any
/// path: explicit release, error, or controller teardown.
struct DeviceLease {
    leases: Arc<AtomicUsize>,
}

impl Drop for DeviceLease {
    fn drop(&mut self) {
        self.leases.fetch_sub(1, Ordering::SeqCst);
    }
}

/// An audio input device that can be opened for exclusive capture.
pub trait AudioInput: Send + Sync {
    /// Request access to the device and begin buffering audio.
    ///
    /// Permission denial must surface as `HeirloomError::PermissionDenied`,
    /// distinct from generic capture failures.
    fn open(&self) -> impl Future<Output = Result<ActiveCapture, HeirloomError>> + Send;

    /// Sample rate of the chunks this device produces, in Hz.
    fn sample_rate(&self) -> u32;
}

// =============================================================================
// Mock implementation
// =============================================================================

/// How the mock device behaves on `open()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockInputMode {
    /// Open succeeds and delivers the scripted chunks.
    Ok,
    /// The user denied microphone access.
    PermissionDenied,
    /// No capture device is available.
    NoDevice,
}

/// Mock audio input for testing.
///
/// Delivers a scripted set of chunks immediately on open and tracks how many
/// captures are currently held, so tests can assert the device was released.
#[derive(Clone)]
pub struct MockAudioInput {
    mode: MockInputMode,
    chunks: Arc<Mutex<Vec<Vec<f32>>>>,
    leases: Arc<AtomicUsize>,
    opens: Arc<AtomicUsize>,
}

impl MockAudioInput {
    pub fn new(mode: MockInputMode) -> Self {
        Self {
            mode,
            chunks: Arc::new(Mutex::new(vec![vec![0.1f32; 1600]])),
            leases: Arc::new(AtomicUsize::new(0)),
            opens: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Mock that delivers the given chunks on each open.
    pub fn with_chunks(chunks: Vec<Vec<f32>>) -> Self {
        Self {
            mode: MockInputMode::Ok,
            chunks: Arc::new(Mutex::new(chunks)),
            leases: Arc::new(AtomicUsize::new(0)),
            opens: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of captures currently holding the device.
    pub fn active_captures(&self) -> usize {
        self.leases.load(Ordering::SeqCst)
    }

    /// Number of successful opens so far.
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

impl AudioInput for MockAudioInput {
    async fn open(&self) -> Result<ActiveCapture, HeirloomError> {
        match self.mode {
            MockInputMode::PermissionDenied => Err(HeirloomError::PermissionDenied),
            MockInputMode::NoDevice => Err(HeirloomError::Capture(
                "no audio input device available".to_string(),
            )),
            MockInputMode::Ok => {
                let (tx, rx) = mpsc::unbounded_channel();
                for chunk in self.chunks.lock().expect("chunks mutex poisoned").iter() {
                    // Receiver is alive, send cannot fail.
                    let _ = tx.send(chunk.clone());
                }
                self.leases.fetch_add(1, Ordering::SeqCst);
                self.opens.fetch_add(1, Ordering::SeqCst);
                Ok(ActiveCapture::new(rx, Arc::clone(&self.leases)))
            }
        }
    }

    fn sample_rate(&self) -> u32 {
        16000
    }
}

// =============================================================================
// Tests
// =============================================================================
