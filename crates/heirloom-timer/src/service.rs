//! Tick loop and checkpoint policy around the countdown.

use tokio::sync::watch;
use uuid::Uuid;

use crate::beacon::{BeaconSender, TimeBeacon};
use crate::timer::SectionTimer;

/// How often the heartbeat checkpoint fires while the timer runs.
pub const HEARTBEAT_SECS: u32 = 30;

/// Drives a [`SectionTimer`] at 1Hz and flushes the count through a
/// [`BeaconSender`] on a heartbeat and at risky moments.
pub struct TimerService<B: BeaconSender> {
    timer: SectionTimer,
    beacon: B,
    submission_id: Uuid,
    heartbeat_secs: u32,
}

impl<B: BeaconSender> TimerService<B> {
    pub fn new(timer: SectionTimer, beacon: B, submission_id: Uuid) -> Self {
        Self {
            timer,
            beacon,
            submission_id,
            heartbeat_secs: HEARTBEAT_SECS,
        }
    }

    pub fn with_heartbeat(mut self, heartbeat_secs: u32) -> Self {
        self.heartbeat_secs = heartbeat_secs.max(1);
        self
    }

    pub fn timer(&self) -> &SectionTimer {
        &self.timer
    }

    /// Flush the current count. Failures are logged and swallowed; the
    /// session never stalls on persistence.
    pub async fn checkpoint(&self) {
        let beacon = TimeBeacon {
            submission_id: self.submission_id,
            time_remaining_secs: self.timer.remaining(),
        };
        if let Err(e) = self.beacon.send(beacon).await {
            tracing::warn!(error = %e, "Time checkpoint not delivered");
        }
    }

    /// The tab went to the background. The next second is not guaranteed
    /// to run, so flush now.
    pub async fn on_hidden(&self) {
        self.checkpoint().await;
    }

    /// The session is being torn down.
    pub async fn on_teardown(&self) {
        self.checkpoint().await;
    }

    /// Run the countdown until it expires or `shutdown` flips to true.
    /// Sends a heartbeat checkpoint every `heartbeat_secs` ticks and a
    /// final one on the way out.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(1));
        // The first tick of a tokio interval completes immediately.
        interval.tick().await;

        let mut ticks: u32 = 0;
        // Once the shutdown sender is gone no signal can arrive; stop
        // polling that branch so the loop parks between ticks.
        let mut shutdown_open = true;
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let remaining = self.timer.tick();
                    ticks += 1;
                    if remaining == 0 {
                        tracing::info!("Section timer expired");
                        break;
                    }
                    if ticks % self.heartbeat_secs == 0 {
                        self.checkpoint().await;
                    }
                }
                result = shutdown.changed(), if shutdown_open => {
                    match result {
                        Ok(()) => {
                            if *shutdown.borrow() {
                                break;
                            }
                        }
                        Err(_) => shutdown_open = false,
                    }
                }
            }
        }
        self.on_teardown().await;
    }
}

// =============================================================================
// Tests
// =============================================================================
