//! The section countdown.
//!
//! A shared budget across all sections, ticked down once per second while
//! the questionnaire is visible. The count clamps at zero and stays there;
//! expiry is advisory, it never blocks the user from finishing.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Shared countdown state. Cheap to clone; the tick loop and the UI read
/// the same counter.
#[derive(Clone, Debug)]
pub struct SectionTimer {
    remaining: Arc<AtomicU32>,
}

impl SectionTimer {
    pub fn new(remaining_secs: u32) -> Self {
        Self {
            remaining: Arc::new(AtomicU32::new(remaining_secs)),
        }
    }

    /// Seconds left.
    pub fn remaining(&self) -> u32 {
        self.remaining.load(Ordering::SeqCst)
    }

    pub fn is_expired(&self) -> bool {
        self.remaining() == 0
    }

    /// One second elapses. Returns the new remaining count. Ticking an
    /// expired timer is a no-op; the count never wraps below zero.
    pub fn tick(&self) -> u32 {
        self.remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |r| r.checked_sub(1))
            .map(|before| before - 1)
            .unwrap_or(0)
    }

    /// Overwrite the count, for resuming a stored submission.
    pub fn set(&self, remaining_secs: u32) {
        self.remaining.store(remaining_secs, Ordering::SeqCst);
    }

    /// Zero-padded `HH:MM:SS` rendering for the timer pill.
    pub fn display(&self) -> String {
        format_hms(self.remaining())
    }
}

/// Format a second count as zero-padded `HH:MM:SS`.
pub fn format_hms(total_secs: u32) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_counts_down() {
        let timer = SectionTimer::new(3);
        assert_eq!(timer.tick(), 2);
        assert_eq!(timer.tick(), 1);
        assert_eq!(timer.tick(), 0);
        assert!(timer.is_expired());
    }

    #[test]
    fn test_tick_clamps_at_zero() {
        let timer = SectionTimer::new(1);
        timer.tick();
        assert_eq!(timer.tick(), 0);
        assert_eq!(timer.tick(), 0);
        assert_eq!(timer.remaining(), 0);
    }

    #[test]
    fn test_clones_share_state() {
        let timer = SectionTimer::new(10);
        let view = timer.clone();
        timer.tick();
        assert_eq!(view.remaining(), 9);
    }

    #[test]
    fn test_set_resumes_stored_value() {
        let timer = SectionTimer::new(0);
        timer.set(4503);
        assert_eq!(timer.remaining(), 4503);
        assert!(!timer.is_expired());
    }

    #[test]
    fn test_format_under_an_hour() {
        assert_eq!(format_hms(0), "00:00:00");
        assert_eq!(format_hms(59), "00:00:59");
        assert_eq!(format_hms(61), "00:01:01");
        assert_eq!(format_hms(3599), "00:59:59");
    }

    #[test]
    fn test_format_with_hours() {
        assert_eq!(format_hms(3600), "01:00:00");
        assert_eq!(format_hms(7200), "02:00:00");
        assert_eq!(format_hms(3661), "01:01:01");
    }
}
