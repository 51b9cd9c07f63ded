//! Heirloom Timer crate - the shared section countdown.
//!
//! One budget for the whole questionnaire, ticked at 1Hz, clamped at zero,
//! and flushed to the server opportunistically so a dropped session loses
//! at most one heartbeat of progress.

pub mod beacon;
pub mod service;
pub mod timer;

pub use beacon::{BeaconSender, HttpBeacon, MockBeaconSender, TimeBeacon};
pub use service::{TimerService, HEARTBEAT_SECS};
pub use timer::{format_hms, SectionTimer};
