//! Opportunistic persistence of the remaining time.
//!
//! The count is flushed at moments the session might end without a clean
//! shutdown (tab hidden, page unload) plus a periodic heartbeat. Every send
//! is fire-and-forget: a lost beacon costs at most one heartbeat interval
//! of timer drift, so failures are logged and swallowed.

use std::future::Future;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use heirloom_core::error::{HeirloomError, Result};

/// Wire payload for one time checkpoint. Serializes as
/// `{ "submissionId": ..., "timeRemaining": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeBeacon {
    pub submission_id: Uuid,
    #[serde(rename = "timeRemaining")]
    pub time_remaining_secs: u32,
}

/// Transport for time checkpoints.
pub trait BeaconSender {
    fn send(&self, beacon: TimeBeacon) -> impl Future<Output = Result<()>> + Send;
}

/// Posts checkpoints to the API's beacon endpoint.
pub struct HttpBeacon {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpBeacon {
    /// `base_url` without a trailing slash, e.g. `http://127.0.0.1:4040`.
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}/api/timer/beacon", base_url.trim_end_matches('/')),
        }
    }
}

impl BeaconSender for HttpBeacon {
    async fn send(&self, beacon: TimeBeacon) -> Result<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&beacon)
            .send()
            .await
            .map_err(|e| HeirloomError::Timer(format!("beacon request failed: {}", e)))?;
        if !response.status().is_success() {
            return Err(HeirloomError::Timer(format!(
                "beacon rejected with status {}",
                response.status()
            )));
        }
        Ok(())
    }
}

/// Records every beacon instead of sending it. Can be told to fail.
#[derive(Default)]
pub struct MockBeaconSender {
    sent: Mutex<Vec<TimeBeacon>>,
    fail: bool,
}

impl MockBeaconSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<TimeBeacon> {
        self.sent.lock().expect("beacon mutex poisoned").clone()
    }
}

impl BeaconSender for MockBeaconSender {
    async fn send(&self, beacon: TimeBeacon) -> Result<()> {
        if self.fail {
            return Err(HeirloomError::Timer("mock beacon failure".to_string()));
        }
        self.sent.lock().expect("beacon mutex poisoned").push(beacon);
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_records_beacons() {
        let sender = MockBeaconSender::new();
        let beacon = TimeBeacon {
            submission_id: Uuid::new_v4(),
            time_remaining_secs: 3000,
        };
        sender.send(beacon.clone()).await.unwrap();
        assert_eq!(sender.sent(), vec![beacon]);
    }

    #[tokio::test]
    async fn test_failing_mock_errors() {
        let sender = MockBeaconSender::failing();
        let beacon = TimeBeacon {
            submission_id: Uuid::new_v4(),
            time_remaining_secs: 3000,
        };
        assert!(sender.send(beacon).await.is_err());
        assert!(sender.sent().is_empty());
    }

    #[test]
    fn test_beacon_payload_is_camel_case() {
        let beacon = TimeBeacon {
            submission_id: Uuid::nil(),
            time_remaining_secs: 42,
        };
        let json = serde_json::to_value(&beacon).unwrap();
        assert_eq!(json["timeRemaining"], 42);
        assert_eq!(
            json["submissionId"],
            "00000000-0000-0000-0000-000000000000"
        );

        let back: TimeBeacon = serde_json::from_value(json).unwrap();
        assert_eq!(back, beacon);
    }

    #[test]
    fn test_http_beacon_endpoint_normalizes_slash() {
        let a = HttpBeacon::new("http://localhost:4040");
        let b = HttpBeacon::new("http://localhost:4040/");
        assert_eq!(a.endpoint, b.endpoint);
        assert_eq!(a.endpoint, "http://localhost:4040/api/timer/beacon");
    }
}
