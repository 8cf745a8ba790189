/// Delivery of the averaged reading to the ingestion endpoint
use std::time::Duration;

use log::{info, warn};
use tokio::time::timeout;

use crate::engine::buffer::SampleBuffer;
use crate::error::{NodeError, Result};
use crate::models::{AggregateResult, IngestPayload};
use crate::peripherals::{Connectivity, IngestTransport};
use crate::utils::round2;

/// Upper bound on the serialized message.
///
/// Worst case is `{"temperature":-39.99,"humidity":100.0,"device_id":"<32 chars>"}`,
/// well under this bound: averages of range-checked values stay within
/// [-40, 80] and [0, 100], two decimals keep each number to at most six
/// characters, and device ids are limited to 32 characters needing no escaping.
pub const MAX_PAYLOAD_LEN: usize = 128;

#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    /// Acknowledged with a 2xx or 3xx status; the buffer was cleared
    Delivered(u16),
    /// No connectivity, the transport was not touched
    Skipped,
    /// Endpoint answered with a non-success status
    Rejected(u16),
    /// Transport error, timeout or encoding failure
    Failed(String),
}

/// 2xx, or a redirect from the script proxy
pub fn is_success_status(status: u16) -> bool {
    (200..400).contains(&status)
}

/// Serialize an aggregate into the bounded wire message
pub fn encode_payload(result: &AggregateResult, device_id: &str) -> Result<Vec<u8>> {
    let payload = IngestPayload {
        temperature: round2(result.temperature),
        humidity: round2(result.humidity),
        device_id,
    };

    let mut body = Vec::with_capacity(MAX_PAYLOAD_LEN);
    serde_json::to_writer(&mut body, &payload)?;
    if body.len() > MAX_PAYLOAD_LEN {
        return Err(NodeError::PayloadTooLarge(body.len()));
    }
    Ok(body)
}

pub struct Uploader {
    device_id: String,
    transport: Box<dyn IngestTransport>,
    network: Box<dyn Connectivity>,
    timeout: Duration,
}

impl Uploader {
    pub fn new(
        device_id: String,
        transport: Box<dyn IngestTransport>,
        network: Box<dyn Connectivity>,
        timeout: Duration,
    ) -> Self {
        Uploader {
            device_id,
            transport,
            network,
            timeout,
        }
    }

    /// Attempt one delivery of `result`.
    ///
    /// The buffer is cleared only on `Delivered`; every other outcome leaves it
    /// untouched so the same window is retried on the next report trigger.
    pub async fn upload(
        &self,
        result: &AggregateResult,
        buffer: &mut SampleBuffer,
    ) -> UploadOutcome {
        if !self.network.is_connected().await {
            warn!(
                "Network unavailable, keeping {} buffered samples for the next report",
                buffer.len()
            );
            return UploadOutcome::Skipped;
        }

        let body = match encode_payload(result, &self.device_id) {
            Ok(body) => body,
            Err(e) => {
                warn!("Could not encode report: {}", e);
                return UploadOutcome::Failed(e.to_string());
            }
        };

        let outcome = match timeout(self.timeout, self.transport.post(body)).await {
            Ok(Ok(status)) if is_success_status(status) => UploadOutcome::Delivered(status),
            Ok(Ok(status)) => UploadOutcome::Rejected(status),
            Ok(Err(e)) => UploadOutcome::Failed(e.to_string()),
            Err(elapsed) => UploadOutcome::Failed(NodeError::from(elapsed).to_string()),
        };

        match &outcome {
            UploadOutcome::Delivered(status) => {
                info!(
                    "Report delivered (status {}): {:.2}°C, {:.2}% from {}/{} samples",
                    status,
                    result.temperature,
                    result.humidity,
                    result.valid_count,
                    result.total_count
                );
                buffer.clear();
            }
            UploadOutcome::Rejected(status) => {
                warn!("Report rejected with status {}, buffer retained", status)
            }
            UploadOutcome::Failed(reason) => {
                warn!("Report delivery failed: {}, buffer retained", reason)
            }
            UploadOutcome::Skipped => {}
        }

        outcome
    }
}
