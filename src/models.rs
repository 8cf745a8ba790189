use serde::{Deserialize, Serialize};

use crate::utils::{validate_humidity, validate_temperature};

/// Unvalidated values as reported by the sensor driver
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct RawReading {
    pub temperature: Option<f32>,
    pub humidity: Option<f32>,
}

impl RawReading {
    /// A reading where both fields failed
    pub fn invalid() -> Self {
        Self::default()
    }
}

/// One validated sensor sample. `None` marks a field as invalid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub temperature: Option<f32>,
    pub humidity: Option<f32>,
}

impl Sample {
    /// Range-check a raw reading. Out-of-range or non-finite values are stored
    /// as invalid, never as the raw number.
    pub fn from_raw(raw: RawReading) -> Self {
        Sample {
            temperature: raw.temperature.and_then(validate_temperature),
            humidity: raw.humidity.and_then(validate_humidity),
        }
    }

    /// Both fields valid
    pub fn valid_pair(&self) -> Option<(f32, f32)> {
        match (self.temperature, self.humidity) {
            (Some(t), Some(h)) => Some((t, h)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregateResult {
    pub temperature: f32,
    pub humidity: f32,
    pub valid_count: usize,
    pub total_count: usize,
}

/// Body posted to the ingestion endpoint
#[derive(Debug, Clone, Serialize)]
pub struct IngestPayload<'a> {
    pub temperature: f32,
    pub humidity: f32,
    pub device_id: &'a str,
}

/// Snapshot pushed to the status display after every tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DisplayStatus {
    pub temperature: Option<f32>,
    pub humidity: Option<f32>,
    pub connected: bool,
    pub clock_synced: bool,
    pub buffered: usize,
}
