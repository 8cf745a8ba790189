/// Remote sensor driver polled over HTTP
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use url::Url;

use crate::error::Result;
use crate::models::RawReading;

/// Produces one temperature/humidity reading per call. Either field may be
/// missing; a failed read is an all-invalid reading, never an error.
#[async_trait]
pub trait SensorReader: Send + Sync {
    async fn read(&self) -> RawReading;
}

/// Sensor driver reachable at `SENSOR_URL`, answering
/// `{"temperature": <number|null>, "humidity": <number|null>}`
pub struct HttpSensor {
    client: reqwest::Client,
    url: Url,
}

impl HttpSensor {
    pub fn new(url: Url, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;
        Ok(HttpSensor { client, url })
    }

    async fn fetch(&self) -> Result<RawReading> {
        let reading = self
            .client
            .get(self.url.clone())
            .send()
            .await?
            .error_for_status()?
            .json::<RawReading>()
            .await?;
        Ok(reading)
    }
}

#[async_trait]
impl SensorReader for HttpSensor {
    async fn read(&self) -> RawReading {
        match self.fetch().await {
            Ok(reading) => {
                debug!(
                    "Sensor reading: temperature={:?}, humidity={:?}",
                    reading.temperature, reading.humidity
                );
                reading
            }
            Err(e) => {
                warn!("Sensor read failed: {}", e);
                RawReading::invalid()
            }
        }
    }
}
