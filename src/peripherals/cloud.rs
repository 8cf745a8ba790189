/// Cloud-variable mirror of the latest valid temperature and humidity
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use serde::Serialize;
use url::Url;

use crate::error::Result;
use crate::models::Sample;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CloudVariables {
    pub temperature: Option<f32>,
    pub humidity: Option<f32>,
}

/// One-way push of the mirrored values to the sync service
#[async_trait]
pub trait CloudSync: Send + Sync {
    async fn push(&self, values: &CloudVariables) -> Result<()>;
}

/// Last-known-good values plus a flag telling whether the service is behind
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CloudMirror {
    values: CloudVariables,
    dirty: bool,
}

impl CloudMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn values(&self) -> &CloudVariables {
        &self.values
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Take each valid field of `sample`; invalid fields keep the previous value.
    /// Returns true when anything changed.
    pub fn update(&mut self, sample: &Sample) -> bool {
        let mut changed = false;
        if let Some(t) = sample.temperature {
            changed |= self.values.temperature != Some(t);
            self.values.temperature = Some(t);
        }
        if let Some(h) = sample.humidity {
            changed |= self.values.humidity != Some(h);
            self.values.humidity = Some(h);
        }
        // Every valid sample is pushed, even an unchanged one
        self.dirty |= sample.temperature.is_some() || sample.humidity.is_some();
        changed
    }

    /// Push pending values once per tick. A failed push stays pending.
    pub async fn flush(&mut self, sync: &dyn CloudSync) {
        if !self.dirty {
            return;
        }
        match sync.push(&self.values).await {
            Ok(()) => self.dirty = false,
            Err(e) => warn!("Cloud variable sync failed: {}", e),
        }
    }
}

/// PUTs the variables as JSON to `CLOUD_SYNC_URL`
pub struct HttpCloudSync {
    client: reqwest::Client,
    url: Url,
}

impl HttpCloudSync {
    pub fn new(url: Url, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;
        Ok(HttpCloudSync { client, url })
    }
}

#[async_trait]
impl CloudSync for HttpCloudSync {
    async fn push(&self, values: &CloudVariables) -> Result<()> {
        self.client
            .put(self.url.clone())
            .json(values)
            .send()
            .await?
            .error_for_status()?;
        debug!("Cloud variables pushed: {:?}", values);
        Ok(())
    }
}

/// Used when no sync service is configured
pub struct LogCloudSync;

#[async_trait]
impl CloudSync for LogCloudSync {
    async fn push(&self, values: &CloudVariables) -> Result<()> {
        info!(
            "Cloud variables: temperature={:?}, humidity={:?}",
            values.temperature, values.humidity
        );
        Ok(())
    }
}
