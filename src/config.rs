use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use log::info;
use url::Url;

use crate::error::{NodeError, Result};

/// Longest accepted device identifier
pub const MAX_DEVICE_ID_LEN: usize = 32;

/// What the sample buffer does once it holds `capacity` samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferPolicy {
    /// Evict the oldest sample to admit the newest
    SlidingWindow,
    /// Stop sampling until a successful report drains the buffer
    Bounded,
}

impl FromStr for BufferPolicy {
    type Err = NodeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sliding" | "sliding-window" => Ok(BufferPolicy::SlidingWindow),
            "bounded" => Ok(BufferPolicy::Bounded),
            other => Err(NodeError::Config(format!(
                "BUFFER_POLICY must be 'sliding' or 'bounded', got '{}'",
                other
            ))),
        }
    }
}

/// Sampling and reporting cadence
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    pub buffer_capacity: usize,
    pub buffer_policy: BufferPolicy,
    pub report_interval_minutes: u8,
    pub sample_interval: Duration,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        ScheduleConfig {
            buffer_capacity: 15,
            buffer_policy: BufferPolicy::SlidingWindow,
            report_interval_minutes: 15,
            sample_interval: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub ingest_url: Url,
    pub device_id: String,
    pub sensor_url: Url,
    pub ingest_ca_cert: Option<PathBuf>,
    pub cloud_sync_url: Option<Url>,
    pub schedule: ScheduleConfig,
    pub http_timeout: Duration,
    pub tick: Duration,
    pub clock_sync_timeout: Duration,
    pub provision_attempts: usize,
}

impl NodeConfig {
    pub fn new() -> Result<Self> {
        // Load environment variables
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup (the process environment in production)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| NodeError::Config(format!("{} environment variable not set", key)))
        };

        let ingest_url = Url::parse(required("INGEST_URL")?.trim())?;
        if ingest_url.scheme() != "https" {
            return Err(NodeError::Config(format!(
                "INGEST_URL must use https, got '{}'",
                ingest_url.scheme()
            )));
        }

        let device_id = required("DEVICE_ID")?.trim().to_string();
        validate_device_id(&device_id)?;

        let sensor_url = Url::parse(required("SENSOR_URL")?.trim())?;

        let cloud_sync_url = match lookup("CLOUD_SYNC_URL").filter(|v| !v.trim().is_empty()) {
            Some(raw) => Some(Url::parse(raw.trim())?),
            None => None,
        };

        let ingest_ca_cert = lookup("INGEST_CA_CERT")
            .filter(|v| !v.trim().is_empty())
            .map(|v| PathBuf::from(v.trim()));

        let defaults = ScheduleConfig::default();
        let schedule = ScheduleConfig {
            buffer_capacity: parse_or(&lookup, "BUFFER_CAPACITY", defaults.buffer_capacity)?,
            buffer_policy: match lookup("BUFFER_POLICY") {
                Some(raw) => raw.parse()?,
                None => defaults.buffer_policy,
            },
            report_interval_minutes: parse_or(
                &lookup,
                "REPORT_INTERVAL_MINUTES",
                defaults.report_interval_minutes,
            )?,
            sample_interval: Duration::from_secs(parse_or(&lookup, "SAMPLE_INTERVAL_SECS", 60)?),
        };

        if schedule.buffer_capacity == 0 {
            return Err(NodeError::Config("BUFFER_CAPACITY must be positive".into()));
        }
        if schedule.report_interval_minutes == 0 || 60 % schedule.report_interval_minutes != 0 {
            return Err(NodeError::Config(format!(
                "REPORT_INTERVAL_MINUTES must divide 60, got {}",
                schedule.report_interval_minutes
            )));
        }
        if schedule.sample_interval.is_zero() {
            return Err(NodeError::Config("SAMPLE_INTERVAL_SECS must be positive".into()));
        }

        let config = NodeConfig {
            ingest_url,
            device_id,
            sensor_url,
            ingest_ca_cert,
            cloud_sync_url,
            schedule,
            http_timeout: Duration::from_secs(parse_or(&lookup, "HTTP_TIMEOUT_SECS", 10)?),
            tick: Duration::from_millis(parse_or(&lookup, "TICK_MILLIS", 250)?),
            clock_sync_timeout: Duration::from_secs(parse_or(
                &lookup,
                "CLOCK_SYNC_TIMEOUT_SECS",
                30,
            )?),
            provision_attempts: parse_or(&lookup, "PROVISION_ATTEMPTS", 10)?,
        };

        info!(
            "Device '{}' reporting to {} (capacity {}, policy {:?}, every {} min)",
            config.device_id,
            config.ingest_url,
            config.schedule.buffer_capacity,
            config.schedule.buffer_policy,
            config.schedule.report_interval_minutes
        );

        Ok(config)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| NodeError::Config(format!("Invalid {} '{}': {}", key, raw, e))),
        None => Ok(default),
    }
}

/// Device ids go into the payload unescaped, so only a safe ASCII subset is allowed
fn validate_device_id(id: &str) -> Result<()> {
    let safe = id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if id.is_empty() || id.len() > MAX_DEVICE_ID_LEN || !safe {
        return Err(NodeError::Config(format!(
            "DEVICE_ID must be 1-{} characters of [A-Za-z0-9_-], got '{}'",
            MAX_DEVICE_ID_LEN, id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    const BASE: [(&str, &str); 3] = [
        ("INGEST_URL", "https://script.example.com/macros/s/abc/exec"),
        ("DEVICE_ID", "greenhouse-01"),
        ("SENSOR_URL", "http://192.168.1.40/reading"),
    ];

    #[test]
    fn defaults_match_reference_deployment() {
        let config = NodeConfig::from_lookup(lookup_from(&BASE)).unwrap();
        assert_eq!(config.schedule.buffer_capacity, 15);
        assert_eq!(config.schedule.buffer_policy, BufferPolicy::SlidingWindow);
        assert_eq!(config.schedule.report_interval_minutes, 15);
        assert_eq!(config.schedule.sample_interval, Duration::from_secs(60));
        assert!(config.cloud_sync_url.is_none());
    }

    #[test]
    fn rejects_plain_http_ingest() {
        let mut pairs = BASE.to_vec();
        pairs[0] = ("INGEST_URL", "http://script.example.com/exec");
        assert!(matches!(
            NodeConfig::from_lookup(lookup_from(&pairs)),
            Err(NodeError::Config(_))
        ));
    }

    #[test]
    fn rejects_unsafe_device_id() {
        let long = "x".repeat(MAX_DEVICE_ID_LEN + 1);
        let mut pairs = BASE.to_vec();
        pairs[1] = ("DEVICE_ID", "bad\"id");
        assert!(NodeConfig::from_lookup(lookup_from(&pairs)).is_err());

        pairs[1] = ("DEVICE_ID", &long);
        assert!(NodeConfig::from_lookup(lookup_from(&pairs)).is_err());
    }

    #[test]
    fn parses_policy_and_interval() {
        let mut pairs = BASE.to_vec();
        pairs.push(("BUFFER_POLICY", "bounded"));
        pairs.push(("REPORT_INTERVAL_MINUTES", "7"));
        assert!(NodeConfig::from_lookup(lookup_from(&pairs)).is_err());

        pairs.pop();
        pairs.push(("REPORT_INTERVAL_MINUTES", "5"));
        let config = NodeConfig::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(config.schedule.buffer_policy, BufferPolicy::Bounded);
        assert_eq!(config.schedule.report_interval_minutes, 5);
    }

    #[test]
    fn missing_required_key_is_an_error() {
        let err = NodeConfig::from_lookup(lookup_from(&BASE[..2])).unwrap_err();
        assert!(err.to_string().contains("SENSOR_URL"));
    }
}
