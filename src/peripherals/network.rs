/// Connectivity checks and startup provisioning
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error, info, warn};
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};
use url::Url;

use crate::error::{NodeError, Result};

#[async_trait]
pub trait Connectivity: Send + Sync {
    async fn is_connected(&self) -> bool;
}

/// Treats the network as up when a TCP connection to the endpoint host succeeds
#[derive(Debug, Clone)]
pub struct TcpProbe {
    host: String,
    port: u16,
    timeout: Duration,
}

impl TcpProbe {
    pub fn for_url(url: &Url, timeout: Duration) -> Result<Self> {
        let host = url
            .host_str()
            .ok_or_else(|| NodeError::Config(format!("URL '{}' has no host", url)))?
            .to_string();
        let port = url
            .port_or_known_default()
            .ok_or_else(|| NodeError::Config(format!("URL '{}' has no port", url)))?;
        Ok(TcpProbe {
            host,
            port,
            timeout,
        })
    }
}

#[async_trait]
impl Connectivity for TcpProbe {
    async fn is_connected(&self) -> bool {
        match timeout(self.timeout, TcpStream::connect((self.host.as_str(), self.port))).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                debug!("Connectivity probe to {}:{} failed: {}", self.host, self.port, e);
                false
            }
            Err(_) => {
                debug!("Connectivity probe to {}:{} timed out", self.host, self.port);
                false
            }
        }
    }
}

/// Wait for connectivity before the engine starts.
///
/// Exhausting every attempt is fatal: the caller exits so that the process
/// supervisor restarts the node.
pub async fn provision(probe: &dyn Connectivity, attempts: usize, wait: Duration) -> Result<()> {
    for attempt in 0..attempts {
        if probe.is_connected().await {
            info!("Network available after {} attempt(s)", attempt + 1);
            return Ok(());
        }

        warn!("Attempt {}/{}: network not reachable", attempt + 1, attempts);

        if attempt + 1 < attempts {
            sleep(wait).await;
        }
    }

    error!("Network provisioning failed");
    Err(NodeError::Provisioning(format!(
        "no connectivity after {} attempts",
        attempts
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::net::TcpListener;

    struct FlakyNetwork {
        calls: AtomicUsize,
        up_after: usize,
    }

    #[async_trait]
    impl Connectivity for FlakyNetwork {
        async fn is_connected(&self) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst) + 1 >= self.up_after
        }
    }

    #[tokio::test]
    async fn provision_retries_until_connected() {
        let network = FlakyNetwork {
            calls: AtomicUsize::new(0),
            up_after: 3,
        };
        provision(&network, 5, Duration::ZERO).await.unwrap();
        assert_eq!(network.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn provision_fails_after_all_attempts() {
        let network = FlakyNetwork {
            calls: AtomicUsize::new(0),
            up_after: usize::MAX,
        };
        let err = provision(&network, 2, Duration::ZERO).await.unwrap_err();
        assert!(matches!(err, NodeError::Provisioning(_)));
        assert_eq!(network.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn tcp_probe_sees_listening_port() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let url = Url::parse(&format!("http://{}/", addr)).unwrap();
        let probe = TcpProbe::for_url(&url, Duration::from_secs(1)).unwrap();
        assert!(probe.is_connected().await);

        drop(listener);
        assert!(!probe.is_connected().await);
    }

    #[test]
    fn https_probe_defaults_to_443() {
        let url = Url::parse("https://script.example.com/exec").unwrap();
        let probe = TcpProbe::for_url(&url, Duration::from_secs(1)).unwrap();
        assert_eq!(probe.port, 443);
        assert_eq!(probe.host, "script.example.com");
    }
}
