/// Secured HTTP delivery to the ingestion endpoint
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use url::Url;

use crate::error::Result;

/// Sends one serialized message and reports the response status code
#[async_trait]
pub trait IngestTransport: Send + Sync {
    async fn post(&self, body: Vec<u8>) -> Result<u16>;
}

pub struct HttpTransport {
    client: reqwest::Client,
    url: Url,
}

impl HttpTransport {
    /// Build the client used for every delivery attempt.
    ///
    /// Redirects are not followed: the endpoint is a script proxy whose 3xx
    /// answer already means the data was accepted.
    pub fn new(url: Url, timeout: Duration, ca_cert: Option<&Path>) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .redirect(Policy::none());

        if let Some(path) = ca_cert {
            let pem = std::fs::read(path)?;
            builder = builder.add_root_certificate(reqwest::Certificate::from_pem(&pem)?);
        }

        Ok(HttpTransport {
            client: builder.build()?,
            url,
        })
    }
}

#[async_trait]
impl IngestTransport for HttpTransport {
    async fn post(&self, body: Vec<u8>) -> Result<u16> {
        let response = self
            .client
            .post(self.url.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;
        Ok(response.status().as_u16())
    }
}
