use crate::client::ClientConfig;
use crate::content::Headers;
use crate::error::ComposerError;
use crate::http::{HttpResponse, Transport};
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;
use std::time::Duration;

/// [`Transport`] backed by a pooled `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(connect_timeout: Duration, read_timeout: Duration) -> Result<Self, ComposerError> {
        let client = Client::builder()
            .no_proxy()
            .connect_timeout(connect_timeout)
            .timeout(read_timeout)
            .build()
            .map_err(|e| ComposerError::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    pub fn for_config(config: &ClientConfig) -> Result<Self, ComposerError> {
        Self::new(config.connect_timeout(), config.read_timeout())
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, target: &str, accept: &str) -> Result<HttpResponse, ComposerError> {
        let response = self
            .client
            .get(target)
            .header(ACCEPT, accept)
            .send()
            .await?;

        let status = response.status().as_u16();
        let mut headers = Headers::empty();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                headers.append(name.as_str(), value);
            }
        }
        let body = response.text().await?;
        Ok(HttpResponse::new(status, headers, body))
    }
}
