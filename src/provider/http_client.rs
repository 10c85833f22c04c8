use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::provider::parsers::provider_error_message;
use anyhow::{Context, Result};
use std::time::Duration;
use tracing::debug;
use url::Url;

pub struct HttpClient {
    inner: reqwest::Client,
}

impl HttpClient {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            // The crumb endpoint only answers when the consent cookie is sent back
            .cookie_store(true)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { inner })
    }

    /// GET a URL only for its cookies; the response status is ignored.
    pub async fn touch(&self, url: &str) -> Result<(), ProviderError> {
        debug!("GET {} (cookie bootstrap)", url);
        let resp = self.inner.get(url).send().await?;
        debug!("cookie bootstrap answered {}", resp.status());
        Ok(())
    }

    /// Fetch a URL as text; non-2xx statuses become `ProviderError::Status`.
    pub async fn get_text(&self, url: &Url) -> Result<String, ProviderError> {
        debug!("GET {}", url);
        let resp = self.inner.get(url.as_str()).send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if status.is_success() {
            return Ok(body);
        }

        let detail = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|json| provider_error_message(&json))
            .or_else(|| status.canonical_reason().map(str::to_string))
            .unwrap_or_else(|| url.path().to_string());

        Err(ProviderError::Status {
            status: status.as_u16(),
            detail,
        })
    }

    pub async fn get_json(&self, url: &Url) -> Result<serde_json::Value, ProviderError> {
        let body = self.get_text(url).await?;
        Ok(serde_json::from_str(&body)?)
    }
}
