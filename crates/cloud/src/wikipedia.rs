use async_trait::async_trait;
use reqwest::StatusCode;

use interpret_core::providers::{LinkProbe, ProviderError};

use crate::http::{send_with_retry, RetryPolicy};

/// Checks candidate article URLs with a plain GET.
pub struct HttpLinkProbe {
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl HttpLinkProbe {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[async_trait]
impl LinkProbe for HttpLinkProbe {
    async fn exists(&self, url: &str) -> Result<bool, ProviderError> {
        let response = send_with_retry(&self.retry, "link_probe", || self.client.get(url)).await?;
        let status = response.status();
        tracing::debug!(url, status = status.as_u16(), "Probed link");
        Ok(status == StatusCode::OK)
    }
}
