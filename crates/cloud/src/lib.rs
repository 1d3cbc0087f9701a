//! REST implementations of the `interpret-core` provider traits.
//!
//! Every client shares one `reqwest::Client` built with the configured
//! timeout, and retries network failures and 429/5xx answers with bounded
//! exponential backoff.

pub mod config;
pub mod error;
pub mod http;
pub mod storage;
pub mod translate;
pub mod vision;
pub mod wikipedia;

#[cfg(test)]
mod test_support;

pub use config::{CloudConfig, CloudConfigError};
pub use error::CloudApiError;
pub use http::RetryPolicy;
pub use storage::GcsClient;
pub use translate::TranslateClient;
pub use vision::VisionClient;
pub use wikipedia::HttpLinkProbe;

/// The annotation-side clients, sharing one HTTP connection pool.
pub struct CloudClients {
    pub http: reqwest::Client,
    pub vision: VisionClient,
    pub translate: TranslateClient,
    pub links: HttpLinkProbe,
}

impl CloudClients {
    pub fn from_config(config: &CloudConfig) -> Result<Self, CloudApiError> {
        let http = http::build_client(config.timeout)?;

        let vision =
            VisionClient::with_endpoint(http.clone(), &config.vision_endpoint, &config.api_key)
                .with_retry(config.retry.clone());
        let translate = TranslateClient::with_endpoint(
            http.clone(),
            &config.translate_endpoint,
            &config.api_key,
        )
        .with_retry(config.retry.clone());
        let links = HttpLinkProbe::new(http.clone()).with_retry(config.retry.clone());

        Ok(Self {
            http,
            vision,
            translate,
            links,
        })
    }

    /// Storage client for `bucket`, reusing the shared HTTP client.
    pub fn storage(&self, config: &CloudConfig, bucket: &str) -> GcsClient {
        GcsClient::new(self.http.clone(), bucket, config.access_token.clone())
            .with_endpoints(&config.storage_endpoint, &config.storage_public_endpoint)
            .with_retry(config.retry.clone())
    }
}
