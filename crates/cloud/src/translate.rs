//! Text translation REST client (v2 `translate`).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use interpret_core::providers::{ProviderError, Translator};

use crate::error::CloudApiError;
use crate::http::{parse_response, send_with_retry, RetryPolicy};

pub const DEFAULT_TRANSLATE_ENDPOINT: &str = "https://translation.googleapis.com";

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    target: &'a str,
    /// Plain text keeps the service from HTML-escaping apostrophes.
    format: &'static str,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    data: TranslationList,
}

#[derive(Debug, Deserialize)]
struct TranslationList {
    #[serde(default)]
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Translation {
    translated_text: String,
}

impl TranslateResponse {
    fn into_text(self) -> Result<String, CloudApiError> {
        self.data
            .translations
            .into_iter()
            .next()
            .map(|t| t.translated_text)
            .ok_or_else(|| CloudApiError::Decode("response carried no translations".to_string()))
    }
}

/// REST client for the translation service.
pub struct TranslateClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    retry: RetryPolicy,
}

impl TranslateClient {
    pub fn with_endpoint(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[async_trait]
impl Translator for TranslateClient {
    async fn translate(&self, text: &str, target: &str) -> Result<String, ProviderError> {
        let url = format!("{}/language/translate/v2", self.endpoint);
        let body = TranslateRequest {
            q: text,
            target,
            format: "text",
        };

        let response = send_with_retry(&self.retry, "translate", || {
            self.client
                .post(&url)
                .query(&[("key", self.api_key.as_str())])
                .json(&body)
        })
        .await
        .map_err(ProviderError::from)?;

        let parsed: TranslateResponse =
            parse_response(response).await.map_err(ProviderError::from)?;
        let translated = parsed.into_text()?;

        tracing::debug!(target_lang = target, "Translated label");
        Ok(translated)
    }
}
