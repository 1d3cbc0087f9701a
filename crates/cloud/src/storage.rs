//! Object storage REST client (JSON API) for the uploads bucket.
//!
//! Objects are uploaded with a single `uploadType=media` request and served
//! from the public host, so the bucket must allow public reads.

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;

use interpret_core::providers::{ObjectStore, ProviderError};

use crate::error::CloudApiError;
use crate::http::{ensure_success, parse_response, send_with_retry, RetryPolicy};

pub const DEFAULT_STORAGE_ENDPOINT: &str = "https://storage.googleapis.com";
pub const DEFAULT_PUBLIC_ENDPOINT: &str = "https://storage.googleapis.com";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ObjectList {
    items: Vec<ObjectResource>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ObjectResource {
    name: String,
}

/// REST client bound to a single bucket.
pub struct GcsClient {
    client: reqwest::Client,
    bucket: String,
    access_token: Option<String>,
    endpoint: String,
    public_endpoint: String,
    retry: RetryPolicy,
}

impl GcsClient {
    /// `access_token` is sent as a bearer token when present.
    pub fn new(
        client: reqwest::Client,
        bucket: impl Into<String>,
        access_token: Option<String>,
    ) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            access_token,
            endpoint: DEFAULT_STORAGE_ENDPOINT.to_string(),
            public_endpoint: DEFAULT_PUBLIC_ENDPOINT.to_string(),
            retry: RetryPolicy::default(),
        }
    }

    /// Use a different API host (emulators) and public host.
    pub fn with_endpoints(
        mut self,
        endpoint: impl Into<String>,
        public_endpoint: impl Into<String>,
    ) -> Self {
        self.endpoint = endpoint.into();
        self.public_endpoint = public_endpoint.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Public URL of an object; each `/`-separated part of the key is
    /// percent-encoded as a path segment.
    pub fn public_url(&self, key: &str) -> Result<String, CloudApiError> {
        let mut segments = vec![self.bucket.as_str()];
        segments.extend(key.split('/'));
        Ok(build_url(&self.public_endpoint, &segments)?.to_string())
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn objects_url(&self) -> Result<Url, CloudApiError> {
        build_url(&self.endpoint, &["storage", "v1", "b", &self.bucket, "o"])
    }
}

/// Join `segments` onto `base`, encoding each one.
fn build_url(base: &str, segments: &[&str]) -> Result<Url, CloudApiError> {
    let mut url =
        Url::parse(base).map_err(|e| CloudApiError::InvalidUrl(format!("{base}: {e}")))?;
    url.path_segments_mut()
        .map_err(|_| CloudApiError::InvalidUrl(format!("{base}: cannot be a base")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

#[async_trait]
impl ObjectStore for GcsClient {
    async fn upload(
        &self,
        data: Vec<u8>,
        key: &str,
        content_type: &str,
    ) -> Result<String, ProviderError> {
        let url = build_url(
            &self.endpoint,
            &["upload", "storage", "v1", "b", &self.bucket, "o"],
        )?;
        let size = data.len();

        let response = send_with_retry(&self.retry, "storage_upload", || {
            self.authorize(
                self.client
                    .post(url.clone())
                    .query(&[("uploadType", "media"), ("name", key)])
                    .header(reqwest::header::CONTENT_TYPE, content_type)
                    .body(data.clone()),
            )
        })
        .await?;
        let stored: ObjectResource = parse_response(response).await?;

        tracing::info!(bucket = %self.bucket, key = %stored.name, size, "Uploaded object");
        Ok(self.public_url(&stored.name)?)
    }

    async fn list(&self) -> Result<Vec<String>, ProviderError> {
        let url = self.objects_url()?;
        let mut urls = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let response = send_with_retry(&self.retry, "storage_list", || {
                let mut request = self.client.get(url.clone());
                if let Some(token) = &page_token {
                    request = request.query(&[("pageToken", token.as_str())]);
                }
                self.authorize(request)
            })
            .await?;
            let page: ObjectList = parse_response(response).await?;

            for object in page.items {
                urls.push(self.public_url(&object.name)?);
            }

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        tracing::debug!(bucket = %self.bucket, count = urls.len(), "Listed objects");
        Ok(urls)
    }

    async fn delete(&self, key: &str) -> Result<(), ProviderError> {
        // The whole key is one segment here, so `/` is encoded as well.
        let url = build_url(&self.endpoint, &["storage", "v1", "b", &self.bucket, "o", key])?;

        let response = send_with_retry(&self.retry, "storage_delete", || {
            self.authorize(self.client.delete(url.clone()))
        })
        .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            tracing::debug!(bucket = %self.bucket, key, "Object already absent");
            return Ok(());
        }
        ensure_success(response).await?;

        tracing::info!(bucket = %self.bucket, key, "Deleted object");
        Ok(())
    }
}
