//! Provider traits for the external services an interpretation depends on.
//!
//! Concrete REST implementations live in `interpret-cloud`; tests substitute
//! in-memory fakes. All providers are shared across requests behind `Arc`,
//! so they must be `Send + Sync`.

use async_trait::async_trait;

use crate::annotation::{AnnotationResult, SafetyVector};

/// Where the annotation service should read the image from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// A publicly resolvable `http(s)://` or `gs://` URI.
    Uri(String),
    /// Raw image bytes sent inline with the request.
    Bytes(Vec<u8>),
}

impl ImageSource {
    /// Treat web and storage URIs as remote sources.
    pub fn is_remote_path(path: &str) -> bool {
        path.starts_with("http") || path.starts_with("gs:")
    }
}

/// Failure of an external provider call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// The request never produced a response (network, DNS, TLS, timeout).
    #[error("request failed: {0}")]
    Request(String),

    /// The provider answered with a non-success status.
    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body did not have the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),

    /// The provider accepted the call but reported a per-item error.
    #[error("provider rejected the request: {0}")]
    Rejected(String),
}

#[async_trait]
pub trait ImageAnnotator: Send + Sync {
    /// Run web detection. The returned result carries a default safety vector.
    async fn annotate(&self, image: &ImageSource) -> Result<AnnotationResult, ProviderError>;

    /// Run safe-search detection.
    async fn safe_search(&self, image: &ImageSource) -> Result<SafetyVector, ProviderError>;
}

#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` into the ISO 639-1 language `target`.
    ///
    /// Returns the input unchanged when the service cannot improve on it.
    async fn translate(&self, text: &str, target: &str) -> Result<String, ProviderError>;
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `data` under `key` and return its public URL.
    async fn upload(&self, data: Vec<u8>, key: &str, content_type: &str)
        -> Result<String, ProviderError>;

    /// Public URLs of every stored object.
    async fn list(&self) -> Result<Vec<String>, ProviderError>;

    async fn delete(&self, key: &str) -> Result<(), ProviderError>;
}

#[async_trait]
pub trait LinkProbe: Send + Sync {
    /// `true` only when fetching `url` answers with HTTP 200.
    async fn exists(&self, url: &str) -> Result<bool, ProviderError>;
}
