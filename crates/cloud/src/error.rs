use interpret_core::providers::ProviderError;

/// Errors from the cloud REST layer.
#[derive(Debug, thiserror::Error)]
pub enum CloudApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service returned a non-2xx status code.
    #[error("Cloud API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// A 2xx response whose body did not have the expected shape.
    #[error("Unexpected response: {0}")]
    Decode(String),

    /// The batch call succeeded but the item carried an error status.
    #[error("Request rejected ({code}): {message}")]
    Rejected { code: i32, message: String },

    /// An endpoint or object URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl From<CloudApiError> for ProviderError {
    fn from(err: CloudApiError) -> Self {
        match err {
            CloudApiError::Request(e) => ProviderError::Request(e.to_string()),
            CloudApiError::ApiError { status, body } => ProviderError::Status { status, body },
            CloudApiError::Decode(msg) => ProviderError::Decode(msg),
            CloudApiError::Rejected { code, message } => {
                ProviderError::Rejected(format!("{code}: {message}"))
            }
            CloudApiError::InvalidUrl(msg) => ProviderError::Request(msg),
        }
    }
}
