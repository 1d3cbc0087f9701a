//! Cloud credentials and endpoints, loaded from the environment.

use std::time::Duration;

use crate::http::{RetryPolicy, DEFAULT_TIMEOUT};
use crate::storage::{DEFAULT_PUBLIC_ENDPOINT, DEFAULT_STORAGE_ENDPOINT};
use crate::translate::DEFAULT_TRANSLATE_ENDPOINT;
use crate::vision::DEFAULT_VISION_ENDPOINT;

/// Errors while reading cloud settings.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum CloudConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} is invalid: {message}")]
    Invalid { var: &'static str, message: String },
}

/// Settings shared by every cloud client.
///
/// | Variable                  | Default                                 |
/// |---------------------------|-----------------------------------------|
/// | `GOOGLE_API_KEY`          | required                                |
/// | `CLOUD_STORAGE_BUCKET`    | unset (required by the server)          |
/// | `GOOGLE_ACCESS_TOKEN`     | unset (no `Authorization` header)       |
/// | `UPSTREAM_TIMEOUT_SECS`   | `15`                                    |
/// | `UPSTREAM_MAX_RETRIES`    | `2`                                     |
/// | `VISION_ENDPOINT`         | `https://vision.googleapis.com`         |
/// | `TRANSLATE_ENDPOINT`      | `https://translation.googleapis.com`    |
/// | `STORAGE_ENDPOINT`        | `https://storage.googleapis.com`        |
/// | `STORAGE_PUBLIC_ENDPOINT` | `https://storage.googleapis.com`        |
#[derive(Debug, Clone)]
pub struct CloudConfig {
    pub api_key: String,
    pub bucket: Option<String>,
    pub access_token: Option<String>,
    pub timeout: Duration,
    pub retry: RetryPolicy,
    pub vision_endpoint: String,
    pub translate_endpoint: String,
    pub storage_endpoint: String,
    pub storage_public_endpoint: String,
}

impl CloudConfig {
    pub fn from_env() -> Result<Self, CloudConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CloudConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let api_key = get("GOOGLE_API_KEY").ok_or(CloudConfigError::Missing("GOOGLE_API_KEY"))?;

        let timeout_secs: u64 =
            parse_or("UPSTREAM_TIMEOUT_SECS", get("UPSTREAM_TIMEOUT_SECS"), 15)?;
        let timeout = if timeout_secs == 0 {
            DEFAULT_TIMEOUT
        } else {
            Duration::from_secs(timeout_secs)
        };
        let max_retries: u32 = parse_or("UPSTREAM_MAX_RETRIES", get("UPSTREAM_MAX_RETRIES"), 2)?;

        Ok(Self {
            api_key,
            bucket: get("CLOUD_STORAGE_BUCKET"),
            access_token: get("GOOGLE_ACCESS_TOKEN"),
            timeout,
            retry: RetryPolicy::with_max_retries(max_retries),
            vision_endpoint: get("VISION_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_VISION_ENDPOINT.to_string()),
            translate_endpoint: get("TRANSLATE_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_TRANSLATE_ENDPOINT.to_string()),
            storage_endpoint: get("STORAGE_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_STORAGE_ENDPOINT.to_string()),
            storage_public_endpoint: get("STORAGE_PUBLIC_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_PUBLIC_ENDPOINT.to_string()),
        })
    }

    /// Bucket name, or an error naming the variable to set.
    pub fn require_bucket(&self) -> Result<&str, CloudConfigError> {
        self.bucket
            .as_deref()
            .ok_or(CloudConfigError::Missing("CLOUD_STORAGE_BUCKET"))
    }
}

fn parse_or<T>(var: &'static str, raw: Option<String>, default: T) -> Result<T, CloudConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| CloudConfigError::Invalid {
            var,
            message: e.to_string(),
        }),
    }
}
