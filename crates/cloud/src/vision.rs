//! Image annotation REST client (`images:annotate`).
//!
//! Web detection and safe-search are requested as two separate batch calls
//! so that a failure of one does not cost the other.

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};

use interpret_core::annotation::{AnnotationResult, Classification, Likelihood, SafetyVector};
use interpret_core::providers::{ImageAnnotator, ImageSource, ProviderError};

use crate::error::CloudApiError;
use crate::http::{parse_response, send_with_retry, RetryPolicy};

pub const DEFAULT_VISION_ENDPOINT: &str = "https://vision.googleapis.com";

/// Upper bound on web detection entries returned per list.
pub const WEB_DETECTION_MAX_RESULTS: u32 = 10;

const WEB_DETECTION: &str = "WEB_DETECTION";
const SAFE_SEARCH_DETECTION: &str = "SAFE_SEARCH_DETECTION";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct BatchAnnotateRequest<'a> {
    requests: Vec<AnnotateImageRequest<'a>>,
}

#[derive(Debug, Serialize)]
struct AnnotateImageRequest<'a> {
    image: ImagePayload<'a>,
    features: Vec<Feature>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImagePayload<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<ImageUri<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageUri<'a> {
    image_uri: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Feature {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_results: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct BatchAnnotateResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageResponse {
    web_detection: Option<WebDetection>,
    safe_search_annotation: Option<SafeSearchAnnotation>,
    error: Option<Status>,
}

#[derive(Debug, Deserialize)]
struct Status {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WebDetection {
    web_entities: Vec<WebEntity>,
    full_matching_images: Vec<WebImage>,
    partial_matching_images: Vec<WebImage>,
    pages_with_matching_images: Vec<WebPage>,
}

#[derive(Debug, Deserialize)]
struct WebEntity {
    score: Option<f32>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WebImage {
    url: String,
}

#[derive(Debug, Deserialize)]
struct WebPage {
    url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SafeSearchAnnotation {
    adult: Likelihood,
    spoof: Likelihood,
    medical: Likelihood,
    violence: Likelihood,
    racy: Likelihood,
}

impl From<WebDetection> for AnnotationResult {
    fn from(web: WebDetection) -> Self {
        // Entities without a description carry no usable label.
        let classifications = web
            .web_entities
            .into_iter()
            .filter_map(|entity| {
                let label = entity.description?;
                if label.trim().is_empty() {
                    return None;
                }
                Some(Classification::new(label, entity.score.unwrap_or(0.0)))
            })
            .collect();

        AnnotationResult {
            relevant_pages: web.pages_with_matching_images.into_iter().map(|p| p.url).collect(),
            full_matches: web.full_matching_images.into_iter().map(|i| i.url).collect(),
            partial_matches: web.partial_matching_images.into_iter().map(|i| i.url).collect(),
            classifications,
            safety: SafetyVector::default(),
        }
    }
}

impl From<SafeSearchAnnotation> for SafetyVector {
    fn from(s: SafeSearchAnnotation) -> Self {
        SafetyVector {
            adult: s.adult,
            spoof: s.spoof,
            medical: s.medical,
            violence: s.violence,
            racy: s.racy,
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// REST client for the image annotation service.
pub struct VisionClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    retry: RetryPolicy,
}

impl VisionClient {
    /// Client for `endpoint`: the vendor host or an emulator.
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

    /// Run one feature against one image and return the single response item.
    async fn run_feature(
        &self,
        image: &ImageSource,
        feature: Feature,
        operation: &'static str,
    ) -> Result<AnnotateImageResponse, CloudApiError> {
        let body = BatchAnnotateRequest {
            requests: vec![AnnotateImageRequest {
                image: image_payload(image),
                features: vec![feature],
            }],
        };
        let url = format!("{}/v1/images:annotate", self.endpoint);

        let response = send_with_retry(&self.retry, operation, || {
            self.client
                .post(&url)
                .query(&[("key", self.api_key.as_str())])
                .json(&body)
        })
        .await?;

        let batch: BatchAnnotateResponse = parse_response(response).await?;
        let item = batch.responses.into_iter().next().unwrap_or_default();

        if let Some(status) = item.error {
            return Err(CloudApiError::Rejected {
                code: status.code,
                message: status.message,
            });
        }
        Ok(item)
    }
}

fn image_payload(image: &ImageSource) -> ImagePayload<'_> {
    match image {
        ImageSource::Uri(uri) => ImagePayload {
            content: None,
            source: Some(ImageUri { image_uri: uri }),
        },
        ImageSource::Bytes(bytes) => ImagePayload {
            content: Some(base64::engine::general_purpose::STANDARD.encode(bytes)),
            source: None,
        },
    }
}

#[async_trait]
impl ImageAnnotator for VisionClient {
    async fn annotate(&self, image: &ImageSource) -> Result<AnnotationResult, ProviderError> {
        let feature = Feature {
            kind: WEB_DETECTION,
            max_results: Some(WEB_DETECTION_MAX_RESULTS),
        };
        let item = self.run_feature(image, feature, "web_detection").await?;
        let result: AnnotationResult = item.web_detection.unwrap_or_default().into();

        tracing::debug!(
            labels = result.classifications.len(),
            pages = result.relevant_pages.len(),
            full = result.full_matches.len(),
            partial = result.partial_matches.len(),
            "Web detection complete"
        );
        Ok(result)
    }

    async fn safe_search(&self, image: &ImageSource) -> Result<SafetyVector, ProviderError> {
        let feature = Feature {
            kind: SAFE_SEARCH_DETECTION,
            max_results: None,
        };
        let item = self.run_feature(image, feature, "safe_search").await?;
        let annotation = item.safe_search_annotation.ok_or_else(|| {
            CloudApiError::Decode("response carried no safeSearchAnnotation".to_string())
        })?;
        Ok(annotation.into())
    }
}
