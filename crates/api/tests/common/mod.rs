//! Shared fixtures for API integration tests: in-memory providers, the test
//! router and request/response helpers.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use interpret_api::config::ServerConfig;
use interpret_api::router::build_app_router;
use interpret_api::state::AppState;
use interpret_core::annotation::{AnnotationResult, Classification, SafetyVector};
use interpret_core::pipeline::Interpreter;
use interpret_core::providers::{
    ImageAnnotator, ImageSource, LinkProbe, ObjectStore, ProviderError, Translator,
};

pub const PUBLIC_BASE: &str = "https://storage.googleapis.com/test-bucket";
pub const BOUNDARY: &str = "interpret-test-boundary";

// ---------------------------------------------------------------------------
// Fake object store
// ---------------------------------------------------------------------------

/// Records every call; optionally fails uploads or listings.
#[derive(Default)]
pub struct FakeStore {
    pub objects: Mutex<Vec<String>>,
    pub uploads: Mutex<Vec<(String, String, usize)>>,
    pub deletes: Mutex<Vec<String>>,
    pub fail_upload: bool,
    pub fail_list: bool,
}

impl FakeStore {
    pub fn with_objects(keys: &[&str]) -> Self {
        Self {
            objects: Mutex::new(keys.iter().map(|k| k.to_string()).collect()),
            ..Self::default()
        }
    }

    pub fn failing_uploads() -> Self {
        Self {
            fail_upload: true,
            ..Self::default()
        }
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deletes.lock().unwrap().clone()
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().clone()
    }

    pub fn uploaded_keys(&self) -> Vec<String> {
        self.uploads.lock().unwrap().iter().map(|(key, _, _)| key.clone()).collect()
    }
}

/// Keys are `{32 hex digits}-{base name}`.
pub fn assert_key_for(key: &str, file_name: &str) {
    let (prefix, rest) = key.split_once('-').expect("key has a prefix");
    assert_eq!(prefix.len(), 32, "unexpected key prefix in {key}");
    assert!(prefix.chars().all(|c| c.is_ascii_hexdigit()), "unexpected key prefix in {key}");
    assert_eq!(rest, file_name);
}

#[async_trait]
impl ObjectStore for FakeStore {
    async fn upload(
        &self,
        data: Vec<u8>,
        key: &str,
        content_type: &str,
    ) -> Result<String, ProviderError> {
        self.uploads
            .lock()
            .unwrap()
            .push((key.to_string(), content_type.to_string(), data.len()));
        if self.fail_upload {
            return Err(ProviderError::Status {
                status: 503,
                body: "backend unavailable".into(),
            });
        }
        self.objects.lock().unwrap().push(key.to_string());
        Ok(format!("{PUBLIC_BASE}/{key}"))
    }

    async fn list(&self) -> Result<Vec<String>, ProviderError> {
        if self.fail_list {
            return Err(ProviderError::Request("connection reset".into()));
        }
        Ok(self
            .objects
            .lock()
            .unwrap()
            .iter()
            .map(|k| format!("{PUBLIC_BASE}/{k}"))
            .collect())
    }

    async fn delete(&self, key: &str) -> Result<(), ProviderError> {
        self.deletes.lock().unwrap().push(key.to_string());
        self.objects.lock().unwrap().retain(|k| k != key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Fake annotation, translation and link providers
// ---------------------------------------------------------------------------

/// Returns a fixed web detection result and safety vector.
///
/// `safety: None` makes safe-search fail.
pub struct FakeAnnotator {
    pub result: AnnotationResult,
    pub safety: Option<SafetyVector>,
    pub seen: Mutex<Vec<ImageSource>>,
}

impl FakeAnnotator {
    pub fn new(result: AnnotationResult, safety: Option<SafetyVector>) -> Self {
        Self {
            result,
            safety,
            seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ImageAnnotator for FakeAnnotator {
    async fn annotate(&self, image: &ImageSource) -> Result<AnnotationResult, ProviderError> {
        self.seen.lock().unwrap().push(image.clone());
        Ok(self.result.clone())
    }

    async fn safe_search(&self, _image: &ImageSource) -> Result<SafetyVector, ProviderError> {
        self.safety
            .clone()
            .ok_or_else(|| ProviderError::Request("safe-search timed out".into()))
    }
}

/// Answers like the wrapped fake, but only after `delay` on safe-search.
pub struct SlowAnnotator {
    pub inner: FakeAnnotator,
    pub delay: Duration,
}

#[async_trait]
impl ImageAnnotator for SlowAnnotator {
    async fn annotate(&self, image: &ImageSource) -> Result<AnnotationResult, ProviderError> {
        self.inner.annotate(image).await
    }

    async fn safe_search(&self, image: &ImageSource) -> Result<SafetyVector, ProviderError> {
        tokio::time::sleep(self.delay).await;
        self.inner.safe_search(image).await
    }
}

/// Looks translations up in a table and echoes anything it does not know.
pub struct TableTranslator {
    table: HashMap<(String, String), String>,
}

impl TableTranslator {
    pub fn new(entries: &[(&str, &str, &str)]) -> Self {
        Self {
            table: entries
                .iter()
                .map(|(text, target, out)| {
                    ((text.to_string(), target.to_string()), out.to_string())
                })
                .collect(),
        }
    }
}

#[async_trait]
impl Translator for TableTranslator {
    async fn translate(&self, text: &str, target: &str) -> Result<String, ProviderError> {
        Ok(self
            .table
            .get(&(text.to_string(), target.to_string()))
            .cloned()
            .unwrap_or_else(|| text.to_string()))
    }
}

/// Reports only the listed URLs as existing.
pub struct FakeProbe {
    pub existing: Vec<String>,
}

#[async_trait]
impl LinkProbe for FakeProbe {
    async fn exists(&self, url: &str) -> Result<bool, ProviderError> {
        Ok(self.existing.iter().any(|u| u == url))
    }
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

/// Classifications `cat` (0.9) and `kitten` (0.7) with no matches.
pub fn cat_result() -> AnnotationResult {
    AnnotationResult {
        classifications: vec![
            Classification::new("cat", 0.9),
            Classification::new("kitten", 0.7),
        ],
        ..AnnotationResult::default()
    }
}

/// French and Spanish translate `cat`; Arabic echoes it.
pub fn cat_translator() -> TableTranslator {
    TableTranslator::new(&[("cat", "fr", "chat"), ("cat", "es", "gato")])
}

pub fn cat_probe() -> FakeProbe {
    FakeProbe {
        existing: vec!["https://en.wikipedia.org/wiki/cat".to_string()],
    }
}

// ---------------------------------------------------------------------------
// App construction
// ---------------------------------------------------------------------------

/// Default configuration, bound to localhost on an ephemeral port.
pub fn test_config() -> ServerConfig {
    test_config_with(&[])
}

pub fn test_config_with(pairs: &[(&str, &str)]) -> ServerConfig {
    let mut vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    vars.entry("HOST".into()).or_insert_with(|| "127.0.0.1".into());
    vars.entry("PORT".into()).or_insert_with(|| "0".into());
    ServerConfig::from_lookup(|name| vars.get(name).cloned()).expect("test config is valid")
}

/// Build the full router over the given fakes.
pub fn build_app(
    config: ServerConfig,
    store: Arc<FakeStore>,
    annotator: Arc<dyn ImageAnnotator>,
    translator: Arc<dyn Translator>,
    probe: Arc<dyn LinkProbe>,
) -> Router {
    let interpreter = Interpreter::new(
        annotator,
        translator,
        probe,
        config.interpret.policy.clone(),
        config.interpret.view.clone(),
    );
    let state = AppState {
        config: Arc::new(config.clone()),
        store,
        interpreter: Arc::new(interpreter),
    };
    build_app_router(state, &config)
}

/// Router for the cat scenario with the given safety vector.
pub fn build_test_app(store: Arc<FakeStore>, safety: Option<SafetyVector>) -> Router {
    build_app(
        test_config(),
        store,
        Arc::new(FakeAnnotator::new(cat_result(), safety)),
        Arc::new(cat_translator()),
        Arc::new(cat_probe()),
    )
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

/// One part of a multipart form.
pub struct Part<'a> {
    pub name: &'a str,
    pub file_name: Option<&'a str>,
    pub content_type: Option<&'a str>,
    pub data: &'a [u8],
}

impl<'a> Part<'a> {
    pub fn image(file_name: &'a str, data: &'a [u8]) -> Self {
        Self {
            name: "image",
            file_name: Some(file_name),
            content_type: Some("application/octet-stream"),
            data,
        }
    }

    pub fn text(name: &'a str, value: &'a str) -> Self {
        Self {
            name,
            file_name: None,
            content_type: None,
            data: value.as_bytes(),
        }
    }
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        let mut disposition = format!("Content-Disposition: form-data; name=\"{}\"", part.name);
        if let Some(file_name) = part.file_name {
            disposition.push_str(&format!("; filename=\"{file_name}\""));
        }
        body.extend_from_slice(disposition.as_bytes());
        body.extend_from_slice(b"\r\n");
        if let Some(content_type) = part.content_type {
            body.extend_from_slice(format!("Content-Type: {content_type}\r\n").as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub async fn post_multipart(app: Router, uri: &str, parts: &[Part<'_>]) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Poll `done` every 50 ms until it holds or `limit` passes.
pub async fn wait_until(limit: Duration, mut done: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if done() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    done()
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub async fn body_text(response: Response) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}
