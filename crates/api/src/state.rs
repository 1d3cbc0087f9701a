use std::sync::Arc;

use interpret_core::error::CoreError;
use interpret_core::pipeline::Interpreter;
use interpret_core::providers::ObjectStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration, including the upload allow-list.
    pub config: Arc<ServerConfig>,
    /// Bucket holding uploaded images.
    pub store: Arc<dyn ObjectStore>,
    /// Annotation, safety and view pipeline.
    pub interpreter: Arc<Interpreter>,
}

impl AppState {
    pub fn allowed_extensions(&self) -> &[String] {
        &self.config.interpret.allowed_extensions
    }

    /// Public URLs of every stored image.
    pub async fn list_stored_images(&self) -> Result<Vec<String>, CoreError> {
        self.store.list().await.map_err(|e| CoreError::Upstream {
            service: "storage",
            message: e.to_string(),
        })
    }

    /// Like [`AppState::list_stored_images`], but a listing failure shows an
    /// empty gallery.
    pub async fn stored_images(&self) -> Vec<String> {
        match self.list_stored_images().await {
            Ok(urls) => urls,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to list stored images");
                Vec::new()
            }
        }
    }
}
