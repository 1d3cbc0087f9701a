pub mod health;
pub mod images;
pub mod pages;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /images                 list stored image URLs (GET)
/// /interpret              upload and interpret an image (POST, multipart)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().merge(images::router())
}
