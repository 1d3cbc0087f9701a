use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{gallery, interpret};
use crate::state::AppState;

/// HTML pages, mounted at the root.
///
/// ```text
/// /                       gallery and upload form (GET)
/// /interpret              upload form target (POST, multipart)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(gallery::gallery_page))
        .route("/interpret", post(interpret::interpret_page))
}
