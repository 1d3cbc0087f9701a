use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{gallery, interpret};
use crate::state::AppState;

/// JSON image routes, mounted under `/api/v1`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/images", get(gallery::list_images))
        .route("/interpret", post(interpret::interpret_json))
}
