use axum::extract::State;
use axum::response::Html;
use axum::Json;

use crate::error::AppResult;
use crate::page::PageState;
use crate::render::render_page;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /
///
/// Landing page with the upload form and every stored image.
pub async fn gallery_page(State(state): State<AppState>) -> Html<String> {
    let page = PageState::Gallery {
        stored_images: state.stored_images().await,
    };
    Html(render_page(&page, state.allowed_extensions()))
}

/// GET /api/v1/images
///
/// Unlike the gallery page, a listing failure is a 502.
pub async fn list_images(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<String>>>> {
    let urls = state.list_stored_images().await?;
    Ok(Json(DataResponse { data: urls }))
}
