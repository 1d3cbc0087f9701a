//! Upload-and-interpret flow shared by the HTML and JSON routes.
//!
//! ```text
//! multipart ─► no_file / wrong_extension
//!           └► [spawned] upload ─► upload_error
//!                               └► interpret ─┬─► unsafe       (object deleted)
//!                                             ├─► unavailable  (object deleted)
//!                                             └─► interpreted
//! ```

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;

use interpret_core::annotation::SafetyCategory;
use interpret_core::pipeline::Interpretation;
use interpret_core::providers::ImageSource;
use interpret_core::upload;
use interpret_core::view::ViewModel;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::page::PageState;
use crate::render::render_page;
use crate::response::DataResponse;
use crate::state::AppState;

/// Multipart field carrying the image.
pub const IMAGE_FIELD: &str = "image";

/// The image part of an upload form.
struct UploadedImage {
    file_name: String,
    content_type: Option<String>,
    data: Vec<u8>,
}

/// POST /interpret
///
/// Renders the resulting page. A malformed multipart body renders the
/// `no_file` page with status 400; a failed check renders `unavailable`
/// with status 500.
pub async fn interpret_page(State(state): State<AppState>, multipart: Multipart) -> Response {
    match interpret_upload(&state, multipart).await {
        Ok(page) => Html(render_page(&page, state.allowed_extensions())).into_response(),
        Err(AppError::BadRequest(msg)) => {
            tracing::warn!(error = %msg, "Rejected upload form");
            let html = render_page(&PageState::NoFile, state.allowed_extensions());
            (StatusCode::BAD_REQUEST, Html(html)).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Upload could not be checked");
            let html = render_page(&PageState::Unavailable, state.allowed_extensions());
            (StatusCode::INTERNAL_SERVER_ERROR, Html(html)).into_response()
        }
    }
}

/// POST /api/v1/interpret
pub async fn interpret_json(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<Json<DataResponse<PageState>>> {
    let page = interpret_upload(&state, multipart).await?;
    Ok(Json(DataResponse { data: page }))
}

/// Validate, store and interpret one uploaded image.
///
/// Every outcome except a malformed multipart body or a failed check task
/// is a [`PageState`].
pub async fn interpret_upload(state: &AppState, multipart: Multipart) -> AppResult<PageState> {
    let Some(image) = read_image_field(multipart).await? else {
        return Ok(PageState::NoFile);
    };

    if !upload::is_allowed_file(&image.file_name, state.allowed_extensions()) {
        tracing::info!(file_name = %image.file_name, "Rejected upload with disallowed extension");
        return Ok(PageState::WrongExtension {
            allowed: state.allowed_extensions().to_vec(),
        });
    }

    let key = upload::object_key(&Uuid::new_v4().simple().to_string(), &image.file_name);

    // Detached from the request so a timeout or client disconnect cannot
    // leave an unchecked object in the bucket.
    let task = tokio::spawn(store_and_check(state.clone(), image, key.clone()));
    let checked = match task.await {
        Ok(checked) => checked,
        Err(e) => {
            remove_upload(state, &key).await;
            return Err(AppError::InternalError(format!("Upload check task failed: {e}")));
        }
    };

    let page = match checked {
        Checked::NotStored => PageState::UploadError,
        Checked::Unsafe(unsafe_tags) => PageState::Unsafe { unsafe_tags },
        Checked::Unavailable => PageState::Unavailable,
        Checked::Interpreted { image_url, view } => PageState::Interpreted {
            image_url,
            stored_images: state.stored_images().await,
            view,
        },
    };

    Ok(page)
}

/// Outcome of storing and checking one upload.
enum Checked {
    NotStored,
    Unsafe(Vec<SafetyCategory>),
    Unavailable,
    Interpreted { image_url: String, view: ViewModel },
}

/// Upload `image` under `key` and interpret it, deleting the object unless
/// it was confirmed safe.
async fn store_and_check(state: AppState, image: UploadedImage, key: String) -> Checked {
    let content_type = image
        .content_type
        .filter(|ct| ct != upload::OCTET_STREAM)
        .unwrap_or_else(|| upload::content_type_for(&key).to_string());

    let image_url = match state.store.upload(image.data, &key, &content_type).await {
        Ok(url) if !url.is_empty() => url,
        Ok(_) => {
            tracing::warn!(key = %key, "Storage returned no URL for upload");
            return Checked::NotStored;
        }
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "Failed to store upload");
            return Checked::NotStored;
        }
    };

    match state.interpreter.interpret(&ImageSource::Uri(image_url.clone())).await {
        Ok(Interpretation::Interpreted(view)) => Checked::Interpreted { image_url, view },
        Ok(Interpretation::Unsafe(assessment)) => {
            tracing::info!(key = %key, tags = ?assessment.unsafe_tags, "Removing unsafe upload");
            remove_upload(&state, &key).await;
            Checked::Unsafe(assessment.unsafe_tags)
        }
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "Interpretation unavailable, removing upload");
            remove_upload(&state, &key).await;
            Checked::Unavailable
        }
    }
}

/// Read the `image` part, draining the rest of the form.
///
/// `None` when the part is missing or has an empty file name.
async fn read_image_field(mut multipart: Multipart) -> AppResult<Option<UploadedImage>> {
    let mut image: Option<UploadedImage> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some(IMAGE_FIELD) || image.is_some() {
            continue; // ignore unknown fields and repeated image parts
        }

        let file_name = field.file_name().unwrap_or("").trim().to_string();
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        if file_name.is_empty() {
            continue;
        }
        image = Some(UploadedImage {
            file_name,
            content_type,
            data: data.to_vec(),
        });
    }

    Ok(image)
}

async fn remove_upload(state: &AppState, key: &str) {
    if let Err(e) = state.store.delete(key).await {
        tracing::warn!(key, error = %e, "Failed to delete upload");
    }
}
