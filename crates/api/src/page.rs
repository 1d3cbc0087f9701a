//! Render states for the gallery and interpret pages.
//!
//! Each request ends in exactly one [`PageState`]; the HTML routes render it
//! with [`crate::render`] and the JSON API returns it as
//! `{ "data": { "state": ..., ... } }`.

use interpret_core::annotation::SafetyCategory;
use interpret_core::view::ViewModel;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PageState {
    /// Landing page listing every stored image.
    Gallery { stored_images: Vec<String> },
    /// No file part, or a part with an empty file name.
    NoFile,
    /// The file name's extension is not on the allow-list.
    WrongExtension { allowed: Vec<String> },
    /// Storage did not return a URL for the upload.
    UploadError,
    /// Safe-search could not be checked; the upload was removed.
    Unavailable,
    /// Flagged by the safety policy; the upload was removed.
    Unsafe { unsafe_tags: Vec<SafetyCategory> },
    Interpreted {
        image_url: String,
        stored_images: Vec<String>,
        view: ViewModel,
    },
}

impl PageState {
    pub fn name(&self) -> &'static str {
        match self {
            PageState::Gallery { .. } => "gallery",
            PageState::NoFile => "no_file",
            PageState::WrongExtension { .. } => "wrong_extension",
            PageState::UploadError => "upload_error",
            PageState::Unavailable => "unavailable",
            PageState::Unsafe { .. } => "unsafe",
            PageState::Interpreted { .. } => "interpreted",
        }
    }
}
