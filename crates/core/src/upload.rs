//! Upload naming rules: extension allow-list, object keys and content types.

/// Extensions accepted when nothing else is configured.
pub const DEFAULT_ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

/// Fallback content type for unrecognised extensions.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Lower-cased text after the last `.`, or `None` when there is no dot.
pub fn file_extension(file_name: &str) -> Option<String> {
    let (_, ext) = file_name.rsplit_once('.')?;
    Some(ext.to_ascii_lowercase())
}

pub fn is_allowed_file<S: AsRef<str>>(file_name: &str, allowed: &[S]) -> bool {
    match file_extension(file_name) {
        Some(ext) => allowed.iter().any(|a| a.as_ref().eq_ignore_ascii_case(&ext)),
        None => false,
    }
}

/// Base name of an uploaded file, without any directory part a browser may
/// have sent.
pub fn base_name(file_name: &str) -> &str {
    file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name)
        .trim()
}

/// Storage key for an uploaded file: `{prefix}-{base name}`.
///
/// Callers pass a unique prefix so two uploads with the same name never
/// share an object.
pub fn object_key(prefix: &str, file_name: &str) -> String {
    format!("{prefix}-{}", base_name(file_name))
}

/// Content type for a file name, from its extension.
pub fn content_type_for(file_name: &str) -> &'static str {
    match file_extension(file_name).as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        _ => OCTET_STREAM,
    }
}
