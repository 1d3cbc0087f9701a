//! HTML rendering for [`PageState`].
//!
//! One page layout: upload form, a state-specific section, then the stored
//! image gallery where the state carries one. All interpolated text is
//! escaped, and only `http(s)` URLs are emitted into `href`/`src`.

use interpret_core::view::{LabelTranslation, ViewModel};

use crate::page::PageState;

const TITLE: &str = "Image Interpret";

const STYLE: &str = "body{font-family:sans-serif;max-width:960px;margin:2rem auto;padding:0 1rem}\
.notice{padding:.75rem 1rem;border-radius:4px;background:#fff4e5}\
.notice.error{background:#fdecea}\
.gallery{display:flex;flex-wrap:wrap;gap:.5rem}\
.gallery img{height:120px;object-fit:cover}\
table{border-collapse:collapse}td,th{padding:.25rem .75rem;text-align:left}";

/// Render the full HTML document for `state`.
pub fn render_page(state: &PageState, allowed_extensions: &[String]) -> String {
    let mut body = String::new();
    body.push_str(&format!("<h1>{TITLE}</h1>\n"));
    body.push_str(&upload_form(allowed_extensions));

    match state {
        PageState::Gallery { stored_images } => {
            body.push_str(&gallery(stored_images));
        }
        PageState::NoFile => {
            body.push_str(&notice("No image was selected. Choose a file to interpret.", false));
        }
        PageState::WrongExtension { allowed } => {
            body.push_str(&notice(
                &format!("That file type is not supported. Allowed: {}.", allowed.join(", ")),
                false,
            ));
        }
        PageState::UploadError => {
            body.push_str(&notice("The image could not be stored. Please try again.", true));
        }
        PageState::Unavailable => {
            body.push_str(&notice(
                "The image could not be checked right now. Please try again.",
                true,
            ));
        }
        PageState::Unsafe { unsafe_tags } => {
            let tags: Vec<&str> = unsafe_tags.iter().map(|t| t.as_str()).collect();
            body.push_str(&notice(
                &format!(
                    "This image was flagged as unsafe ({}) and has been removed.",
                    tags.join(", ")
                ),
                true,
            ));
        }
        PageState::Interpreted {
            image_url,
            stored_images,
            view,
        } => {
            body.push_str(&interpretation(image_url, view));
            body.push_str(&gallery(stored_images));
        }
    }

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>{TITLE}</title>\n<style>{STYLE}</style>\n</head>\n<body data-state=\"{}\">\n\
         {body}</body>\n</html>\n",
        state.name()
    )
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

fn upload_form(allowed_extensions: &[String]) -> String {
    let accept: Vec<String> = allowed_extensions.iter().map(|e| format!(".{e}")).collect();
    format!(
        "<form action=\"/interpret\" method=\"post\" enctype=\"multipart/form-data\">\n\
         <input type=\"file\" name=\"image\" accept=\"{}\">\n\
         <button type=\"submit\">Interpret</button>\n</form>\n",
        escape(&accept.join(","))
    )
}

fn notice(message: &str, error: bool) -> String {
    let class = if error { "notice error" } else { "notice" };
    format!("<p class=\"{class}\">{}</p>\n", escape(message))
}

fn gallery(stored_images: &[String]) -> String {
    if stored_images.is_empty() {
        return "<section class=\"gallery\"><p>No images have been interpreted yet.</p></section>\n"
            .to_string();
    }
    let mut html = String::from("<h2>Interpreted images</h2>\n<section class=\"gallery\">\n");
    for url in stored_images.iter().filter(|u| is_http_url(u)) {
        let url = escape(url);
        html.push_str(&format!(
            "<a href=\"{url}\"><img src=\"{url}\" alt=\"\" loading=\"lazy\"></a>\n"
        ));
    }
    html.push_str("</section>\n");
    html
}

fn interpretation(image_url: &str, view: &ViewModel) -> String {
    let mut html = String::from("<section class=\"interpretation\">\n");

    if is_http_url(image_url) {
        html.push_str(&format!(
            "<img src=\"{}\" alt=\"Uploaded image\" style=\"max-width:100%\">\n",
            escape(image_url)
        ));
    }

    if view.highest_matches.is_empty() {
        html.push_str("<p>No labels were found for this image.</p>\n");
    } else {
        html.push_str("<h2>Best guesses</h2>\n<ol class=\"labels\">\n");
        for label in &view.highest_matches {
            html.push_str(&format!("<li>{}</li>\n", escape(label)));
        }
        html.push_str("</ol>\n");
    }

    let links = [
        ("Wikipedia article", view.wikipedia_article.as_deref()),
        ("Most relevant page", view.relevant_page.as_deref()),
        ("Full matching image", view.full_matched_image.as_deref()),
        ("Partial matching image", view.partial_matched_image.as_deref()),
    ];
    let present: Vec<_> = links
        .iter()
        .filter_map(|(title, url)| url.filter(|u| is_http_url(u)).map(|u| (title, u)))
        .collect();
    if !present.is_empty() {
        html.push_str("<ul class=\"links\">\n");
        for (title, url) in present {
            html.push_str(&format!(
                "<li><a href=\"{}\" rel=\"noopener noreferrer\">{title}</a></li>\n",
                escape(url)
            ));
        }
        html.push_str("</ul>\n");
    }

    if !view.translations.is_empty() {
        html.push_str("<h2>Translations</h2>\n<table class=\"translations\">\n");
        for translation in &view.translations {
            html.push_str(&translation_row(translation));
        }
        html.push_str("</table>\n");
    }

    html.push_str("</section>\n");
    html
}

fn translation_row(translation: &LabelTranslation) -> String {
    let text = translation
        .text
        .as_deref()
        .map(escape)
        .unwrap_or_else(|| "<em>unavailable</em>".to_string());
    format!(
        "<tr><th>{}</th><td lang=\"{}\">{text}</td></tr>\n",
        escape(&translation.language),
        escape(&translation.code)
    )
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Escape text for use in HTML element content and quoted attributes.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            other => out.push(other),
        }
    }
    out
}

fn is_http_url(url: &str) -> bool {
    let lower = url.trim_start().to_ascii_lowercase();
    lower.starts_with("https://") || lower.starts_with("http://")
}
