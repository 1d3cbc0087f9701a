//! View builder: flattens a safe [`AnnotationResult`] into the fields the
//! page renders, translating the top label into each target language.

use futures::future::join_all;
use serde::Serialize;

use crate::annotation::AnnotationResult;
use crate::error::CoreError;
use crate::normalizer::{self, DEFAULT_WIKIPEDIA_ENDPOINT};
use crate::providers::{LinkProbe, Translator};

/// Shown instead of a translation identical to the source label.
pub const NO_TRANSLATION: &str = "Same as English or N/A";

/// Number of labels shown when nothing else is configured.
pub const DEFAULT_TOP_LABEL_COUNT: usize = 2;

/// A language the top label is translated into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetLanguage {
    /// ISO 639-1 code, e.g. `es`.
    pub code: String,
    /// Display name, e.g. `Spanish`.
    pub name: String,
}

impl TargetLanguage {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ViewSettings {
    top_label_count: usize,
    languages: Vec<TargetLanguage>,
    wikipedia_template: String,
}

impl ViewSettings {
    pub fn new(
        top_label_count: usize,
        languages: Vec<TargetLanguage>,
        wikipedia_template: impl Into<String>,
    ) -> Result<Self, CoreError> {
        if top_label_count == 0 {
            return Err(CoreError::Validation(
                "Top label count must be at least 1".into(),
            ));
        }
        let wikipedia_template = wikipedia_template.into();
        normalizer::validate_template(&wikipedia_template)?;

        Ok(Self {
            top_label_count,
            languages,
            wikipedia_template,
        })
    }

    pub fn top_label_count(&self) -> usize {
        self.top_label_count
    }

    pub fn languages(&self) -> &[TargetLanguage] {
        &self.languages
    }
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            top_label_count: DEFAULT_TOP_LABEL_COUNT,
            languages: Vec::new(),
            wikipedia_template: DEFAULT_WIKIPEDIA_ENDPOINT.to_string(),
        }
    }
}

/// Top label rendered in one target language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelTranslation {
    pub code: String,
    pub language: String,
    /// `None` when the translation call failed.
    pub text: Option<String>,
}

/// Display fields for one interpreted image.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ViewModel {
    pub relevant_page: Option<String>,
    pub full_matched_image: Option<String>,
    pub partial_matched_image: Option<String>,
    pub wikipedia_article: Option<String>,
    pub highest_matches: Vec<String>,
    pub translations: Vec<LabelTranslation>,
}

/// Replace an echoed translation with [`NO_TRANSLATION`].
pub fn translation_or_marker(source: &str, translated: String) -> String {
    if translated == source {
        NO_TRANSLATION.to_string()
    } else {
        translated
    }
}

/// Build the view model. Must only be called for images that passed the
/// safety assessment.
pub async fn build_view(
    result: &AnnotationResult,
    settings: &ViewSettings,
    translator: &dyn Translator,
    probe: &dyn LinkProbe,
) -> ViewModel {
    let highest_matches = normalizer::top_labels(result, settings.top_label_count);

    let (wikipedia_article, translations) = match normalizer::top_label(result) {
        Some(top) => {
            let article =
                normalizer::resolve_wikipedia_link(probe, &settings.wikipedia_template, top).await;
            let translations = translate_label(top, &settings.languages, translator).await;
            (article, translations)
        }
        None => (None, Vec::new()),
    };

    ViewModel {
        relevant_page: normalizer::top_relevant_page(result).map(str::to_owned),
        full_matched_image: normalizer::top_full_image_match(result).map(str::to_owned),
        partial_matched_image: normalizer::top_partial_image_match(result).map(str::to_owned),
        wikipedia_article,
        highest_matches,
        translations,
    }
}

/// Translate `label` into every language concurrently. Output order follows
/// `languages`.
async fn translate_label(
    label: &str,
    languages: &[TargetLanguage],
    translator: &dyn Translator,
) -> Vec<LabelTranslation> {
    let calls = languages.iter().map(|lang| async move {
        let text = match translator.translate(label, &lang.code).await {
            Ok(translated) => Some(translation_or_marker(label, translated)),
            Err(e) => {
                tracing::warn!(language = %lang.code, error = %e, "Translation failed");
                None
            }
        };
        LabelTranslation {
            code: lang.code.clone(),
            language: lang.name.clone(),
            text,
        }
    });

    join_all(calls).await
}
