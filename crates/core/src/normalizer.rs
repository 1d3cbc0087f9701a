//! Response normalizer: semantically named accessors over an
//! [`AnnotationResult`] and a [`SafetyVector`].
//!
//! Everything here is a pure function of its inputs except
//! [`resolve_wikipedia_link`], which probes the candidate URL over HTTP and
//! degrades every failure to `None`.

use crate::annotation::{AnnotationResult, SafetyCategory, SafetyVector};
use crate::error::CoreError;
use crate::providers::LinkProbe;

/// Article URL template used when none is configured.
pub const DEFAULT_WIKIPEDIA_ENDPOINT: &str = "https://en.wikipedia.org/wiki/{}";

/// Substitution slot inside the article URL template.
pub const TEMPLATE_SLOT: &str = "{}";

// ---------------------------------------------------------------------------
// Matches
// ---------------------------------------------------------------------------

pub fn top_relevant_page(result: &AnnotationResult) -> Option<&str> {
    result.relevant_pages.first().map(String::as_str)
}

pub fn top_full_image_match(result: &AnnotationResult) -> Option<&str> {
    result.full_matches.first().map(String::as_str)
}

pub fn top_partial_image_match(result: &AnnotationResult) -> Option<&str> {
    result.partial_matches.first().map(String::as_str)
}

// ---------------------------------------------------------------------------
// Classifications
// ---------------------------------------------------------------------------

/// `(label, confidence)` pairs in the order the service returned them.
pub fn classes_by_score(result: &AnnotationResult) -> Vec<(&str, f32)> {
    result
        .classifications
        .iter()
        .map(|c| (c.label.as_str(), c.confidence))
        .collect()
}

/// Same pairs sorted by descending confidence. The sort is stable, so ties
/// keep the service order.
pub fn classes_sorted_by_confidence(result: &AnnotationResult) -> Vec<(&str, f32)> {
    let mut classes = classes_by_score(result);
    classes.sort_by(|a, b| b.1.total_cmp(&a.1));
    classes
}

pub fn top_label(result: &AnnotationResult) -> Option<&str> {
    result.classifications.first().map(|c| c.label.as_str())
}

/// The first `count` labels.
pub fn top_labels(result: &AnnotationResult, count: usize) -> Vec<String> {
    result
        .classifications
        .iter()
        .take(count)
        .map(|c| c.label.clone())
        .collect()
}

// ---------------------------------------------------------------------------
// Safety
// ---------------------------------------------------------------------------

/// Monitored categories whose likelihood ordinal is at or above `threshold`,
/// in the order of `monitored`.
pub fn unsafe_tags(
    safety: &SafetyVector,
    monitored: &[SafetyCategory],
    threshold: u8,
) -> Vec<SafetyCategory> {
    monitored
        .iter()
        .copied()
        .filter(|category| safety.get(*category).ordinal() >= threshold)
        .collect()
}

// ---------------------------------------------------------------------------
// Wikipedia
// ---------------------------------------------------------------------------

/// Check that an article template has exactly one substitution slot.
pub fn validate_template(template: &str) -> Result<(), CoreError> {
    match template.matches(TEMPLATE_SLOT).count() {
        1 => Ok(()),
        n => Err(CoreError::Validation(format!(
            "Article URL template must contain exactly one '{TEMPLATE_SLOT}' slot, found {n}"
        ))),
    }
}

/// Article URL for `label`, with spaces replaced by underscores.
///
/// Returns `None` for a blank label.
pub fn wikipedia_candidate(template: &str, label: &str) -> Option<String> {
    let title = label.trim().replace(' ', "_");
    if title.is_empty() {
        return None;
    }
    Some(template.replacen(TEMPLATE_SLOT, &title, 1))
}

/// Candidate article URL for `label`, kept only if the probe confirms it.
pub async fn resolve_wikipedia_link(
    probe: &dyn LinkProbe,
    template: &str,
    label: &str,
) -> Option<String> {
    let candidate = wikipedia_candidate(template, label)?;

    match probe.exists(&candidate).await {
        Ok(true) => Some(candidate),
        Ok(false) => {
            tracing::debug!(url = %candidate, "No article for top label");
            None
        }
        Err(e) => {
            tracing::warn!(url = %candidate, error = %e, "Article check failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::annotation::{Classification, Likelihood};
    use crate::providers::ProviderError;

    fn cat_result() -> AnnotationResult {
        AnnotationResult {
            classifications: vec![
                Classification::new("cat", 0.9),
                Classification::new("kitten", 0.7),
            ],
            ..Default::default()
        }
    }

    struct RecordingProbe {
        answer: Result<bool, ProviderError>,
        seen: Mutex<Vec<String>>,
    }

    impl RecordingProbe {
        fn new(answer: Result<bool, ProviderError>) -> Self {
            Self {
                answer,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LinkProbe for RecordingProbe {
        async fn exists(&self, url: &str) -> Result<bool, ProviderError> {
            self.seen.lock().unwrap().push(url.to_string());
            self.answer.clone()
        }
    }

    // -- matches -------------------------------------------------------------

    #[test]
    fn empty_matches_are_absent() {
        let result = AnnotationResult::default();
        assert_eq!(top_relevant_page(&result), None);
        assert_eq!(top_full_image_match(&result), None);
        assert_eq!(top_partial_image_match(&result), None);
    }

    #[test]
    fn first_match_wins() {
        let result = AnnotationResult {
            relevant_pages: vec!["https://a.example".into(), "https://b.example".into()],
            full_matches: vec!["https://full.example/1.png".into()],
            partial_matches: vec!["https://part.example/1.png".into()],
            ..Default::default()
        };
        assert_eq!(top_relevant_page(&result), Some("https://a.example"));
        assert_eq!(top_full_image_match(&result), Some("https://full.example/1.png"));
        assert_eq!(top_partial_image_match(&result), Some("https://part.example/1.png"));
    }

    // -- classifications -----------------------------------------------------

    #[test]
    fn classes_pass_through_in_service_order() {
        let result = AnnotationResult {
            classifications: vec![
                Classification::new("b", 0.2),
                Classification::new("a", 0.8),
            ],
            ..Default::default()
        };
        assert_eq!(classes_by_score(&result), vec![("b", 0.2), ("a", 0.8)]);
    }

    #[test]
    fn sorted_classes_are_descending_and_stable() {
        let result = AnnotationResult {
            classifications: vec![
                Classification::new("low", 0.1),
                Classification::new("tie-first", 0.5),
                Classification::new("high", 0.9),
                Classification::new("tie-second", 0.5),
            ],
            ..Default::default()
        };
        let labels: Vec<_> = classes_sorted_by_confidence(&result)
            .into_iter()
            .map(|(label, _)| label)
            .collect();
        assert_eq!(labels, vec!["high", "tie-first", "tie-second", "low"]);
    }

    #[test]
    fn top_labels_truncates_and_tolerates_short_input() {
        let result = cat_result();
        assert_eq!(top_label(&result), Some("cat"));
        assert_eq!(top_labels(&result, 1), vec!["cat"]);
        assert_eq!(top_labels(&result, 3), vec!["cat", "kitten"]);
        assert!(top_labels(&AnnotationResult::default(), 2).is_empty());
    }

    #[test]
    fn normalizing_twice_is_identical() {
        let result = cat_result();
        assert_eq!(classes_by_score(&result), classes_by_score(&result));
        assert_eq!(top_labels(&result, 2), top_labels(&result, 2));
    }

    // -- safety --------------------------------------------------------------

    #[test]
    fn adult_at_threshold_is_flagged() {
        let safety = SafetyVector::default().with(SafetyCategory::Adult, Likelihood::Likely);
        let monitored = [
            SafetyCategory::Adult,
            SafetyCategory::Violence,
            SafetyCategory::Racy,
        ];
        assert_eq!(unsafe_tags(&safety, &monitored, 4), vec![SafetyCategory::Adult]);
    }

    #[test]
    fn all_unknown_vector_is_clean() {
        let monitored = SafetyCategory::ALL;
        assert!(unsafe_tags(&SafetyVector::default(), &monitored, 2).is_empty());
    }

    #[test]
    fn unmonitored_categories_are_ignored() {
        let safety = SafetyVector::default().with(SafetyCategory::Medical, Likelihood::VeryLikely);
        assert!(unsafe_tags(&safety, &[SafetyCategory::Adult], 1).is_empty());
    }

    #[test]
    fn tags_follow_configured_order() {
        let safety = SafetyVector::default()
            .with(SafetyCategory::Adult, Likelihood::VeryLikely)
            .with(SafetyCategory::Racy, Likelihood::Likely);
        let monitored = [SafetyCategory::Racy, SafetyCategory::Adult];
        assert_eq!(
            unsafe_tags(&safety, &monitored, 4),
            vec![SafetyCategory::Racy, SafetyCategory::Adult]
        );
    }

    #[test]
    fn tags_match_threshold_exhaustively() {
        let monitored = SafetyCategory::ALL;
        for bucket in 0..=5u8 {
            let likelihood = Likelihood::from_ordinal(bucket).unwrap();
            let safety = SafetyVector::default().with(SafetyCategory::Violence, likelihood);
            for threshold in 1..=5u8 {
                let tags = unsafe_tags(&safety, &monitored, threshold);
                let expected = if bucket >= threshold {
                    vec![SafetyCategory::Violence]
                } else {
                    vec![]
                };
                assert_eq!(tags, expected, "bucket {bucket}, threshold {threshold}");
            }
        }
    }

    // -- wikipedia -----------------------------------------------------------

    #[test]
    fn template_needs_exactly_one_slot() {
        assert!(validate_template(DEFAULT_WIKIPEDIA_ENDPOINT).is_ok());
        assert!(validate_template("https://en.wikipedia.org/wiki/").is_err());
        assert!(validate_template("https://{}.wikipedia.org/wiki/{}").is_err());
    }

    #[test]
    fn candidate_replaces_spaces() {
        assert_eq!(
            wikipedia_candidate(DEFAULT_WIKIPEDIA_ENDPOINT, "Golden Gate Bridge").as_deref(),
            Some("https://en.wikipedia.org/wiki/Golden_Gate_Bridge")
        );
        assert_eq!(wikipedia_candidate(DEFAULT_WIKIPEDIA_ENDPOINT, "   "), None);
    }

    #[tokio::test]
    async fn confirmed_article_is_returned() {
        let probe = RecordingProbe::new(Ok(true));
        let link = resolve_wikipedia_link(&probe, DEFAULT_WIKIPEDIA_ENDPOINT, "cat").await;
        assert_eq!(link.as_deref(), Some("https://en.wikipedia.org/wiki/cat"));
        assert_eq!(probe.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_article_is_absent() {
        let probe = RecordingProbe::new(Ok(false));
        assert_eq!(
            resolve_wikipedia_link(&probe, DEFAULT_WIKIPEDIA_ENDPOINT, "cat").await,
            None
        );
    }

    #[tokio::test]
    async fn probe_failure_is_absent_not_an_error() {
        let probe = RecordingProbe::new(Err(ProviderError::Request("connection reset".into())));
        assert_eq!(
            resolve_wikipedia_link(&probe, DEFAULT_WIKIPEDIA_ENDPOINT, "cat").await,
            None
        );
    }
}
