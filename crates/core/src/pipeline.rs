//! Per-request interpretation pipeline.
//!
//! ```text
//! annotate ──► safe-search ──► assess ──┬─► Unsafe(tags)
//!                                       └─► build view ──► Interpreted(view)
//! ```
//!
//! Storage is not touched here: the caller uploads before interpreting and
//! deletes the object when the result is [`Interpretation::Unsafe`] or an
//! error.

use std::sync::Arc;

use serde::Serialize;

use crate::annotation::AnnotationResult;
use crate::error::CoreError;
use crate::providers::{ImageAnnotator, ImageSource, LinkProbe, Translator};
use crate::safety::{SafetyAssessment, SafetyPolicy};
use crate::view::{self, ViewModel, ViewSettings};

/// Result of interpreting one image.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Interpretation {
    Unsafe(SafetyAssessment),
    Interpreted(ViewModel),
}

pub struct Interpreter {
    annotator: Arc<dyn ImageAnnotator>,
    translator: Arc<dyn Translator>,
    probe: Arc<dyn LinkProbe>,
    policy: SafetyPolicy,
    settings: ViewSettings,
}

impl Interpreter {
    pub fn new(
        annotator: Arc<dyn ImageAnnotator>,
        translator: Arc<dyn Translator>,
        probe: Arc<dyn LinkProbe>,
        policy: SafetyPolicy,
        settings: ViewSettings,
    ) -> Self {
        Self {
            annotator,
            translator,
            probe,
            policy,
            settings,
        }
    }

    /// Fetch web detection and safe-search data for `image`.
    ///
    /// Web-detection failures degrade to an empty result. A safe-search
    /// failure is an error: an unchecked image is never displayed.
    pub async fn annotate(&self, image: &ImageSource) -> Result<AnnotationResult, CoreError> {
        let mut result = match self.annotator.annotate(image).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(error = %e, "Web detection failed, continuing without matches");
                AnnotationResult::default()
            }
        };

        result.safety = self
            .annotator
            .safe_search(image)
            .await
            .map_err(|e| CoreError::Upstream {
                service: "safe-search",
                message: e.to_string(),
            })?;

        Ok(result)
    }

    pub async fn interpret(&self, image: &ImageSource) -> Result<Interpretation, CoreError> {
        let result = self.annotate(image).await?;
        Ok(self.interpret_result(&result).await)
    }

    /// Assess an already annotated image and, if safe, build its view.
    pub async fn interpret_result(&self, result: &AnnotationResult) -> Interpretation {
        let assessment = self.policy.assess(&result.safety);
        if !assessment.is_safe() {
            tracing::info!(tags = ?assessment.unsafe_tags, "Image flagged as unsafe");
            return Interpretation::Unsafe(assessment);
        }

        let view = view::build_view(
            result,
            &self.settings,
            self.translator.as_ref(),
            self.probe.as_ref(),
        )
        .await;

        tracing::debug!(
            labels = view.highest_matches.len(),
            translations = view.translations.len(),
            "Built view model"
        );

        Interpretation::Interpreted(view)
    }
}
