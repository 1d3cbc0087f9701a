//! Content-safety policy applied to the safe-search vector.

use serde::Serialize;

use crate::annotation::{SafetyCategory, SafetyVector, MAX_LIKELIHOOD_ORDINAL};
use crate::error::CoreError;
use crate::normalizer;

/// Categories monitored when nothing else is configured.
pub const DEFAULT_MONITORED: [SafetyCategory; 3] = [
    SafetyCategory::Adult,
    SafetyCategory::Violence,
    SafetyCategory::Racy,
];

/// Default threshold: `LIKELY` on the vendor likelihood scale.
pub const DEFAULT_THRESHOLD: u8 = 4;

/// Which categories to watch and at what likelihood ordinal to flag them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafetyPolicy {
    monitored: Vec<SafetyCategory>,
    threshold: u8,
}

impl SafetyPolicy {
    /// Build a policy, rejecting thresholds outside the likelihood scale.
    ///
    /// A threshold of `0` would flag every monitored category regardless of
    /// the image, so it is rejected as well. Repeated categories keep their
    /// first position.
    pub fn new(monitored: Vec<SafetyCategory>, threshold: u8) -> Result<Self, CoreError> {
        if threshold == 0 || threshold > MAX_LIKELIHOOD_ORDINAL {
            return Err(CoreError::Validation(format!(
                "Safety threshold must be between 1 and {MAX_LIKELIHOOD_ORDINAL}, got {threshold}"
            )));
        }

        let mut unique: Vec<SafetyCategory> = Vec::with_capacity(monitored.len());
        for category in monitored {
            if !unique.contains(&category) {
                unique.push(category);
            }
        }

        Ok(Self {
            monitored: unique,
            threshold,
        })
    }

    pub fn monitored(&self) -> &[SafetyCategory] {
        &self.monitored
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    pub fn assess(&self, safety: &SafetyVector) -> SafetyAssessment {
        SafetyAssessment {
            unsafe_tags: normalizer::unsafe_tags(safety, &self.monitored, self.threshold),
        }
    }
}

impl Default for SafetyPolicy {
    fn default() -> Self {
        Self {
            monitored: DEFAULT_MONITORED.to_vec(),
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

/// Outcome of applying a [`SafetyPolicy`] to one image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SafetyAssessment {
    pub unsafe_tags: Vec<SafetyCategory>,
}

impl SafetyAssessment {
    pub fn is_safe(&self) -> bool {
        self.unsafe_tags.is_empty()
    }
}
