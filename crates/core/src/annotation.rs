//! Request-scoped annotation data returned by the image-annotation service.
//!
//! [`AnnotationResult`] is populated once at the client boundary and is never
//! mutated by the normalizer or view builder. Safe-search likelihoods use the
//! vendor's ordinal scale, see [`Likelihood`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// One web-entity label with the service's confidence score in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub label: String,
    pub confidence: f32,
}

impl Classification {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }
}

/// Everything the annotation service reported for a single image.
///
/// Sequences keep the order the service returned them in, which is assumed
/// to be best-first. Any of them may be empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationResult {
    pub relevant_pages: Vec<String>,
    pub full_matches: Vec<String>,
    pub partial_matches: Vec<String>,
    pub classifications: Vec<Classification>,
    pub safety: SafetyVector,
}

// ---------------------------------------------------------------------------
// Likelihood scale
// ---------------------------------------------------------------------------

/// Vendor likelihood bucket for a safe-search category.
///
/// | ordinal | variant        |
/// |---------|----------------|
/// | 0       | `Unknown`      |
/// | 1       | `VeryUnlikely` |
/// | 2       | `Unlikely`     |
/// | 3       | `Possible`     |
/// | 4       | `Likely`       |
/// | 5       | `VeryLikely`   |
///
/// Safety thresholds are compared against [`Likelihood::ordinal`], never
/// against a probability.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Likelihood {
    #[default]
    Unknown,
    VeryUnlikely,
    Unlikely,
    Possible,
    Likely,
    VeryLikely,
}

/// Highest ordinal on the likelihood scale.
pub const MAX_LIKELIHOOD_ORDINAL: u8 = 5;

impl Likelihood {
    pub fn ordinal(self) -> u8 {
        match self {
            Self::Unknown => 0,
            Self::VeryUnlikely => 1,
            Self::Unlikely => 2,
            Self::Possible => 3,
            Self::Likely => 4,
            Self::VeryLikely => 5,
        }
    }

    pub fn from_ordinal(ordinal: u8) -> Option<Self> {
        match ordinal {
            0 => Some(Self::Unknown),
            1 => Some(Self::VeryUnlikely),
            2 => Some(Self::Unlikely),
            3 => Some(Self::Possible),
            4 => Some(Self::Likely),
            5 => Some(Self::VeryLikely),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Safety categories
// ---------------------------------------------------------------------------

/// Safe-search categories reported by the annotation service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SafetyCategory {
    Adult,
    Spoof,
    Medical,
    Violence,
    Racy,
}

impl SafetyCategory {
    pub const ALL: [SafetyCategory; 5] = [
        Self::Adult,
        Self::Spoof,
        Self::Medical,
        Self::Violence,
        Self::Racy,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Adult => "adult",
            Self::Spoof => "spoof",
            Self::Medical => "medical",
            Self::Violence => "violence",
            Self::Racy => "racy",
        }
    }
}

impl fmt::Display for SafetyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SafetyCategory {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "adult" => Ok(Self::Adult),
            "spoof" | "spoofed" => Ok(Self::Spoof),
            "medical" => Ok(Self::Medical),
            "violence" => Ok(Self::Violence),
            "racy" => Ok(Self::Racy),
            other => Err(CoreError::Validation(format!(
                "Unknown safety category '{other}'. \
                 Must be one of: adult, spoof, medical, violence, racy"
            ))),
        }
    }
}

/// Per-category likelihood that an image is unsafe.
///
/// Categories the service did not report read as [`Likelihood::Unknown`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyVector {
    pub adult: Likelihood,
    pub spoof: Likelihood,
    pub medical: Likelihood,
    pub violence: Likelihood,
    pub racy: Likelihood,
}

impl SafetyVector {
    pub fn get(&self, category: SafetyCategory) -> Likelihood {
        match category {
            SafetyCategory::Adult => self.adult,
            SafetyCategory::Spoof => self.spoof,
            SafetyCategory::Medical => self.medical,
            SafetyCategory::Violence => self.violence,
            SafetyCategory::Racy => self.racy,
        }
    }

    /// Builder-style setter, mostly for tests and fakes.
    pub fn with(mut self, category: SafetyCategory, likelihood: Likelihood) -> Self {
        match category {
            SafetyCategory::Adult => self.adult = likelihood,
            SafetyCategory::Spoof => self.spoof = likelihood,
            SafetyCategory::Medical => self.medical = likelihood,
            SafetyCategory::Violence => self.violence = likelihood,
            SafetyCategory::Racy => self.racy = likelihood,
        }
        self
    }
}
