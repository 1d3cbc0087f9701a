//! ISO 639-1 language code to display-name mapping.

use std::collections::HashMap;

use crate::error::CoreError;
use crate::view::TargetLanguage;

/// Built-in mapping shipped with the crate.
const BUILTIN_MAP: &str = include_str!("../data/iso_639_1_codes.json");

/// Target languages used when nothing else is configured.
pub const DEFAULT_TARGET_CODES: [&str; 3] = ["fr", "es", "ar"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageMap {
    names: HashMap<String, String>,
}

impl LanguageMap {
    /// Parse a JSON object of `code -> name` pairs. Codes are lower-cased.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let raw: HashMap<String, String> = serde_json::from_str(json)
            .map_err(|e| CoreError::Validation(format!("Invalid language map: {e}")))?;

        let names = raw
            .into_iter()
            .map(|(code, name)| (code.trim().to_ascii_lowercase(), name))
            .collect();

        Ok(Self { names })
    }

    /// The map compiled into the crate. A parse failure means the embedded
    /// data is corrupt, which is an internal error.
    pub fn builtin() -> Result<Self, CoreError> {
        Self::from_json(BUILTIN_MAP)
            .map_err(|e| CoreError::Internal(format!("Built-in language map: {e}")))
    }

    pub fn name(&self, code: &str) -> Option<&str> {
        self.names
            .get(&code.trim().to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Resolve configured codes, in order, into target languages.
    ///
    /// Every code must be known; duplicates are dropped.
    pub fn resolve<S: AsRef<str>>(&self, codes: &[S]) -> Result<Vec<TargetLanguage>, CoreError> {
        let mut targets: Vec<TargetLanguage> = Vec::with_capacity(codes.len());

        for code in codes {
            let code = code.as_ref().trim().to_ascii_lowercase();
            if targets.iter().any(|t| t.code == code) {
                continue;
            }
            let name = self.name(&code).ok_or_else(|| {
                CoreError::Validation(format!("Unknown ISO 639-1 language code '{code}'"))
            })?;
            targets.push(TargetLanguage::new(code.clone(), name));
        }

        Ok(targets)
    }
}
