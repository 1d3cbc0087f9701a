use std::path::PathBuf;
use std::str::FromStr;

use axum::http::HeaderValue;
use interpret_core::annotation::SafetyCategory;
use interpret_core::error::CoreError;
use interpret_core::languages::{LanguageMap, DEFAULT_TARGET_CODES};
use interpret_core::normalizer::DEFAULT_WIKIPEDIA_ENDPOINT;
use interpret_core::safety::{SafetyPolicy, DEFAULT_MONITORED, DEFAULT_THRESHOLD};
use interpret_core::upload::DEFAULT_ALLOWED_EXTENSIONS;
use interpret_core::view::{ViewSettings, DEFAULT_TOP_LABEL_COUNT};

/// Errors raised while loading configuration at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} is invalid: {message}")]
    Invalid { var: &'static str, message: String },

    #[error("Failed to read language map {}: {message}", path.display())]
    LanguageMap { path: PathBuf, message: String },

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Log output format selected by `LOG_FORMAT`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("expected 'text' or 'json', got '{other}'")),
        }
    }
}

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development. Cloud
/// credentials are loaded separately by
/// [`interpret_cloud::CloudConfig::from_env`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `60`).
    pub request_timeout_secs: u64,
    /// Largest accepted request body in bytes (default: 20 MiB).
    pub max_upload_bytes: usize,
    pub log_format: LogFormat,
    /// Interpretation policy: upload rules, safety and view settings.
    pub interpret: InterpretConfig,
}

/// Validated interpretation settings.
#[derive(Debug, Clone)]
pub struct InterpretConfig {
    /// Lower-cased extensions without a leading dot.
    pub allowed_extensions: Vec<String>,
    pub policy: SafetyPolicy,
    pub view: ViewSettings,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                            | Default                            |
    /// |------------------------------------|------------------------------------|
    /// | `HOST`                             | `0.0.0.0`                          |
    /// | `PORT`                             | `3000`                             |
    /// | `CORS_ORIGINS`                     | `http://localhost:5173`            |
    /// | `REQUEST_TIMEOUT_SECS`             | `60`                               |
    /// | `MAX_UPLOAD_BYTES`                 | `20971520`                         |
    /// | `LOG_FORMAT`                       | `text`                             |
    /// | `ALLOWED_EXTENSIONS`               | `png,jpg,jpeg,gif`                 |
    /// | `UNSAFE_IMG_TAGS`                  | `adult,violence,racy`              |
    /// | `UNSAFE_IMG_PROBABILITY_THRESHOLD` | `4`                                |
    /// | `TRANSLATE_TO_LANG`                | `fr,es,ar`                         |
    /// | `TOP_LABEL_COUNT`                  | `2`                                |
    /// | `WIKIPEDIA_ENDPOINT`               | `https://en.wikipedia.org/wiki/{}` |
    /// | `LANGUAGE_MAP_PATH`                | built-in ISO 639-1 map             |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let host = get("HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = parse_var("PORT", get("PORT"), 3000)?;

        let cors_origins =
            split_list(&get("CORS_ORIGINS").unwrap_or_else(|| "http://localhost:5173".into()));
        for origin in &cors_origins {
            HeaderValue::from_str(origin).map_err(|e| ConfigError::Invalid {
                var: "CORS_ORIGINS",
                message: format!("'{origin}': {e}"),
            })?;
        }

        let request_timeout_secs: u64 =
            parse_var("REQUEST_TIMEOUT_SECS", get("REQUEST_TIMEOUT_SECS"), 60)?;
        let max_upload_bytes: usize =
            parse_var("MAX_UPLOAD_BYTES", get("MAX_UPLOAD_BYTES"), 20 * 1024 * 1024)?;
        let log_format: LogFormat = parse_var("LOG_FORMAT", get("LOG_FORMAT"), LogFormat::Text)?;

        let interpret = InterpretConfig::from_lookup(&get)?;

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            max_upload_bytes,
            log_format,
            interpret,
        })
    }
}

impl InterpretConfig {
    fn from_lookup(get: &dyn Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let allowed_extensions: Vec<String> = match get("ALLOWED_EXTENSIONS") {
            Some(raw) => split_list(&raw)
                .into_iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
            None => DEFAULT_ALLOWED_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        };
        if allowed_extensions.is_empty() {
            return Err(ConfigError::Invalid {
                var: "ALLOWED_EXTENSIONS",
                message: "at least one extension is required".into(),
            });
        }

        let monitored = match get("UNSAFE_IMG_TAGS") {
            Some(raw) => split_list(&raw)
                .iter()
                .map(|tag| tag.parse::<SafetyCategory>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| ConfigError::Invalid {
                    var: "UNSAFE_IMG_TAGS",
                    message: e.to_string(),
                })?,
            None => DEFAULT_MONITORED.to_vec(),
        };
        let threshold: u8 = parse_var(
            "UNSAFE_IMG_PROBABILITY_THRESHOLD",
            get("UNSAFE_IMG_PROBABILITY_THRESHOLD"),
            DEFAULT_THRESHOLD,
        )?;
        let policy = SafetyPolicy::new(monitored, threshold)?;

        let language_map = match get("LANGUAGE_MAP_PATH") {
            Some(path) => load_language_map(PathBuf::from(path))?,
            None => LanguageMap::builtin()?,
        };
        let codes = match get("TRANSLATE_TO_LANG") {
            Some(raw) => split_list(&raw),
            None => DEFAULT_TARGET_CODES.iter().map(|c| c.to_string()).collect(),
        };
        let languages = language_map.resolve(&codes)?;

        let top_label_count: usize =
            parse_var("TOP_LABEL_COUNT", get("TOP_LABEL_COUNT"), DEFAULT_TOP_LABEL_COUNT)?;
        let template =
            get("WIKIPEDIA_ENDPOINT").unwrap_or_else(|| DEFAULT_WIKIPEDIA_ENDPOINT.into());
        let view = ViewSettings::new(top_label_count, languages, template)?;

        Ok(Self {
            allowed_extensions,
            policy,
            view,
        })
    }
}

fn load_language_map(path: PathBuf) -> Result<LanguageMap, ConfigError> {
    let json = std::fs::read_to_string(&path).map_err(|e| ConfigError::LanguageMap {
        path: path.clone(),
        message: e.to_string(),
    })?;
    Ok(LanguageMap::from_json(&json)?)
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_var<T>(var: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            message: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;

    use super::*;

    fn config(pairs: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.cors_origins, vec!["http://localhost:5173"]);
        assert_eq!(config.request_timeout_secs, 60);
        assert_eq!(config.max_upload_bytes, 20_971_520);
        assert_eq!(config.log_format, LogFormat::Text);

        let interpret = &config.interpret;
        assert_eq!(interpret.allowed_extensions, vec!["png", "jpg", "jpeg", "gif"]);
        assert_eq!(interpret.policy.threshold(), 4);
        assert_eq!(
            interpret.policy.monitored(),
            &[SafetyCategory::Adult, SafetyCategory::Violence, SafetyCategory::Racy]
        );
        assert_eq!(interpret.view.top_label_count(), 2);
        let codes: Vec<_> = interpret.view.languages().iter().map(|l| l.code.as_str()).collect();
        assert_eq!(codes, vec!["fr", "es", "ar"]);
    }

    #[test]
    fn lists_are_trimmed_and_normalised() {
        let config = config(&[
            ("ALLOWED_EXTENSIONS", " .PNG, webp ,,"),
            ("UNSAFE_IMG_TAGS", "racy, spoof"),
            ("TRANSLATE_TO_LANG", "de"),
            ("CORS_ORIGINS", "http://a.test, http://b.test"),
        ])
        .unwrap();
        assert_eq!(config.interpret.allowed_extensions, vec!["png", "webp"]);
        assert_eq!(
            config.interpret.policy.monitored(),
            &[SafetyCategory::Racy, SafetyCategory::Spoof]
        );
        assert_eq!(config.interpret.view.languages()[0].name, "German");
        assert_eq!(config.cors_origins, vec!["http://a.test", "http://b.test"]);
    }

    #[test]
    fn repeated_safety_tags_are_deduplicated() {
        let config = config(&[("UNSAFE_IMG_TAGS", "adult,adult, ADULT ,racy")]).unwrap();
        assert_eq!(
            config.interpret.policy.monitored(),
            &[SafetyCategory::Adult, SafetyCategory::Racy]
        );
    }

    #[test]
    fn invalid_port_is_rejected() {
        assert_matches!(config(&[("PORT", "http")]), Err(ConfigError::Invalid { var: "PORT", .. }));
    }

    #[test]
    fn threshold_off_the_scale_is_rejected() {
        assert_matches!(
            config(&[("UNSAFE_IMG_PROBABILITY_THRESHOLD", "9")]),
            Err(ConfigError::Core(CoreError::Validation(_)))
        );
    }

    #[test]
    fn unknown_safety_tag_is_rejected() {
        assert_matches!(
            config(&[("UNSAFE_IMG_TAGS", "adult,gory")]),
            Err(ConfigError::Invalid { var: "UNSAFE_IMG_TAGS", .. })
        );
    }

    #[test]
    fn unknown_language_is_rejected() {
        assert_matches!(
            config(&[("TRANSLATE_TO_LANG", "fr,zz")]),
            Err(ConfigError::Core(CoreError::Validation(_)))
        );
    }

    #[test]
    fn template_without_slot_is_rejected() {
        assert_matches!(
            config(&[("WIKIPEDIA_ENDPOINT", "https://en.wikipedia.org/wiki/")]),
            Err(ConfigError::Core(CoreError::Validation(_)))
        );
    }

    #[test]
    fn missing_language_map_file_is_reported() {
        assert_matches!(
            config(&[("LANGUAGE_MAP_PATH", "/nonexistent/codes.json")]),
            Err(ConfigError::LanguageMap { .. })
        );
    }

    #[test]
    fn log_format_parses() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("yaml".parse::<LogFormat>().is_err());
    }
}
