//! Gateway configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::GeminiError;

/// Environment variables consulted, in order, when no API key is
/// configured.
pub const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

/// Connection settings for the Generative Language API.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// API key; read from [`API_KEY_VARS`] when absent.
    pub api_key: Option<String>,
    /// REST root, without trailing slash.
    pub base_url: String,
    /// Model used for instruction-driven image edits.
    pub edit_model: String,
    /// Model used for free-text image analysis.
    pub analysis_model: String,
    /// Model used for text-to-image generation.
    pub generate_model: String,
    /// Whole-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_owned(),
            edit_model: "gemini-2.5-flash-image".to_owned(),
            analysis_model: "gemini-2.5-flash".to_owned(),
            generate_model: "imagen-4.0-generate-001".to_owned(),
            timeout_secs: 60,
        }
    }
}

// The key never appears in logs.
impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("edit_model", &self.edit_model)
            .field("analysis_model", &self.analysis_model)
            .field("generate_model", &self.generate_model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl GeminiConfig {
    /// Request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The configured key, or the first non-empty environment key.
    ///
    /// # Errors
    ///
    /// Returns [`GeminiError::MissingApiKey`] if neither is set.
    pub fn resolve_api_key(&self) -> Result<String, GeminiError> {
        self.resolve_api_key_with(|name| std::env::var(name).ok())
    }

    fn resolve_api_key_with(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<String, GeminiError> {
        self.api_key
            .clone()
            .into_iter()
            .chain(API_KEY_VARS.iter().filter_map(|name| lookup(name)))
            .find(|key| !key.trim().is_empty())
            .ok_or(GeminiError::MissingApiKey)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`GeminiError::InvalidConfig`] for a zero timeout, a blank
    /// model name, or a base URL that is not HTTP(S).
    pub fn validate(&self) -> Result<(), GeminiError> {
        if self.timeout_secs == 0 {
            return Err(GeminiError::InvalidConfig(
                "timeout_secs must be at least 1".into(),
            ));
        }
        for (name, value) in [
            ("edit_model", &self.edit_model),
            ("analysis_model", &self.analysis_model),
            ("generate_model", &self.generate_model),
        ] {
            if value.trim().is_empty() {
                return Err(GeminiError::InvalidConfig(format!("{name} must not be blank")));
            }
        }
        if !(self.base_url.starts_with("https://") || self.base_url.starts_with("http://")) {
            return Err(GeminiError::InvalidConfig(format!(
                "base_url must be an http(s) URL, got {:?}",
                self.base_url
            )));
        }
        Ok(())
    }

    /// Endpoint URL for `method` on `model`.
    #[must_use]
    pub fn endpoint(&self, model: &str, method: &str) -> String {
        format!(
            "{}/models/{model}:{method}",
            self.base_url.trim_end_matches('/')
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = GeminiConfig::default();
        config.validate().unwrap();
        assert_eq!(config.timeout(), Duration::from_secs(60));
        assert_eq!(
            config.endpoint("gemini-2.5-flash-image", "generateContent"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash-image:generateContent"
        );
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config: GeminiConfig =
            serde_json::from_str(r#"{"timeout_secs": 5, "base_url": "http://localhost:8080/"}"#)
                .unwrap();
        assert_eq!(config.edit_model, "gemini-2.5-flash-image");
        assert_eq!(
            config.endpoint("m", "predict"),
            "http://localhost:8080/models/m:predict"
        );
    }

    #[test]
    fn api_key_prefers_config_then_env_order() {
        let config = GeminiConfig {
            api_key: Some("from-config".into()),
            ..GeminiConfig::default()
        };
        let key = config
            .resolve_api_key_with(|_| Some("from-env".into()))
            .unwrap();
        assert_eq!(key, "from-config");

        let config = GeminiConfig::default();
        let key = config
            .resolve_api_key_with(|name| (name == "API_KEY").then(|| "fallback".to_owned()))
            .unwrap();
        assert_eq!(key, "fallback");

        assert!(matches!(
            config.resolve_api_key_with(|_| Some("  ".into())),
            Err(GeminiError::MissingApiKey)
        ));
    }

    #[test]
    fn debug_redacts_the_key() {
        let config = GeminiConfig {
            api_key: Some("secret-key".into()),
            ..GeminiConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret-key"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let zero = GeminiConfig {
            timeout_secs: 0,
            ..GeminiConfig::default()
        };
        assert!(matches!(zero.validate(), Err(GeminiError::InvalidConfig(_))));

        let bad_url = GeminiConfig {
            base_url: "ftp://example".into(),
            ..GeminiConfig::default()
        };
        assert!(matches!(
            bad_url.validate(),
            Err(GeminiError::InvalidConfig(_))
        ));
    }
}
