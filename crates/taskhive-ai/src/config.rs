//! Drafting backend configuration.

use taskhive_core::{Error, Result};

/// Default generative endpoint base URL.
pub const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default generation model.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Default request timeout (seconds).
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Configuration for the hosted generation backend. Built explicitly or from
/// environment variables and injected into the backend, never read globally.
#[derive(Debug, Clone)]
pub struct DraftingConfig {
    /// API base URL, without a trailing slash.
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl DraftingConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Read configuration from environment variables.
    ///
    /// `GEMINI_API_KEY` is required; `TASKHIVE_AI_URL`, `TASKHIVE_AI_MODEL`,
    /// and `TASKHIVE_AI_TIMEOUT_SECS` override the defaults.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| Error::Config("GEMINI_API_KEY is not set".to_string()))?;

        let base_url =
            std::env::var("TASKHIVE_AI_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let model =
            std::env::var("TASKHIVE_AI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let timeout_secs = std::env::var("TASKHIVE_AI_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let config = Self {
            base_url,
            api_key,
            model,
            timeout_secs,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(Error::Config("API key cannot be empty".to_string()));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(Error::Config(format!(
                "API base URL must start with http:// or https://, got: {}",
                self.base_url
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_blank_key() {
        let config = DraftingConfig::new("  ");
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_bare_host() {
        let mut config = DraftingConfig::new("k");
        config.base_url = "generativelanguage.googleapis.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_defaults() {
        let config = DraftingConfig::new("k");
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert!(config.validate().is_ok());
    }
}
