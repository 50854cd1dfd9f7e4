//! Oracle configuration.

use std::time::Duration;

use fragments_core::error::DomainError;

/// Default API root of the generative-language service.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default model name.
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

/// Default bound on a single oracle request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const DEFAULT_SYSTEM_INSTRUCTION: &str = "\
You are the narrative engine for a text-manipulation game. The player shapes a \
protagonist's fate by reordering her fragmented thoughts.

RULES:
1. Interpret the emotional and logical coherence of the ordered fragments.
2. The order fundamentally alters the meaning.
3. Update every vital track based on the emotional trajectory.
4. Generate the next set of 4-6 text fragments.
5. Designate 1 or 2 fragments as \"is_fixed\": true. These are anchors of her \
psyche that she cannot currently move.
6. Anchors should be the longer, more descriptive or more overwhelming thoughts.
7. Vary the fragment lengths for a poetic rhythm.
8. Return output strictly as JSON.";

const DEFAULT_ENDING_INSTRUCTION: &str = "You are a poetic narrator finishing a romantic story.";

/// Connection and prompt settings for [`crate::GenerativeOracle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleConfig {
    /// API root, without a trailing slash.
    pub base_url: String,
    /// API key sent as the `key` query parameter.
    pub api_key: String,
    /// Model name.
    pub model: String,
    /// Bound on each request.
    pub timeout: Duration,
    /// System instruction for turn requests.
    pub system_instruction: String,
    /// System instruction for ending requests.
    pub ending_instruction: String,
}

impl OracleConfig {
    /// Creates a configuration with default endpoint, model and prompts.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_owned(),
            timeout: DEFAULT_TIMEOUT,
            system_instruction: DEFAULT_SYSTEM_INSTRUCTION.to_owned(),
            ending_instruction: DEFAULT_ENDING_INSTRUCTION.to_owned(),
        }
    }

    /// Points the configuration at a different API root.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        self.base_url = base_url;
        self
    }

    /// Reads `ORACLE_API_KEY`, `ORACLE_BASE_URL`, `ORACLE_MODEL` and
    /// `ORACLE_TIMEOUT_SECS`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if `ORACLE_API_KEY` is unset or
    /// `ORACLE_TIMEOUT_SECS` is not a positive integer.
    pub fn from_env() -> Result<Self, DomainError> {
        let api_key = std::env::var("ORACLE_API_KEY").map_err(|_| {
            DomainError::Validation("ORACLE_API_KEY environment variable must be set".to_owned())
        })?;
        let mut config = Self::new(api_key);
        if let Ok(base_url) = std::env::var("ORACLE_BASE_URL") {
            config = config.with_base_url(base_url);
        }
        if let Ok(model) = std::env::var("ORACLE_MODEL") {
            config.model = model;
        }
        if let Ok(secs) = std::env::var("ORACLE_TIMEOUT_SECS") {
            config.timeout = parse_timeout(&secs)?;
        }
        Ok(config)
    }
}

fn parse_timeout(secs: &str) -> Result<Duration, DomainError> {
    match secs.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(DomainError::Validation(format!(
            "ORACLE_TIMEOUT_SECS must be a positive integer, got {secs:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_defaults() {
        let config = OracleConfig::new("secret");

        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert!(config.system_instruction.contains("is_fixed"));
    }

    #[test]
    fn test_with_base_url_trims_trailing_slashes() {
        let config = OracleConfig::new("secret").with_base_url("http://localhost:8080//");

        assert_eq!(config.base_url, "http://localhost:8080");
    }

    #[test]
    fn test_parse_timeout_rejects_zero_and_garbage() {
        assert_eq!(parse_timeout(" 12 ").unwrap(), Duration::from_secs(12));
        assert!(matches!(parse_timeout("0"), Err(DomainError::Validation(_))));
        assert!(matches!(parse_timeout("soon"), Err(DomainError::Validation(_))));
    }
}
