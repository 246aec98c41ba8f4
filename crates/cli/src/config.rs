//! Configuration loading from mentor.toml.

use relay::{Credential, DEFAULT_MODELS, DEFAULT_USER_KEY_MIN_LEN, GenerationConfig, Messages, Policy};
use serde::Deserialize;
use std::path::Path;

/// Top-level configuration. Every section is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: ProviderConfig,
    pub models: ModelsConfig,
    pub credentials: CredentialsConfig,
    pub generation: GenerationConfig,
    pub prompt: PromptConfig,
    /// Failure messages shown to the user.
    pub messages: Messages,
}

/// Provider endpoint configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Override the API host (e.g. a proxy).
    pub base_url: Option<String>,
}

/// Models to try, in priority order.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    pub order: Vec<String>,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            order: DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
        }
    }
}

/// Credential policy.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    /// Shared keys used when the user has not stored one.
    pub fallback: Vec<String>,
    /// A stored key must be longer than this to count as the user's own.
    pub user_key_min_len: usize,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            fallback: Vec::new(),
            user_key_min_len: DEFAULT_USER_KEY_MIN_LEN,
        }
    }
}

/// Prompt configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// Replaces the built-in system instruction.
    pub system_instruction: Option<String>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.models.order.is_empty() {
            return Err(ConfigError::NoModels);
        }
        Ok(())
    }

    /// Replace the fallback keys with a comma-separated list, if one is given.
    pub fn with_fallback_override(mut self, keys: Option<&str>) -> Self {
        if let Some(keys) = keys {
            self.credentials.fallback = keys
                .split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string)
                .collect();
        }
        self
    }

    /// Build the orchestrator policy.
    pub fn policy(&self) -> Policy {
        let defaults = Policy::default();
        Policy {
            models: self.models.order.clone(),
            fallback_credentials: self
                .credentials
                .fallback
                .iter()
                .map(|k| Credential::new(k.as_str()))
                .collect(),
            user_key_min_len: self.credentials.user_key_min_len,
            generation: self.generation,
            system_instruction: self
                .prompt
                .system_instruction
                .clone()
                .unwrap_or(defaults.system_instruction),
            messages: self.messages.clone(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("no models configured: set models.order to at least one model")]
    NoModels,
}
