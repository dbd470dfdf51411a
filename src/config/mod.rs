mod types;

pub use types::*;

use crate::{Error, Result};
use std::{
    env,
    path::{Path, PathBuf},
};
use tracing::debug;

const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Loads the YAML config named by `CONFIG_PATH` (or `config.yaml` when present),
/// applies environment overrides and validates the result.
pub async fn load() -> Result<Config> {
    let explicit_path = env::var("CONFIG_PATH").ok();
    let source = match explicit_path {
        Some(path) => Some(PathBuf::from(path)),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => Some(PathBuf::from(DEFAULT_CONFIG_PATH)),
        None => {
            debug!("No {} found, using built-in defaults", DEFAULT_CONFIG_PATH);
            None
        }
    };

    load_from(source.as_deref(), |key| env::var(key).ok()).await
}

pub async fn load_from<F>(path: Option<&Path>, lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => {
            debug!("Loading configuration from: {}", path.display());
            let config_str = tokio::fs::read_to_string(path).await?;
            Config::from_yaml_str(&config_str)?
        }
        None => Config::default(),
    };

    config.apply_env_overrides(lookup);
    config.validate()?;

    Ok(config)
}

impl Config {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        // An empty file deserializes to unit, not to an empty mapping.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Overrides file values with environment variables, read through `lookup`.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("CLASSIFIER_BASE_URL") {
            self.classifier.base_url = url;
        }
        if let Some(key) = lookup("GROQ_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Some(url) = lookup("LLM_BASE_URL") {
            self.llm.base_url = url;
        }
        if let Some(model) = lookup("LLM_MODEL") {
            self.llm.model = model;
        }
        if let Some(host) = lookup("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("SERVER_PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self.llm.api_key.as_deref() {
            Some(key) if !key.trim().is_empty() => {}
            _ => {
                return Err(Error::config(
                    "LLM API key is not set (llm.api_key or GROQ_API_KEY)",
                ));
            }
        }
        if self.classifier.base_url.trim().is_empty() {
            return Err(Error::config("classifier.base_url must not be empty"));
        }
        if self.llm.base_url.trim().is_empty() {
            return Err(Error::config("llm.base_url must not be empty"));
        }
        if self.classifier.timeout_secs == 0 {
            return Err(Error::config("classifier.timeout_secs must be positive"));
        }
        if self.relay.first_fragment_timeout_secs == 0 || self.relay.idle_timeout_secs == 0 {
            return Err(Error::config("relay timeouts must be positive"));
        }
        if self.relay.channel_capacity == 0 {
            return Err(Error::config("relay.channel_capacity must be positive"));
        }
        if self.relay.max_concurrent_streams == Some(0) {
            return Err(Error::config(
                "relay.max_concurrent_streams must be positive when set",
            ));
        }
        Ok(())
    }
}
