use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result, anyhow};

use crate::backend::BackendMode;

pub const DEFAULT_SERVER_ADDRESS: &str = "http://localhost:11434";
pub const DEFAULT_LOCAL_MODEL: &str = "proutgpt:latest";
pub const DEFAULT_HOSTED_ENDPOINT: &str = "https://api.proutgpt.com/api/hosted/generate";
pub const DEFAULT_VISITOR_COUNTER_URL: &str = "https://abacus.jasoncameron.dev/hit/proutgpt/visits";

/// Startup defaults. Read once, never written back: whatever the user
/// changes during a session is gone on the next launch.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    #[serde(with = "mode_serde")]
    pub mode: BackendMode,
    pub server_address: String,
    pub local_model: String,
    pub hosted_model: Option<String>,
    pub hosted_models: Vec<String>,
    pub hosted_endpoint: String,
    pub visitor_counter_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mode: BackendMode::Hosted,
            server_address: DEFAULT_SERVER_ADDRESS.to_string(),
            local_model: DEFAULT_LOCAL_MODEL.to_string(),
            hosted_model: None,
            hosted_models: vec![
                "meta-llama/llama-3.2-3b-instruct".to_string(),
                "mistralai/mistral-7b-instruct".to_string(),
                "google/gemma-2-9b-it".to_string(),
            ],
            hosted_endpoint: DEFAULT_HOSTED_ENDPOINT.to_string(),
            visitor_counter_url: DEFAULT_VISITOR_COUNTER_URL.to_string(),
        }
    }
}

impl Config {
    /// Loads the config from the default location, or defaults if there is none
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Config = serde_json::from_str(&config_content)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(config)
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("proutgpt").join("config.json"))
    }
}

mod mode_serde {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::backend::BackendMode;

    pub fn serialize<S: Serializer>(mode: &BackendMode, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(mode.as_str())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<BackendMode, D::Error> {
        let raw = String::deserialize(d)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
