use std::fmt;
use std::str::FromStr;

use tracing::warn;

use crate::config::Config;
use crate::error::{ChatError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendMode {
    Local,
    Hosted,
}

impl BackendMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendMode::Local => "local",
            BackendMode::Hosted => "hosted",
        }
    }

    pub fn all() -> Vec<BackendMode> {
        vec![BackendMode::Hosted, BackendMode::Local]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            BackendMode::Local => "Ollama (local)",
            BackendMode::Hosted => "Passerelle hébergée",
        }
    }
}

impl fmt::Display for BackendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" | "ollama" => Ok(BackendMode::Local),
            "hosted" | "gateway" => Ok(BackendMode::Hosted),
            other => Err(format!("unknown backend mode '{other}' (expected local or hosted)")),
        }
    }
}

/// Which backend is targeted and with which parameters.
///
/// `model_id` always belongs to the active mode's model list once that list
/// is non-empty. The local list starts empty, and until the catalog fetch
/// lands the id is the configured placeholder.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    mode: BackendMode,
    server_address: String,
    model_id: String,
    local_placeholder: String,
    available_local_models: Vec<String>,
    available_hosted_models: Vec<String>,
}

impl BackendConfig {
    pub fn new(
        mode: BackendMode,
        server_address: &str,
        local_placeholder: &str,
        hosted_models: Vec<String>,
    ) -> Self {
        let mut config = Self {
            mode,
            server_address: normalize_address(server_address),
            model_id: local_placeholder.to_string(),
            local_placeholder: local_placeholder.to_string(),
            available_local_models: Vec::new(),
            available_hosted_models: hosted_models,
        };
        config.reconcile_model();
        config
    }

    pub fn from_config(config: &Config) -> Self {
        let mut backend = Self::new(
            config.mode,
            &config.server_address,
            &config.local_model,
            config.hosted_models.clone(),
        );
        if backend.mode == BackendMode::Hosted {
            if let Some(model) = &config.hosted_model {
                // A stale default in the config file falls back to the first entry
                if let Err(e) = backend.set_model_id(model) {
                    warn!(error = %e, "ignoring hosted_model from config");
                }
            }
        }
        backend
    }

    pub fn mode(&self) -> BackendMode {
        self.mode
    }

    pub fn server_address(&self) -> &str {
        &self.server_address
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn available_local_models(&self) -> &[String] {
        &self.available_local_models
    }

    pub fn models_for_mode(&self, mode: BackendMode) -> &[String] {
        match mode {
            BackendMode::Local => &self.available_local_models,
            BackendMode::Hosted => &self.available_hosted_models,
        }
    }

    /// Models the picker offers right now
    pub fn active_models(&self) -> &[String] {
        self.models_for_mode(self.mode)
    }

    /// Returns true when the mode actually changed
    pub fn set_mode(&mut self, mode: BackendMode) -> bool {
        if self.mode == mode {
            return false;
        }
        self.mode = mode;
        self.reconcile_model();
        true
    }

    pub fn set_server_address(&mut self, addr: &str) -> Result<()> {
        if self.mode != BackendMode::Local {
            return Err(ChatError::NotLocalMode);
        }
        let addr = normalize_address(addr);
        if addr.is_empty() {
            return Err(ChatError::EmptyServerAddress);
        }
        self.server_address = addr;
        Ok(())
    }

    pub fn set_model_id(&mut self, id: &str) -> Result<()> {
        let offered = self.active_models();
        if !offered.is_empty() && !offered.iter().any(|m| m == id) {
            return Err(ChatError::UnknownModel {
                model: id.to_string(),
                mode: self.mode,
            });
        }
        self.model_id = id.to_string();
        Ok(())
    }

    /// Installs a freshly fetched local catalog
    pub fn replace_local_models(&mut self, models: Vec<String>) {
        self.available_local_models = models;
        if self.mode == BackendMode::Local {
            self.reconcile_model();
        }
    }

    fn reconcile_model(&mut self) {
        let offered = self.models_for_mode(self.mode);
        if offered.iter().any(|m| *m == self.model_id) {
            return;
        }
        self.model_id = match offered.first() {
            Some(first) => first.clone(),
            None => self.local_placeholder.clone(),
        };
    }
}

fn normalize_address(addr: &str) -> String {
    let addr = addr.trim();
    addr.strip_suffix('/').unwrap_or(addr).to_string()
}
