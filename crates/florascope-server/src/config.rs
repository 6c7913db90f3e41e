//! Server configuration

use crate::app::DEFAULT_MAX_UPLOAD_BYTES;
use crate::cli::ModelArgs;
use florascope_model::{ArtifactSource, ModelConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_host")]
    pub host: String,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Largest accepted request body
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    /// Model provisioning and loading
    #[serde(default)]
    pub model: ModelConfig,
}

impl ServerConfig {
    /// Load configuration from file, or use defaults when the file is absent
    pub fn load(config_path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            tracing::debug!("No config file at {}, using defaults", config_path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(config_path)?;
        let config = serde_yaml::from_str(&content)?;
        tracing::info!("Loaded configuration from {}", config_path.display());
        Ok(config)
    }

    /// Apply CLI overrides
    pub fn apply_overrides(&mut self, host: Option<String>, port: Option<u16>, model: &ModelArgs) {
        if let Some(host) = host {
            self.host = host;
        }

        if let Some(port) = port {
            self.port = port;
        }

        if let Some(url) = &model.model_url {
            self.model.artifact.source = ArtifactSource::Url { url: url.clone() };
        }

        if let Some(path) = &model.model_path {
            self.model.artifact.path = path.clone();
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
            model: ModelConfig::default(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5042
}

fn default_max_upload_bytes() -> usize {
    DEFAULT_MAX_UPLOAD_BYTES
}
