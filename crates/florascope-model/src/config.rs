//! Configuration for model provisioning and loading

use crate::labels::ClassLabels;
use crate::model_loader::{Architecture, DeviceType, ModelFormat};
use florascope_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Download location of the exported flower classifier
pub const DEFAULT_MODEL_URL: &str =
    "https://drive.google.com/uc?export=download&id=1C4-599sntLTKiE7gHubUBJuyEz9upRCr";

/// Directory, relative to the working directory, the artifact is cached in
pub const DEFAULT_MODEL_DIR: &str = "models";

/// File name the artifact is stored under when no path is configured
pub const DEFAULT_ARTIFACT_NAME: &str = "export.safetensors";

/// Where the model artifact comes from and where it lives on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactSpec {
    /// Remote or local origin of the artifact
    #[serde(default)]
    pub source: ArtifactSource,

    /// Local cache path for `url` sources, or the file itself for `local`
    #[serde(default = "default_artifact_path")]
    pub path: PathBuf,

    /// Expected lowercase hex SHA-256 digest of the artifact
    #[serde(default)]
    pub sha256: Option<String>,
}

impl Default for ArtifactSpec {
    fn default() -> Self {
        Self {
            source: ArtifactSource::default(),
            path: default_artifact_path(),
            sha256: None,
        }
    }
}

/// Artifact origin
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ArtifactSource {
    /// Plain HTTP(S) download, fetched once into `ArtifactSpec::path`
    Url { url: String },

    /// Hugging Face Hub file, cached by hf-hub
    HuggingFace {
        repo: String,
        #[serde(default = "default_revision")]
        revision: String,
        filename: String,
    },

    /// Already on disk at `ArtifactSpec::path`
    Local,
}

impl Default for ArtifactSource {
    fn default() -> Self {
        Self::Url {
            url: DEFAULT_MODEL_URL.to_string(),
        }
    }
}

/// Model format specification
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFormatSpec {
    /// Pick the format from the artifact's file extension
    #[default]
    Auto,
    SafeTensors,
    PyTorch,
}

impl ModelFormatSpec {
    /// Resolve to a concrete format for the given artifact path
    pub fn resolve(&self, path: &Path) -> ModelFormat {
        match self {
            ModelFormatSpec::Auto => ModelFormat::from_path(path),
            ModelFormatSpec::SafeTensors => ModelFormat::SafeTensors,
            ModelFormatSpec::PyTorch => ModelFormat::PyTorch,
        }
    }
}

/// Everything needed to provision and load the predictor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model artifact location
    #[serde(default)]
    pub artifact: ArtifactSpec,

    /// Network architecture the weights were exported from
    #[serde(default)]
    pub architecture: Architecture,

    /// Weight file format
    #[serde(default)]
    pub format: ModelFormatSpec,

    /// Device to run inference on (cpu, cuda:N, metal:N)
    #[serde(default = "default_device")]
    pub device: String,

    /// Square input resolution fed to the network
    #[serde(default = "default_image_size")]
    pub image_size: usize,

    /// Newline-separated class names; the built-in flower list when unset
    #[serde(default)]
    pub labels_path: Option<PathBuf>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            artifact: ArtifactSpec::default(),
            architecture: Architecture::default(),
            format: ModelFormatSpec::default(),
            device: default_device(),
            image_size: default_image_size(),
            labels_path: None,
        }
    }
}

impl ModelConfig {
    /// Reject settings that cannot produce a working predictor
    pub fn validate(&self) -> Result<()> {
        if self.image_size == 0 || u32::try_from(self.image_size).is_err() {
            return Err(Error::config(format!(
                "image_size must be between 1 and {}, got {}",
                u32::MAX,
                self.image_size
            )));
        }
        self.device_type()?;
        Ok(())
    }

    /// Parsed inference device
    pub fn device_type(&self) -> Result<DeviceType> {
        self.device.parse()
    }

    /// Class labels the output layer maps onto
    pub fn labels(&self) -> Result<ClassLabels> {
        match &self.labels_path {
            Some(path) => ClassLabels::from_file(path),
            None => Ok(ClassLabels::flowers()),
        }
    }

    /// Human-readable model name used in logs and `/health`
    pub fn display_name(&self) -> String {
        let stem = self
            .artifact
            .path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("model");
        format!("{}-{}", self.architecture, stem)
    }
}

fn default_artifact_path() -> PathBuf {
    Path::new(DEFAULT_MODEL_DIR).join(DEFAULT_ARTIFACT_NAME)
}

fn default_device() -> String {
    "cpu".to_string()
}

fn default_revision() -> String {
    "main".to_string()
}

fn default_image_size() -> usize {
    224
}
