//! Weight loading and network construction for Candle image classifiers

use candle_core::{DType, Device};
use candle_nn::{Func, VarBuilder};
use candle_transformers::models::resnet;
use florascope_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Device type for inference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceType {
    /// CPU inference (always available)
    Cpu,
    /// CUDA GPU inference (if available)
    Cuda(usize), // GPU index
    /// Metal (Apple Silicon)
    Metal(usize),
}

impl DeviceType {
    /// Create the Candle device
    pub fn create(self) -> Result<Device> {
        match self {
            DeviceType::Cpu => Ok(Device::Cpu),
            DeviceType::Cuda(idx) => Device::new_cuda(idx)
                .map_err(|e| Error::config(format!("Failed to create CUDA device {}: {}", idx, e))),
            DeviceType::Metal(idx) => Device::new_metal(idx)
                .map_err(|e| Error::config(format!("Failed to create Metal device {}: {}", idx, e))),
        }
    }
}

impl FromStr for DeviceType {
    type Err = Error;

    /// Parse `cpu`, `cuda`, `cuda:N`, `metal`, `metal:N` (or `mps`)
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().to_ascii_lowercase();
        let (kind, index) = match s.split_once(':') {
            Some((kind, index)) => {
                let index = index.parse::<usize>().map_err(|_| {
                    Error::config(format!("Invalid device index in '{}'", s))
                })?;
                (kind, Some(index))
            }
            None => (s.as_str(), None),
        };

        match (kind, index) {
            ("cpu", None) => Ok(DeviceType::Cpu),
            ("cuda", index) => Ok(DeviceType::Cuda(index.unwrap_or(0))),
            ("metal" | "mps", index) => Ok(DeviceType::Metal(index.unwrap_or(0))),
            _ => Err(Error::config(format!(
                "Unknown device '{}', expected cpu, cuda:N or metal:N",
                s
            ))),
        }
    }
}

/// Model file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    /// SafeTensors format (recommended)
    SafeTensors,
    /// PyTorch state dict
    PyTorch,
}

impl ModelFormat {
    /// Guess the format from the file extension, defaulting to SafeTensors
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|s| s.to_str()) {
            Some("pt") | Some("pth") | Some("bin") => ModelFormat::PyTorch,
            _ => ModelFormat::SafeTensors,
        }
    }
}

impl fmt::Display for ModelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelFormat::SafeTensors => write!(f, "safetensors"),
            ModelFormat::PyTorch => write!(f, "pytorch"),
        }
    }
}

/// Supported classification backbones
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    Resnet18,
    #[default]
    Resnet34,
    Resnet50,
}

impl Architecture {
    /// Build the network, pulling every weight out of `vb`
    pub fn build(self, num_classes: usize, vb: VarBuilder<'static>) -> candle_core::Result<Func<'static>> {
        match self {
            Architecture::Resnet18 => resnet::resnet18(num_classes, vb),
            Architecture::Resnet34 => resnet::resnet34(num_classes, vb),
            Architecture::Resnet50 => resnet::resnet50(num_classes, vb),
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Architecture::Resnet18 => write!(f, "resnet18"),
            Architecture::Resnet34 => write!(f, "resnet34"),
            Architecture::Resnet50 => write!(f, "resnet50"),
        }
    }
}

/// Read weights from disk into a VarBuilder.
///
/// Failing here means the file itself could not be deserialized, which is an
/// artifact problem rather than an architecture mismatch.
pub fn load_weights(path: &Path, format: ModelFormat, device: &Device) -> Result<VarBuilder<'static>> {
    if !path.exists() {
        return Err(Error::config(format!("Model file not found: {}", path.display())));
    }

    match format {
        ModelFormat::SafeTensors => {
            let tensors = candle_core::safetensors::load(path, device).map_err(|e| {
                Error::artifact(format!(
                    "Failed to load SafeTensors from {}: {}",
                    path.display(),
                    e
                ))
            })?;
            Ok(VarBuilder::from_tensors(tensors, DType::F32, device))
        }
        ModelFormat::PyTorch => VarBuilder::from_pth(path, DType::F32, device).map_err(|e| {
            Error::artifact(format!(
                "Failed to load PyTorch weights from {}: {}",
                path.display(),
                e
            ))
        }),
    }
}

/// Build the network from loaded weights, reporting mismatches as an
/// incompatible model
pub fn build_network(
    architecture: Architecture,
    num_classes: usize,
    vb: VarBuilder<'static>,
    weights_path: &Path,
) -> Result<Func<'static>> {
    architecture
        .build(num_classes, vb)
        .map_err(|e| Error::incompatible(incompatible_message(architecture, num_classes, weights_path, &e)))
}

/// Operator-facing explanation for weights this runtime cannot use
pub fn incompatible_message(
    architecture: Architecture,
    num_classes: usize,
    weights_path: &Path,
    cause: &dyn fmt::Display,
) -> String {
    format!(
        "\n\nThe model at {} cannot run on this inference runtime ({}).\n\n\
         Export the trained network as a {} state dict with {} output classes \
         and restart the server, or point the configuration at a compatible artifact.",
        weights_path.display(),
        cause,
        architecture,
        num_classes,
    )
}
