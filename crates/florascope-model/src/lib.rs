//! Florascope Model
//!
//! Everything between a model URL and a label:
//! - Fetch-once provisioning of the serialized model artifact
//! - Weight loading and network construction with Candle
//! - Image decoding and normalization
//! - The `Predictor` trait shared by the server and tests
//!
//! Inference runs on CPU by default; CUDA and Metal devices are selectable
//! through configuration when Candle is built with them.

pub mod artifact;
pub mod bootstrap;
pub mod config;
pub mod labels;
pub mod model_loader;
pub mod predictor;
pub mod preprocess;

pub use artifact::ensure_artifact;
pub use bootstrap::bootstrap;
pub use config::{ArtifactSource, ArtifactSpec, ModelConfig, ModelFormatSpec};
pub use labels::{ClassLabels, FLOWER_CLASSES};
pub use model_loader::{Architecture, DeviceType, ModelFormat};
pub use predictor::{CandlePredictor, Predictor};
pub use preprocess::{decode_image, image_to_tensor};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::ModelConfig;
    pub use crate::labels::ClassLabels;
    pub use crate::predictor::{CandlePredictor, Predictor};
    pub use crate::preprocess::decode_image;
    pub use florascope_core::{Error, Prediction, Result};
}
