//! Predictor trait and the Candle-backed implementation

use crate::config::ModelConfig;
use crate::labels::ClassLabels;
use crate::model_loader::{build_network, incompatible_message, load_weights};
use crate::preprocess::image_to_tensor;
use async_trait::async_trait;
use candle_core::{Device, Module, D};
use candle_nn::Func;
use florascope_core::{Error, Prediction, Result};
use image::DynamicImage;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Anything that maps an image to one of a fixed set of class labels.
///
/// Implementations are shared read-only across concurrent requests.
#[async_trait]
pub trait Predictor: Send + Sync {
    /// Classify a decoded image
    async fn predict(&self, image: DynamicImage) -> Result<Prediction>;

    /// Get the model name
    fn name(&self) -> &str;

    /// Labels this predictor can emit
    fn labels(&self) -> &ClassLabels;
}

/// Image classifier running a Candle network
pub struct CandlePredictor {
    inner: Arc<Network>,
}

struct Network {
    name: String,
    model: Func<'static>,
    device: Device,
    labels: ClassLabels,
    image_size: usize,
}

impl CandlePredictor {
    /// Deserialize `weights` and construct the network described by `config`.
    ///
    /// Runs one forward pass on a blank image before returning, so a model
    /// that loads but cannot execute is rejected here instead of on the first
    /// request.
    pub fn load(weights: &Path, config: &ModelConfig, labels: ClassLabels) -> Result<Self> {
        config.validate()?;
        let device = config.device_type()?.create()?;
        let format = config.format.resolve(weights);

        tracing::info!(
            "Loading {} weights ({}) from {}",
            config.architecture,
            format,
            weights.display()
        );

        let vb = load_weights(weights, format, &device)?;
        let model = build_network(config.architecture, labels.len(), vb, weights)?;

        let network = Network {
            name: config.display_name(),
            model,
            device,
            labels,
            image_size: config.image_size,
        };

        let blank = DynamicImage::new_rgb8(network.image_size as u32, network.image_size as u32);
        network.classify(&blank).map_err(|e| {
            Error::incompatible(incompatible_message(
                config.architecture,
                network.labels.len(),
                weights,
                &e,
            ))
        })?;

        tracing::info!(
            "Model '{}' ready with {} classes",
            network.name,
            network.labels.len()
        );

        Ok(Self {
            inner: Arc::new(network),
        })
    }
}

impl Network {
    fn classify(&self, image: &DynamicImage) -> Result<Prediction> {
        let start = Instant::now();

        let input = image_to_tensor(image, self.image_size, &self.device)
            .and_then(|t| t.unsqueeze(0))
            .map_err(|e| Error::inference(format!("Failed to prepare input tensor: {}", e)))?;

        let probs = self
            .model
            .forward(&input)
            .and_then(|logits| candle_nn::ops::softmax(&logits, D::Minus1))
            .and_then(|p| p.squeeze(0))
            .and_then(|p| p.to_vec1::<f32>())
            .map_err(|e| Error::inference(format!("Forward pass failed: {}", e)))?;

        let (index, confidence) = top_class(&probs)
            .ok_or_else(|| Error::inference("Model produced no outputs"))?;

        let label = self.labels.get(index).ok_or_else(|| {
            Error::inference(format!(
                "Model predicted class {} but only {} labels are known",
                index,
                self.labels.len()
            ))
        })?;

        let latency_us = start.elapsed().as_micros() as u64;
        tracing::debug!("Predicted '{}' ({:.3}) in {}us", label, confidence, latency_us);

        Ok(Prediction::new(label, index, confidence).with_latency_us(latency_us))
    }
}

#[async_trait]
impl Predictor for CandlePredictor {
    async fn predict(&self, image: DynamicImage) -> Result<Prediction> {
        let network = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || network.classify(&image))
            .await
            .map_err(|e| Error::internal(format!("Inference task failed: {}", e)))?
    }

    fn name(&self) -> &str {
        &self.inner.name
    }

    fn labels(&self) -> &ClassLabels {
        &self.inner.labels
    }
}

/// Index and value of the largest score, ignoring NaNs
fn top_class(scores: &[f32]) -> Option<(usize, f32)> {
    scores
        .iter()
        .copied()
        .enumerate()
        .filter(|(_, s)| !s.is_nan())
        .max_by(|a, b| a.1.total_cmp(&b.1))
}
