//! Two-phase startup: acquire the artifact, then construct the predictor.

use crate::artifact::ensure_artifact;
use crate::config::ModelConfig;
use crate::predictor::{CandlePredictor, Predictor};
use florascope_core::{Error, Result};
use std::sync::Arc;
use std::time::Instant;

/// Provision the artifact and load it into a shared, read-only predictor.
///
/// Callers must not accept traffic until this returns `Ok`.
pub async fn bootstrap(config: &ModelConfig) -> Result<Arc<dyn Predictor>> {
    let start = Instant::now();
    config.validate()?;

    tracing::info!("Acquiring model artifact");
    let weights = ensure_artifact(&config.artifact).await?;

    tracing::info!("Loading predictor from {}", weights.display());
    let labels = config.labels()?;
    let config = config.clone();
    let predictor = tokio::task::spawn_blocking(move || CandlePredictor::load(&weights, &config, labels))
        .await
        .map_err(|e| Error::internal(format!("Model loading task failed: {}", e)))??;

    tracing::info!("Bootstrap completed in {:?}", start.elapsed());
    Ok(Arc::new(predictor))
}
