//! End-to-end predictor tests on a randomly initialised ResNet-18
//!
//! The weights are meaningless; these tests cover loading, shape checks and
//! the label mapping, not accuracy.

use candle_core::{DType, Device};
use candle_nn::{VarBuilder, VarMap};
use candle_transformers::models::resnet;
use florascope_core::Error;
use florascope_model::{
    bootstrap, Architecture, ArtifactSource, ArtifactSpec, CandlePredictor, ClassLabels,
    ModelConfig, Predictor,
};
use image::{DynamicImage, Rgb, RgbImage};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const TEST_IMAGE_SIZE: usize = 64;

fn write_resnet18(path: &Path, num_classes: usize) {
    let varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
    resnet::resnet18(num_classes, vb).unwrap();
    varmap.save(path).unwrap();
}

fn local_config(path: PathBuf, architecture: Architecture) -> ModelConfig {
    ModelConfig {
        artifact: ArtifactSpec {
            source: ArtifactSource::Local,
            path,
            sha256: None,
        },
        architecture,
        image_size: TEST_IMAGE_SIZE,
        ..Default::default()
    }
}

fn garden_labels() -> ClassLabels {
    ClassLabels::new(["daisy", "rose", "tulip"]).unwrap()
}

fn sample_image() -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(120, 90, |x, y| {
        Rgb([(x * 2) as u8, (y * 2) as u8, ((x + y) % 256) as u8])
    }))
}

#[tokio::test]
async fn test_predicts_a_known_label() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("resnet18.safetensors");
    write_resnet18(&path, 3);

    let config = local_config(path.clone(), Architecture::Resnet18);
    let predictor = CandlePredictor::load(&path, &config, garden_labels()).unwrap();

    let prediction = predictor.predict(sample_image()).await.unwrap();

    assert!(garden_labels().contains(&prediction.label), "unexpected label {}", prediction.label);
    assert!(prediction.index < 3);
    assert!(prediction.confidence > 0.0 && prediction.confidence <= 1.0);
    assert_eq!(predictor.labels().len(), 3);
    assert_eq!(predictor.name(), "resnet18-resnet18");
}

#[tokio::test]
async fn test_prediction_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("resnet18.safetensors");
    write_resnet18(&path, 3);

    let config = local_config(path.clone(), Architecture::Resnet18);
    let predictor = CandlePredictor::load(&path, &config, garden_labels()).unwrap();

    let first = predictor.predict(sample_image()).await.unwrap();
    let second = predictor.predict(sample_image()).await.unwrap();

    assert_eq!(first.label, second.label);
    assert!((first.confidence - second.confidence).abs() < 1e-5);
}

#[tokio::test]
async fn test_class_count_mismatch_is_incompatible() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("resnet18.safetensors");
    write_resnet18(&path, 5);

    let config = local_config(path.clone(), Architecture::Resnet18);
    let result = CandlePredictor::load(&path, &config, garden_labels());

    match result {
        Err(Error::IncompatibleModel(msg)) => assert!(msg.contains("3 output classes"), "{}", msg),
        Err(e) => panic!("expected IncompatibleModel, got {}", e),
        Ok(_) => panic!("expected IncompatibleModel, got a predictor"),
    }
}

#[tokio::test]
async fn test_architecture_mismatch_is_incompatible() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("resnet18.safetensors");
    write_resnet18(&path, 3);

    let config = local_config(path.clone(), Architecture::Resnet34);
    let result = CandlePredictor::load(&path, &config, garden_labels());

    assert!(matches!(result, Err(Error::IncompatibleModel(_))));
}

#[tokio::test]
async fn test_corrupt_artifact_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("export.safetensors");
    std::fs::write(&path, b"<html>this is a download interstitial</html>").unwrap();

    let config = local_config(path.clone(), Architecture::Resnet18);
    let result = CandlePredictor::load(&path, &config, garden_labels());

    assert!(matches!(result, Err(Error::Artifact(_))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_bootstrap_shares_one_predictor_across_tasks() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("flowers.safetensors");
    write_resnet18(&path, 3);

    let labels_path = dir.path().join("labels.txt");
    std::fs::write(&labels_path, "daisy\nrose\ntulip\n").unwrap();

    let mut config = local_config(path, Architecture::Resnet18);
    config.labels_path = Some(labels_path);

    let predictor: Arc<dyn Predictor> = bootstrap(&config).await.unwrap();
    assert_eq!(predictor.name(), "resnet18-flowers");

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let predictor = Arc::clone(&predictor);
            tokio::spawn(async move { predictor.predict(sample_image()).await })
        })
        .collect();

    for handle in handles {
        let prediction = handle.await.unwrap().unwrap();
        assert!(predictor.labels().contains(&prediction.label));
    }
}

#[tokio::test]
async fn test_bootstrap_fails_without_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let config = local_config(dir.path().join("missing.safetensors"), Architecture::Resnet18);

    let result = bootstrap(&config).await;
    assert!(matches!(result, Err(Error::Config(_))));
}

#[tokio::test]
async fn test_zero_image_size_is_rejected_before_loading() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("resnet18.safetensors");
    write_resnet18(&path, 3);

    let mut config = local_config(path.clone(), Architecture::Resnet18);
    config.image_size = 0;

    let result = CandlePredictor::load(&path, &config, garden_labels());
    assert!(matches!(result, Err(Error::Config(_))));

    let result = bootstrap(&config).await;
    assert!(matches!(result, Err(Error::Config(_))));
}

#[tokio::test]
async fn test_unknown_device_fails_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("resnet18.safetensors");
    write_resnet18(&path, 3);

    let mut config = local_config(path.clone(), Architecture::Resnet18);
    config.device = "gpu0".to_string();

    let result = CandlePredictor::load(&path, &config, garden_labels());
    assert!(matches!(result, Err(Error::Config(_))));
}
