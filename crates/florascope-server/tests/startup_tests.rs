//! Full startup path: download on first run, load, then serve `/analyze`

use axum::{
    body::{Body, Bytes},
    http::{header, Request, StatusCode},
    routing::get,
    Router,
};
use candle_core::{DType, Device};
use candle_nn::{VarBuilder, VarMap};
use candle_transformers::models::resnet;
use florascope_model::{
    bootstrap, Architecture, ArtifactSource, ArtifactSpec, ModelConfig, FLOWER_CLASSES,
};
use florascope_server::{build_app, AppState, DEFAULT_MAX_UPLOAD_BYTES};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::net::SocketAddr;
use std::path::Path;
use tower::ServiceExt;

async fn serve_weights(weights: Vec<u8>) -> SocketAddr {
    let weights = Bytes::from(weights);
    let app = Router::new().route(
        "/export.safetensors",
        get(move || {
            let weights = weights.clone();
            async move { weights }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn write_flower_resnet18(path: &Path) {
    let varmap = VarMap::new();
    let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
    resnet::resnet18(FLOWER_CLASSES.len(), vb).unwrap();
    varmap.save(path).unwrap();
}

fn upload(png: &[u8]) -> Request<Body> {
    let boundary = "startup-boundary";
    let mut body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"rose.png\"\r\nContent-Type: image/png\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(png);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::post("/analyze")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_first_start_downloads_then_serves() {
    let scratch = tempfile::tempdir().unwrap();
    let source = scratch.path().join("source.safetensors");
    write_flower_resnet18(&source);
    let addr = serve_weights(std::fs::read(&source).unwrap()).await;

    let cache = tempfile::tempdir().unwrap();
    let artifact_path = cache.path().join("models").join("export.safetensors");
    let config = ModelConfig {
        artifact: ArtifactSpec {
            source: ArtifactSource::Url {
                url: format!("http://{}/export.safetensors", addr),
            },
            path: artifact_path.clone(),
            sha256: None,
        },
        architecture: Architecture::Resnet18,
        image_size: 64,
        ..Default::default()
    };

    let predictor = bootstrap(&config).await.unwrap();
    assert!(artifact_path.exists(), "artifact should be cached after first start");
    assert_eq!(predictor.labels().len(), 102);

    let img = RgbImage::from_fn(80, 60, |x, y| Rgb([200, (x * 3) as u8, (y * 4) as u8]));
    let mut png = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut png, ImageFormat::Png)
        .unwrap();

    let app = build_app(AppState::new(predictor), DEFAULT_MAX_UPLOAD_BYTES);
    let response = app.oneshot(upload(png.get_ref())).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    let result = body["result"].as_str().unwrap();
    assert!(FLOWER_CLASSES.contains(&result), "unknown class {}", result);
}

#[tokio::test]
async fn test_unloadable_artifact_fails_startup() {
    let addr = serve_weights(b"<html>quota exceeded</html>".to_vec()).await;

    let cache = tempfile::tempdir().unwrap();
    let config = ModelConfig {
        artifact: ArtifactSpec {
            source: ArtifactSource::Url {
                url: format!("http://{}/export.safetensors", addr),
            },
            path: cache.path().join("export.safetensors"),
            sha256: None,
        },
        architecture: Architecture::Resnet18,
        image_size: 64,
        ..Default::default()
    };

    assert!(bootstrap(&config).await.is_err());
}
