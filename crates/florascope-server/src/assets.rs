use crate::routes::AppError;
use axum::{
    extract::Path,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};
use rust_embed::Embed;

#[derive(Embed)]
#[folder = "assets/view/"]
struct ViewAssets;

#[derive(Embed)]
#[folder = "assets/static/"]
struct StaticAssets;

/// Serve the upload page
pub async fn index() -> Result<Html<String>, AppError> {
    let content = <ViewAssets as Embed>::get("index.html")
        .ok_or_else(|| AppError::Internal("upload page is missing from the build".to_string()))?;

    Ok(Html(String::from_utf8_lossy(&content.data).into_owned()))
}

/// Serve embedded files under `/static`
pub async fn serve_static(Path(path): Path<String>) -> Response {
    let path = path.trim_start_matches('/');

    match <StaticAssets as Embed>::get(path) {
        Some(content) => {
            let mime = mime_guess::from_path(path).first_or_octet_stream();
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, mime.as_ref())],
                content.data.into_owned(),
            )
                .into_response()
        }
        None => (StatusCode::NOT_FOUND, "Not found").into_response(),
    }
}
