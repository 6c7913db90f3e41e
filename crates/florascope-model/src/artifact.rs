//! Model artifact provisioning
//!
//! Makes sure the serialized model exists on local disk before anything tries
//! to load it. Remote artifacts are fetched at most once: a file already at
//! the configured path is used as-is.

use crate::config::{ArtifactSource, ArtifactSpec};
use florascope_core::{Error, Result};
use futures_util::StreamExt;
use sha2::{Digest, Sha256};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Resolve the artifact to a local file, downloading it if necessary.
pub async fn ensure_artifact(spec: &ArtifactSpec) -> Result<PathBuf> {
    let path = match &spec.source {
        ArtifactSource::Url { url } => {
            if spec.path.exists() {
                info!("Using cached model artifact at {}", spec.path.display());
                verify_checksum(&spec.path, spec.sha256.as_deref()).await?;
                return Ok(spec.path.clone());
            }

            let client = download_client()?;
            let bytes = download_file(&client, url, &spec.path).await?;
            info!("Downloaded {} bytes to {}", bytes, spec.path.display());

            if let Err(e) = verify_checksum(&spec.path, spec.sha256.as_deref()).await {
                if let Err(rm) = tokio::fs::remove_file(&spec.path).await {
                    warn!("Failed to remove rejected artifact {}: {}", spec.path.display(), rm);
                }
                return Err(e);
            }
            return Ok(spec.path.clone());
        }
        ArtifactSource::HuggingFace {
            repo,
            revision,
            filename,
        } => download_from_huggingface(repo, revision, filename).await?,
        ArtifactSource::Local => {
            if !spec.path.exists() {
                return Err(Error::config(format!(
                    "Model file not found: {}",
                    spec.path.display()
                )));
            }
            spec.path.clone()
        }
    };

    verify_checksum(&path, spec.sha256.as_deref()).await?;
    Ok(path)
}

/// HTTP client used for artifact downloads
pub fn download_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .user_agent(concat!("florascope/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| Error::download(format!("Failed to build HTTP client: {}", e)))
}

/// Stream `url` into `dest`. The body is written to a `.part` sibling first and
/// renamed into place once complete; on failure the partial file is removed.
pub async fn download_file(client: &reqwest::Client, url: &str, dest: &Path) -> Result<u64> {
    if let Some(parent) = dest.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    info!("Downloading model artifact from {}", url);

    let partial = partial_path(dest);
    match write_body(client, url, &partial).await {
        Ok(written) => {
            tokio::fs::rename(&partial, dest).await?;
            Ok(written)
        }
        Err(e) => {
            if tokio::fs::try_exists(&partial).await.unwrap_or(false) {
                if let Err(rm) = tokio::fs::remove_file(&partial).await {
                    warn!("Failed to remove partial download {}: {}", partial.display(), rm);
                }
            }
            Err(e)
        }
    }
}

async fn write_body(client: &reqwest::Client, url: &str, partial: &Path) -> Result<u64> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| Error::download(format!("Request to {} failed: {}", url, e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::download(format!("GET {} returned {}", url, status)));
    }

    let mut file = tokio::fs::File::create(partial).await?;
    let mut stream = response.bytes_stream();
    let mut written = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk
            .map_err(|e| Error::download(format!("Reading body from {} failed: {}", url, e)))?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    file.flush().await?;
    file.sync_all().await?;

    if written == 0 {
        return Err(Error::download(format!("{} returned an empty body", url)));
    }

    debug!("Wrote {} bytes to {}", written, partial.display());
    Ok(written)
}

/// Download model from HuggingFace Hub
async fn download_from_huggingface(repo: &str, revision: &str, filename: &str) -> Result<PathBuf> {
    info!("Resolving model from HuggingFace: {} @ {} ({})", repo, revision, filename);

    let repo = repo.to_string();
    let revision = revision.to_string();
    let filename = filename.to_string();

    tokio::task::spawn_blocking(move || -> Result<PathBuf> {
        let api = hf_hub::api::sync::Api::new()
            .map_err(|e| Error::download(format!("Failed to initialize HuggingFace API: {}", e)))?;

        let repo_obj = api.repo(hf_hub::Repo::with_revision(
            repo.clone(),
            hf_hub::RepoType::Model,
            revision,
        ));

        repo_obj.get(&filename).map_err(|e| {
            Error::download(format!("Failed to download {} from {}: {}", filename, repo, e))
        })
    })
    .await
    .map_err(|e| Error::internal(format!("HuggingFace download task failed: {}", e)))?
}

/// Compare the file's SHA-256 against `expected`, if one is configured
pub async fn verify_checksum(path: &Path, expected: Option<&str>) -> Result<()> {
    let Some(expected) = expected else {
        return Ok(());
    };

    let actual = sha256_file(path).await?;
    if !actual.eq_ignore_ascii_case(expected.trim()) {
        return Err(Error::artifact(format!(
            "Checksum mismatch for {}: expected {}, got {}",
            path.display(),
            expected,
            actual
        )));
    }

    debug!("Checksum verified for {}", path.display());
    Ok(())
}

/// Lowercase hex SHA-256 of a file
pub async fn sha256_file(path: &Path) -> Result<String> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || -> Result<String> {
        let mut file = std::fs::File::open(&path)?;
        let mut hasher = Sha256::new();
        std::io::copy(&mut file, &mut hasher)?;
        Ok(format!("{:x}", hasher.finalize()))
    })
    .await
    .map_err(|e| Error::internal(format!("Checksum task failed: {}", e)))?
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = OsString::from(dest.as_os_str());
    name.push(".part");
    PathBuf::from(name)
}
