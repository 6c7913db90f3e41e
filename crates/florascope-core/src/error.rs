//! Error types for Florascope

/// Result type alias using Florascope's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for Florascope operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Fetching the model artifact failed
    #[error("download error: {0}")]
    Download(String),

    /// The artifact is present but unusable (corrupt, wrong format, bad checksum)
    #[error("artifact error: {0}")]
    Artifact(String),

    /// The artifact deserialized but cannot run on this inference runtime
    #[error("incompatible model: {0}")]
    IncompatibleModel(String),

    /// Uploaded bytes are not a decodable image
    #[error("decode error: {0}")]
    Decode(String),

    /// Forward pass or post-processing failed
    #[error("inference error: {0}")]
    Inference(String),

    /// Network/IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new download error
    pub fn download(msg: impl Into<String>) -> Self {
        Self::Download(msg.into())
    }

    /// Create a new artifact error
    pub fn artifact(msg: impl Into<String>) -> Self {
        Self::Artifact(msg.into())
    }

    /// Create a new incompatible model error
    pub fn incompatible(msg: impl Into<String>) -> Self {
        Self::IncompatibleModel(msg.into())
    }

    /// Create a new decode error
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Create a new inference error
    pub fn inference(msg: impl Into<String>) -> Self {
        Self::Inference(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// True for errors caused by the caller's input rather than the server
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Decode(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::incompatible("missing tensor fc.weight");
        assert_eq!(err.to_string(), "incompatible model: missing tensor fc.weight");

        let err = Error::decode("unsupported format");
        assert_eq!(err.to_string(), "decode error: unsupported format");
    }

    #[test]
    fn test_client_errors() {
        assert!(Error::decode("bad bytes").is_client_error());
        assert!(!Error::inference("oom").is_client_error());
        assert!(!Error::download("404").is_client_error());
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
