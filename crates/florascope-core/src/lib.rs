//! Florascope Core
//!
//! Types shared across Florascope components.
//!
//! This crate provides:
//! - The workspace-wide error type and result alias
//! - The `Prediction` produced by every predictor

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::Prediction;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::types::Prediction;
}
