//! Florascope Server
//!
//! Serves a static upload page and classifies posted images with a model
//! provisioned once at startup.

pub mod app;
pub mod assets;
pub mod cli;
pub mod config;
pub mod routes;
pub mod state;
pub mod telemetry;

pub use app::{build_app, run_server, DEFAULT_MAX_UPLOAD_BYTES};
pub use config::ServerConfig;
pub use state::AppState;
