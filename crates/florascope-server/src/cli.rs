use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "florascope")]
#[command(author, version, about = "Flower photo classification server")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, default_value = "florascope.yaml", env = "FLORASCOPE_CONFIG")]
    pub config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Provision the model, then serve the upload page and /analyze
    Serve {
        /// Listen address
        #[arg(short = 'l', long, env = "FLORASCOPE_HOST")]
        host: Option<String>,

        /// Listen port
        #[arg(short = 'P', long, env = "FLORASCOPE_PORT")]
        port: Option<u16>,

        #[command(flatten)]
        model: ModelArgs,
    },

    /// Download the model artifact into its cache path and exit
    Fetch {
        #[command(flatten)]
        model: ModelArgs,
    },
}

/// Model artifact overrides shared by all subcommands
#[derive(Args, Debug, Clone, Default)]
pub struct ModelArgs {
    /// Download URL of the model artifact
    #[arg(long, env = "FLORASCOPE_MODEL_URL")]
    pub model_url: Option<String>,

    /// Local path the model artifact is cached at
    #[arg(long, env = "FLORASCOPE_MODEL_PATH")]
    pub model_path: Option<PathBuf>,
}
