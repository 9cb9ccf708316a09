use std::path::PathBuf;

pub use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "gcsdrive")]
#[command(about = "Browse and manage Google Cloud Storage buckets as a virtual drive")]
#[command(version)]
pub struct Args {
    /// Directory holding config.toml (default: ~/.gcsdrive)
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,

    /// Log level for diagnostics on stderr. RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: crate::Command,
}
