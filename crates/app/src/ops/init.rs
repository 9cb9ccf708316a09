use clap::Args;
use url::Url;

use crate::state::{AppConfig, AppState};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// Project new buckets are created in
    #[arg(long)]
    pub project: Option<String>,

    /// Storage JSON API endpoint, e.g. a local emulator
    #[arg(long)]
    pub storage_endpoint: Option<Url>,

    /// Seconds a bucket listing is trusted
    #[arg(long)]
    pub staleness_secs: Option<u64>,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] crate::state::StateError),
}

#[async_trait::async_trait]
impl crate::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let mut config = AppConfig {
            project: self.project.clone(),
            ..AppConfig::default()
        };
        if let Some(endpoint) = &self.storage_endpoint {
            config.storage_endpoint = endpoint.clone();
        }
        if let Some(staleness_secs) = self.staleness_secs {
            config.staleness_secs = staleness_secs;
        }

        let state = AppState::init(ctx.config_dir.clone(), config)?;

        Ok(format!(
            "Initialized gcsdrive config at: {}\n\
             - Project: {}\n\
             - Storage endpoint: {}\n\
             - Access token: set GCSDRIVE_ACCESS_TOKEN or edit the config file",
            state.config_path.display(),
            state.config.project.as_deref().unwrap_or("(none)"),
            state.config.storage_endpoint,
        ))
    }
}
