use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use common::prelude::*;

use super::bucket_cache::BucketCache;
use super::config::Config;
use super::gcs::{GcsClient, GcsClientError};

/// Everything a drive operation needs: the storage backend and the caches
///  built on top of it. Cheap to clone; clones share caches.
#[derive(Clone)]
pub struct State {
    api: Arc<dyn StorageApi>,
    models: Arc<ModelCache>,
    buckets: Arc<BucketCache>,
    default_project: Option<String>,
    stop: Arc<AtomicBool>,
}

impl State {
    pub fn from_config(config: &Config) -> Result<Self, StateSetupError> {
        let client = GcsClient::new(
            &config.storage_endpoint,
            &config.resource_manager_endpoint,
            config.access_token.as_deref(),
        )?;
        if config.access_token.is_none() {
            tracing::warn!("no access token configured, requests will be unauthenticated");
        }
        tracing::info!("Storage endpoint: {}", config.storage_endpoint);

        Ok(Self::with_api(Arc::new(client), config))
    }

    /// Build a state over any backend, taking cache settings from `config`.
    pub fn with_api(api: Arc<dyn StorageApi>, config: &Config) -> Self {
        let models = ModelCache::new(api.clone())
            .with_staleness(config.staleness)
            .with_page_size(config.list_page_size);

        Self {
            models: Arc::new(models),
            buckets: Arc::new(BucketCache::new(config.staleness)),
            api,
            default_project: config.project.clone(),
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn api(&self) -> &Arc<dyn StorageApi> {
        &self.api
    }

    pub fn models(&self) -> &ModelCache {
        &self.models
    }

    pub fn buckets(&self) -> &BucketCache {
        &self.buckets
    }

    pub fn default_project(&self) -> Option<&str> {
        self.default_project.as_deref()
    }

    /// Ask long running listings and deletions to stop at the next page.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub fn is_stopping(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Drop every cached view after a mutation.
    pub(crate) async fn invalidate(&self, buckets_changed: bool) {
        self.models.invalidate_all();
        if buckets_changed {
            self.buckets.invalidate().await;
        }
    }
}

impl AsRef<ModelCache> for State {
    fn as_ref(&self) -> &ModelCache {
        &self.models
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StateSetupError {
    #[error("storage client setup error: {0}")]
    Client(#[from] GcsClientError),
}
