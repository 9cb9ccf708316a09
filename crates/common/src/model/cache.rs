use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Mutex as AsyncMutex;

use crate::storage::{ObjectRecord, StorageApi};

use super::bucket_model::{BucketModel, DEFAULT_STALENESS};

pub type SharedModel = Arc<AsyncMutex<BucketModel>>;

/// Every bucket model of a drive, created on first use.
///
/// Models are handed out behind an async mutex since refreshing one awaits
///  a listing call. Invalidation is all-or-nothing.
pub struct ModelCache {
    api: Arc<dyn StorageApi>,
    staleness: Duration,
    page_size: Option<u32>,
    models: Mutex<HashMap<String, SharedModel>>,
}

impl ModelCache {
    pub fn new(api: Arc<dyn StorageApi>) -> Self {
        Self {
            api,
            staleness: DEFAULT_STALENESS,
            page_size: None,
            models: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_staleness(mut self, staleness: Duration) -> Self {
        self.staleness = staleness;
        self
    }

    pub fn with_page_size(mut self, page_size: Option<u32>) -> Self {
        self.page_size = page_size;
        self
    }

    /// The model for `bucket`, creating an empty (stale) one if needed.
    pub fn model(&self, bucket: &str) -> SharedModel {
        self.models
            .lock()
            .entry(bucket.to_string())
            .or_insert_with(|| {
                Arc::new(AsyncMutex::new(
                    BucketModel::new(bucket, self.api.clone())
                        .with_staleness(self.staleness)
                        .with_page_size(self.page_size),
                ))
            })
            .clone()
    }

    /// Feed a record observed by some other listing into its bucket's model.
    ///  Buckets without a model yet are left alone.
    pub async fn observe(&self, record: &ObjectRecord) {
        let model = self.models.lock().get(&record.bucket).cloned();
        if let Some(model) = model {
            model.lock().await.add_object(record.clone());
        }
    }

    /// Drop every model. The next query on any bucket relists it.
    pub fn invalidate_all(&self) {
        let mut models = self.models.lock();
        if !models.is_empty() {
            tracing::debug!(models = models.len(), "invalidating bucket models");
        }
        models.clear();
    }

    pub fn len(&self) -> usize {
        self.models.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
