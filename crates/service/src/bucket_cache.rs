use std::collections::BTreeMap;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::Mutex;
use tokio::time::Instant;

use common::prelude::*;

struct Listing {
    fetched_at: Instant,
    by_project: BTreeMap<String, Vec<Bucket>>,
}

/// Every bucket visible to the drive, grouped by project.
///
/// Populated on demand by listing every active project and then every
///  project's buckets. Projects that refuse access are skipped.
pub struct BucketCache {
    staleness: Duration,
    listing: Mutex<Option<Listing>>,
}

impl BucketCache {
    pub fn new(staleness: Duration) -> Self {
        Self {
            staleness,
            listing: Mutex::new(None),
        }
    }

    /// `(project, bucket)` pairs for every visible bucket, refreshing the
    ///  cache first if it has gone stale.
    pub async fn buckets(
        &self,
        api: &dyn StorageApi,
    ) -> Result<Vec<(String, Bucket)>, StorageError> {
        let mut listing = self.listing.lock().await;
        let fresh = listing
            .as_ref()
            .map(|listing| listing.fetched_at.elapsed() <= self.staleness)
            .unwrap_or(false);
        if !fresh {
            *listing = Some(Listing {
                by_project: Self::fetch(api).await?,
                fetched_at: Instant::now(),
            });
        }

        Ok(listing
            .iter()
            .flat_map(|listing| listing.by_project.iter())
            .flat_map(|(project, buckets)| {
                buckets
                    .iter()
                    .map(move |bucket| (project.clone(), bucket.clone()))
            })
            .collect())
    }

    async fn fetch(api: &dyn StorageApi) -> Result<BTreeMap<String, Vec<Bucket>>, StorageError> {
        let projects: Vec<Project> = api
            .list_projects()
            .await?
            .into_iter()
            .filter(Project::is_active)
            .collect();

        let results = join_all(
            projects
                .iter()
                .map(|project| api.list_buckets(&project.project_id)),
        )
        .await;

        let mut by_project = BTreeMap::new();
        for (project, result) in projects.into_iter().zip(results) {
            match result {
                Ok(buckets) => {
                    by_project.insert(project.project_id, buckets);
                }
                Err(StorageError::Forbidden(message)) => {
                    tracing::warn!(
                        project = %project.project_id,
                        "skipping project without bucket access: {}",
                        message
                    );
                }
                Err(e) => return Err(e),
            }
        }
        tracing::debug!(projects = by_project.len(), "refreshed bucket cache");
        Ok(by_project)
    }

    /// Whether `name` is a known bucket. `None` when the cache is empty or
    ///  stale and cannot answer.
    pub async fn contains(&self, name: &str) -> Option<bool> {
        let listing = self.listing.lock().await;
        let listing = listing.as_ref()?;
        if listing.fetched_at.elapsed() > self.staleness {
            return None;
        }
        Some(
            listing
                .by_project
                .values()
                .flatten()
                .any(|bucket| bucket.name == name),
        )
    }

    pub async fn invalidate(&self) {
        *self.listing.lock().await = None;
    }
}
