use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::path::SEPARATOR;
use crate::storage::{ListObjectsRequest, Lookup, ObjectRecord, StorageApi, StorageError};

use super::snapshot::BucketSnapshot;

/// How long a snapshot is trusted before the next query relists the bucket.
pub const DEFAULT_STALENESS: Duration = Duration::from_secs(60);

/// Cached listing of one bucket plus the logic to answer path queries
///  from it.
///
/// Every query refreshes the snapshot first when it has gone stale. When the
///  snapshot is complete it is authoritative; when the listing was truncated,
///  keys it has never seen are resolved with a live call and the answer is
///  remembered.
pub struct BucketModel {
    bucket: String,
    api: Arc<dyn StorageApi>,
    staleness: Duration,
    page_size: Option<u32>,
    snapshot: BucketSnapshot,
    refreshed_at: Option<Instant>,
}

impl BucketModel {
    pub fn new(bucket: impl Into<String>, api: Arc<dyn StorageApi>) -> Self {
        Self {
            bucket: bucket.into(),
            api,
            staleness: DEFAULT_STALENESS,
            page_size: None,
            snapshot: BucketSnapshot::default(),
            refreshed_at: None,
        }
    }

    pub fn with_staleness(mut self, staleness: Duration) -> Self {
        self.staleness = staleness;
        self
    }

    /// Limit the listing used to build the snapshot. `None` uses the
    ///  backend's default page size.
    pub fn with_page_size(mut self, page_size: Option<u32>) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn snapshot(&self) -> &BucketSnapshot {
        &self.snapshot
    }

    pub fn is_stale(&self) -> bool {
        match self.refreshed_at {
            Some(refreshed_at) => refreshed_at.elapsed() > self.staleness,
            None => true,
        }
    }

    /// Force the next query to relist the bucket.
    pub fn invalidate(&mut self) {
        self.refreshed_at = None;
    }

    /// Clear the snapshot and rebuild it from the first page of a full listing.
    pub async fn update_model(&mut self) -> Result<(), StorageError> {
        self.snapshot = BucketSnapshot::default();
        self.refreshed_at = None;

        let request = ListObjectsRequest::new(self.bucket.clone())
            .max_results(self.page_size)
            .full();
        let page = self.api.list_objects(&request).await?;

        self.snapshot = BucketSnapshot::from_page(&page);
        self.refreshed_at = Some(Instant::now());
        tracing::debug!(
            bucket = %self.bucket,
            objects = page.items.len(),
            folders = self.snapshot.prefixes().len(),
            truncated = self.snapshot.is_truncated(),
            "refreshed bucket model"
        );
        Ok(())
    }

    async fn ensure_fresh(&mut self) -> Result<(), StorageError> {
        if self.is_stale() {
            self.update_model().await?;
        }
        Ok(())
    }

    /// Fetch a key the snapshot has never seen and remember the answer.
    async fn fetch(&mut self, key: &str) -> Result<Lookup<ObjectRecord>, StorageError> {
        tracing::trace!(bucket = %self.bucket, key, "live object lookup");
        let lookup = Lookup::from_result(self.api.get_object(&self.bucket, key).await)?;
        match &lookup {
            Lookup::Found(record) => self.snapshot.insert(record.clone()),
            Lookup::NotFound => self.snapshot.mark_missing(key),
        }
        Ok(lookup)
    }

    /// True if `key` is an object or a folder.
    pub async fn object_exists(&mut self, key: &str) -> Result<bool, StorageError> {
        self.ensure_fresh().await?;
        if let Some(exists) = self.snapshot.exists_locally(key) {
            return Ok(exists);
        }
        if !self.snapshot.is_truncated() {
            return Ok(false);
        }
        Ok(self.fetch(key).await?.is_found())
    }

    /// True if `key` is a folder. The bucket root always is.
    pub async fn is_container(&mut self, key: &str) -> Result<bool, StorageError> {
        let folder = key.trim_end_matches(SEPARATOR);
        if folder.is_empty() {
            return Ok(true);
        }
        self.ensure_fresh().await?;
        if self.snapshot.is_prefix(folder) {
            return Ok(true);
        }
        if !self.snapshot.is_truncated() {
            return Ok(false);
        }

        let request = ListObjectsRequest::new(self.bucket.clone())
            .prefix(format!("{}{}", folder, SEPARATOR))
            .delimited()
            .max_results(Some(1));
        let page = self.api.list_objects(&request).await?;
        Ok(!page.is_empty())
    }

    /// True if the folder at `key` holds anything besides its own
    ///  placeholder. An empty key asks whether the bucket holds any object.
    pub async fn has_children(&mut self, key: &str) -> Result<bool, StorageError> {
        let folder = key.trim_end_matches(SEPARATOR);
        self.ensure_fresh().await?;
        if folder.is_empty() {
            // Approximate when truncated, but then at least one object is known.
            return Ok(self.snapshot.has_objects());
        }
        if let Some(has_children) = self.snapshot.prefix_has_children(folder) {
            return Ok(has_children);
        }
        if !self.snapshot.is_truncated() {
            return Ok(false);
        }

        let placeholder = format!("{}{}", folder, SEPARATOR);
        let request = ListObjectsRequest::new(self.bucket.clone())
            .prefix(placeholder.clone())
            .delimited()
            .max_results(Some(2));
        let page = self.api.list_objects(&request).await?;
        let has_children = !page.prefixes.is_empty()
            || page.items.iter().any(|item| item.name != placeholder);
        for item in page.items {
            self.snapshot.insert(item);
        }
        Ok(has_children)
    }

    /// The record for `key`. A folder without a placeholder object gets a
    ///  synthesized record.
    pub async fn get_object(&mut self, key: &str) -> Result<ObjectRecord, StorageError> {
        self.ensure_fresh().await?;
        if let Some(record) = self.snapshot.record(key) {
            return Ok(record.clone());
        }
        if self.snapshot.is_prefix(key) {
            let folder = key.trim_end_matches(SEPARATOR);
            let placeholder = format!("{}{}", folder, SEPARATOR);
            return Ok(match self.snapshot.record(&placeholder) {
                Some(record) => record.clone(),
                None => ObjectRecord::folder(self.bucket.clone(), folder),
            });
        }
        if self.snapshot.is_missing(key) {
            return Err(self.not_found(key));
        }
        match self.fetch(key).await? {
            Lookup::Found(record) => Ok(record),
            Lookup::NotFound => Err(self.not_found(key)),
        }
    }

    /// Remember a record seen by a listing made elsewhere. Dropped at the
    ///  next refresh.
    pub fn add_object(&mut self, record: ObjectRecord) {
        self.snapshot.insert(record);
    }

    /// True only if an object with exactly this key exists; folders inferred
    ///  from other keys are not real.
    pub async fn is_real(&mut self, key: &str) -> Result<bool, StorageError> {
        self.ensure_fresh().await?;
        if self.snapshot.record(key).is_some() {
            return Ok(true);
        }
        if self.snapshot.is_missing(key) || !self.snapshot.is_truncated() {
            return Ok(false);
        }
        Ok(self.fetch(key).await?.is_found())
    }

    fn not_found(&self, key: &str) -> StorageError {
        StorageError::NotFound(format!("{}{}{}", self.bucket, SEPARATOR, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::MemoryStorage;

    fn setup(names: &[&str], page_size: usize) -> (Arc<MemoryStorage>, BucketModel) {
        let storage = Arc::new(MemoryStorage::new().with_page_size(page_size));
        storage.add_bucket("proj", "b");
        for name in names {
            storage.put("b", name, name.as_bytes());
        }
        let model = BucketModel::new("b", storage.clone());
        (storage, model)
    }

    #[tokio::test]
    async fn test_objects_exist_and_are_real() {
        let names = ["one.txt", "dir/two.txt", "dir/sub/three.txt"];
        let (_, mut model) = setup(&names, 1000);
        for name in names {
            assert!(model.object_exists(name).await.unwrap(), "{}", name);
            assert!(model.is_real(name).await.unwrap(), "{}", name);
        }
        assert!(!model.object_exists("nope").await.unwrap());
    }

    #[tokio::test]
    async fn test_prefixes_exist_but_are_not_real() {
        let (_, mut model) = setup(&["dir/sub/three.txt", "marked/", "marked/x"], 1000);
        for folder in ["dir", "dir/sub"] {
            assert!(model.object_exists(folder).await.unwrap());
            assert!(!model.is_real(folder).await.unwrap());
        }
        // The placeholder itself is a real object.
        assert!(model.is_real("marked/").await.unwrap());
        assert!(model.object_exists("marked").await.unwrap());
    }

    #[tokio::test]
    async fn test_folder_scenario() {
        let (storage, mut model) = setup(&["a/b.txt", "a/c.txt"], 1000);
        assert!(model.has_children("a").await.unwrap());
        assert!(model.is_container("a").await.unwrap());
        assert!(model.object_exists("a").await.unwrap());
        assert!(!model.is_real("a").await.unwrap());
        assert!(model.object_exists("a/b.txt").await.unwrap());
        assert!(model.is_real("a/b.txt").await.unwrap());

        let calls = storage.calls();
        assert_eq!(calls.list_objects, 1);
        assert_eq!(calls.get_object, 0);
    }

    #[tokio::test]
    async fn test_empty_folder_placeholder() {
        let (_, mut model) = setup(&["empty/"], 1000);
        assert!(model.is_container("empty").await.unwrap());
        assert!(model.is_container("empty/").await.unwrap());
        assert!(!model.has_children("empty").await.unwrap());
        assert!(model.has_children("").await.unwrap());
        assert!(model.is_container("").await.unwrap());
    }

    #[tokio::test]
    async fn test_get_object_synthesizes_folders() {
        let (_, mut model) = setup(&["a/b.txt", "p/", "p/q"], 1000);

        let folder = model.get_object("a").await.unwrap();
        assert_eq!(folder.name, "a/");
        assert!(folder.is_folder());
        assert!(folder.generation.is_none());

        let placeholder = model.get_object("p").await.unwrap();
        assert_eq!(placeholder.name, "p/");
        assert!(placeholder.generation.is_some());

        let file = model.get_object("a/b.txt").await.unwrap();
        assert_eq!(file.size, Some(7));

        let err = model.get_object("missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_update_model_is_idempotent() {
        let (_, mut model) = setup(&["x", "y/z", "y/w/", "v/u/t"], 2);
        model.update_model().await.unwrap();
        let first = model.snapshot().clone();
        model.update_model().await.unwrap();
        assert_eq!(&first, model.snapshot());
    }

    #[tokio::test(start_paused = true)]
    async fn test_staleness_controls_refresh() {
        let (storage, model) = setup(&["a/b.txt"], 1000);
        let mut model = model.with_staleness(Duration::from_secs(60));

        assert!(model.object_exists("a/b.txt").await.unwrap());
        assert_eq!(storage.calls().list_objects, 1);

        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(model.object_exists("a").await.unwrap());
        assert!(model.is_container("a").await.unwrap());
        assert_eq!(storage.calls().list_objects, 1);

        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(model.object_exists("a/b.txt").await.unwrap());
        assert!(model.is_real("a/b.txt").await.unwrap());
        assert_eq!(storage.calls().list_objects, 2);
    }

    #[tokio::test]
    async fn test_refresh_sees_remote_changes() {
        let (storage, mut model) = setup(&["a"], 1000);
        assert!(!model.object_exists("b").await.unwrap());

        storage.put("b", "b", b"new");
        assert!(!model.object_exists("b").await.unwrap());

        model.invalidate();
        assert!(model.object_exists("b").await.unwrap());
    }

    #[tokio::test]
    async fn test_truncated_lookup_is_fetched_once() {
        // One entry per page: only "a" lands in the snapshot.
        let (storage, mut model) = setup(&["a", "m", "z"], 1);
        model.update_model().await.unwrap();
        assert!(model.snapshot().is_truncated());
        storage.reset_calls();

        assert!(model.object_exists("z").await.unwrap());
        assert_eq!(storage.calls().get_object, 1);

        assert!(model.object_exists("z").await.unwrap());
        assert!(model.is_real("z").await.unwrap());
        assert_eq!(storage.calls().get_object, 1);

        assert!(!model.object_exists("absent").await.unwrap());
        assert!(!model.object_exists("absent").await.unwrap());
        assert_eq!(storage.calls().get_object, 2);
        assert_eq!(storage.calls().list_objects, 0);
    }

    #[tokio::test]
    async fn test_truncated_container_queries_go_live() {
        let (storage, mut model) = setup(&["a", "deep/x/y", "late/"], 1);
        model.update_model().await.unwrap();
        storage.reset_calls();

        assert!(model.is_container("deep").await.unwrap());
        assert!(model.has_children("deep").await.unwrap());
        assert!(model.is_container("late").await.unwrap());
        assert!(!model.has_children("late").await.unwrap());
        assert!(!model.is_container("nothing").await.unwrap());
        assert_eq!(storage.calls().list_objects, 5);
    }

    #[tokio::test]
    async fn test_add_object_answers_without_fetch() {
        let (storage, mut model) = setup(&["a", "z"], 1);
        model.update_model().await.unwrap();
        storage.reset_calls();

        model.add_object(ObjectRecord::new("b", "seen/elsewhere"));
        assert!(model.object_exists("seen/elsewhere").await.unwrap());
        assert!(model.is_container("seen").await.unwrap());
        assert_eq!(storage.calls().get_object, 0);
        assert_eq!(storage.calls().list_objects, 0);
    }
}
