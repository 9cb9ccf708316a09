//! In-process [`StorageApi`] for exercising the drive without a network.
//!
//! Listing honors prefix, delimiter, page token and page size the way the
//!  storage JSON API does, every call is counted, and failures can be
//!  injected per project or per object.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use bytes::Bytes;
use http::StatusCode;
use parking_lot::Mutex;
use time::OffsetDateTime;

use crate::path::SEPARATOR;
use crate::storage::{
    Bucket, ListObjectsRequest, ObjectListPage, ObjectRecord, Project, StorageApi, StorageError,
};

/// Default page size of the storage JSON API.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// How many times each backend method was called.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub list_projects: usize,
    pub list_buckets: usize,
    pub get_bucket: usize,
    pub insert_bucket: usize,
    pub delete_bucket: usize,
    pub list_objects: usize,
    pub get_object: usize,
    pub insert_object: usize,
    pub copy_object: usize,
    pub delete_object: usize,
    pub download_object: usize,
}

struct StoredBucket {
    project: String,
    bucket: Bucket,
    objects: BTreeMap<String, (ObjectRecord, Bytes)>,
}

#[derive(Default)]
struct Inner {
    projects: BTreeMap<String, Project>,
    buckets: BTreeMap<String, StoredBucket>,
    forbidden_projects: BTreeSet<String>,
    failing_deletes: BTreeSet<(String, String)>,
    failing_copies: BTreeSet<(String, String)>,
    failing_project_listing: bool,
    generation: i64,
}

enum Entry<'a> {
    Item(&'a ObjectRecord),
    Prefix(String),
}

impl Entry<'_> {
    fn key(&self) -> &str {
        match self {
            Entry::Item(record) => &record.name,
            Entry::Prefix(prefix) => prefix,
        }
    }
}

pub struct MemoryStorage {
    inner: Mutex<Inner>,
    calls: Mutex<CallCounts>,
    deletes_in_flight: AtomicUsize,
    peak_deletes_in_flight: AtomicUsize,
    page_size: usize,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            calls: Mutex::new(CallCounts::default()),
            deletes_in_flight: AtomicUsize::new(0),
            peak_deletes_in_flight: AtomicUsize::new(0),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Cap every listing page at `page_size` entries.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn add_project(&self, project: &str) {
        self.inner
            .lock()
            .projects
            .insert(project.to_string(), Project::new(project));
    }

    /// Create a bucket, creating its project if needed.
    pub fn add_bucket(&self, project: &str, bucket: &str) {
        let mut inner = self.inner.lock();
        inner
            .projects
            .entry(project.to_string())
            .or_insert_with(|| Project::new(project));
        inner.buckets.insert(
            bucket.to_string(),
            StoredBucket {
                project: project.to_string(),
                bucket: Bucket::new(bucket),
                objects: BTreeMap::new(),
            },
        );
    }

    /// Store an object directly, bypassing call counting.
    pub fn put(&self, bucket: &str, name: &str, data: &[u8]) {
        let mut inner = self.inner.lock();
        let _ = inner.store(bucket, name, None, Bytes::copy_from_slice(data));
    }

    /// Listing a forbidden project's buckets (or getting one) fails with 403.
    pub fn forbid_project(&self, project: &str) {
        self.inner
            .lock()
            .forbidden_projects
            .insert(project.to_string());
    }

    /// Deleting this object fails with a 503 until the store is dropped.
    pub fn fail_delete_of(&self, bucket: &str, name: &str) {
        self.inner
            .lock()
            .failing_deletes
            .insert((bucket.to_string(), name.to_string()));
    }

    /// Copying from this object fails with a 503 until the store is dropped.
    pub fn fail_copy_of(&self, bucket: &str, name: &str) {
        self.inner
            .lock()
            .failing_copies
            .insert((bucket.to_string(), name.to_string()));
    }

    /// Listing projects fails with a 503 until the store is dropped.
    pub fn fail_project_listing(&self) {
        self.inner.lock().failing_project_listing = true;
    }

    /// Most object deletes ever in flight at once.
    pub fn peak_concurrent_deletes(&self) -> usize {
        self.peak_deletes_in_flight.load(Ordering::SeqCst)
    }

    pub fn has_bucket(&self, bucket: &str) -> bool {
        self.inner.lock().buckets.contains_key(bucket)
    }

    pub fn object_names(&self, bucket: &str) -> Vec<String> {
        self.inner
            .lock()
            .buckets
            .get(bucket)
            .map(|stored| stored.objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn content(&self, bucket: &str, name: &str) -> Option<Bytes> {
        self.inner
            .lock()
            .buckets
            .get(bucket)
            .and_then(|stored| stored.objects.get(name))
            .map(|(_, data)| data.clone())
    }

    pub fn calls(&self) -> CallCounts {
        *self.calls.lock()
    }

    pub fn reset_calls(&self) {
        *self.calls.lock() = CallCounts::default();
    }

    fn count(&self, f: impl FnOnce(&mut CallCounts)) {
        f(&mut *self.calls.lock());
    }
}

impl Inner {
    fn bucket(&self, bucket: &str) -> Result<&StoredBucket, StorageError> {
        let stored = self
            .buckets
            .get(bucket)
            .ok_or_else(|| StorageError::NotFound(format!("bucket {}", bucket)))?;
        if self.forbidden_projects.contains(&stored.project) {
            return Err(StorageError::Forbidden(format!("bucket {}", bucket)));
        }
        Ok(stored)
    }

    fn bucket_mut(&mut self, bucket: &str) -> Result<&mut StoredBucket, StorageError> {
        self.bucket(bucket)?;
        self.buckets
            .get_mut(bucket)
            .ok_or_else(|| StorageError::NotFound(format!("bucket {}", bucket)))
    }

    fn store(
        &mut self,
        bucket: &str,
        name: &str,
        content_type: Option<&str>,
        data: Bytes,
    ) -> Result<ObjectRecord, StorageError> {
        self.generation += 1;
        let generation = self.generation;
        let stored = self.bucket_mut(bucket)?;

        let mut record = ObjectRecord::new(bucket, name);
        record.content_type = Some(
            content_type
                .unwrap_or("application/octet-stream")
                .to_string(),
        );
        record.size = Some(data.len() as u64);
        record.generation = Some(generation);
        record.metageneration = Some(1);
        record.storage_class = Some("STANDARD".to_string());
        let now = OffsetDateTime::now_utc();
        record.time_created = Some(now);
        record.updated = Some(now);

        stored
            .objects
            .insert(name.to_string(), (record.clone(), data));
        Ok(record)
    }

    fn page(
        &self,
        request: &ListObjectsRequest,
        page_size: usize,
    ) -> Result<ObjectListPage, StorageError> {
        let stored = self.bucket(&request.bucket)?;
        let prefix = request.prefix.as_deref().unwrap_or("");

        let mut entries: Vec<Entry<'_>> = Vec::new();
        for (name, (record, _)) in stored.objects.range(prefix.to_string()..) {
            let Some(rest) = name.strip_prefix(prefix) else {
                break;
            };
            let folded = request
                .delimiter
                .as_deref()
                .and_then(|delimiter| rest.find(delimiter).map(|at| at + delimiter.len()))
                .map(|end| format!("{}{}", prefix, &rest[..end]));
            match folded {
                Some(group) => {
                    if !matches!(entries.last(), Some(Entry::Prefix(last)) if *last == group) {
                        entries.push(Entry::Prefix(group));
                    }
                }
                None => entries.push(Entry::Item(record)),
            }
        }

        let limit = request
            .max_results
            .map(|max| (max as usize).clamp(1, page_size))
            .unwrap_or(page_size);
        let remaining: Vec<Entry<'_>> = entries
            .into_iter()
            .filter(|entry| match &request.page_token {
                Some(token) => entry.key() > token.as_str(),
                None => true,
            })
            .collect();

        let mut page = ObjectListPage::default();
        if remaining.len() > limit {
            page.next_page_token = Some(remaining[limit - 1].key().to_string());
        }
        for entry in remaining.into_iter().take(limit) {
            match entry {
                Entry::Item(record) => page.items.push(record.clone()),
                Entry::Prefix(prefix) => page.prefixes.push(prefix),
            }
        }
        Ok(page)
    }
}

#[async_trait::async_trait]
impl StorageApi for MemoryStorage {
    async fn list_projects(&self) -> Result<Vec<Project>, StorageError> {
        self.count(|calls| calls.list_projects += 1);
        let inner = self.inner.lock();
        if inner.failing_project_listing {
            return Err(StorageError::from_status(
                StatusCode::SERVICE_UNAVAILABLE,
                "injected failure listing projects",
            ));
        }
        Ok(inner.projects.values().cloned().collect())
    }

    async fn list_buckets(&self, project: &str) -> Result<Vec<Bucket>, StorageError> {
        self.count(|calls| calls.list_buckets += 1);
        let inner = self.inner.lock();
        if !inner.projects.contains_key(project) {
            return Err(StorageError::NotFound(format!("project {}", project)));
        }
        if inner.forbidden_projects.contains(project) {
            return Err(StorageError::Forbidden(format!("project {}", project)));
        }
        Ok(inner
            .buckets
            .values()
            .filter(|stored| stored.project == project)
            .map(|stored| stored.bucket.clone())
            .collect())
    }

    async fn get_bucket(&self, bucket: &str) -> Result<Bucket, StorageError> {
        self.count(|calls| calls.get_bucket += 1);
        Ok(self.inner.lock().bucket(bucket)?.bucket.clone())
    }

    async fn insert_bucket(&self, project: &str, bucket: &str) -> Result<Bucket, StorageError> {
        self.count(|calls| calls.insert_bucket += 1);
        {
            let inner = self.inner.lock();
            if !inner.projects.contains_key(project) {
                return Err(StorageError::NotFound(format!("project {}", project)));
            }
            if inner.buckets.contains_key(bucket) {
                return Err(StorageError::Conflict(format!("bucket {} already exists", bucket)));
            }
        }
        self.add_bucket(project, bucket);
        Ok(Bucket::new(bucket))
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<(), StorageError> {
        self.count(|calls| calls.delete_bucket += 1);
        let mut inner = self.inner.lock();
        if !inner.bucket(bucket)?.objects.is_empty() {
            return Err(StorageError::Conflict(format!("bucket {} is not empty", bucket)));
        }
        inner.buckets.remove(bucket);
        Ok(())
    }

    async fn list_objects(
        &self,
        request: &ListObjectsRequest,
    ) -> Result<ObjectListPage, StorageError> {
        self.count(|calls| calls.list_objects += 1);
        self.inner.lock().page(request, self.page_size)
    }

    async fn get_object(&self, bucket: &str, name: &str) -> Result<ObjectRecord, StorageError> {
        self.count(|calls| calls.get_object += 1);
        let inner = self.inner.lock();
        inner
            .bucket(bucket)?
            .objects
            .get(name)
            .map(|(record, _)| record.clone())
            .ok_or_else(|| StorageError::NotFound(format!("{}{}{}", bucket, SEPARATOR, name)))
    }

    async fn insert_object(
        &self,
        bucket: &str,
        name: &str,
        content_type: Option<&str>,
        data: Bytes,
    ) -> Result<ObjectRecord, StorageError> {
        self.count(|calls| calls.insert_object += 1);
        self.inner.lock().store(bucket, name, content_type, data)
    }

    async fn copy_object(
        &self,
        source_bucket: &str,
        source_name: &str,
        destination_bucket: &str,
        destination_name: &str,
    ) -> Result<ObjectRecord, StorageError> {
        self.count(|calls| calls.copy_object += 1);
        let mut inner = self.inner.lock();
        if inner
            .failing_copies
            .contains(&(source_bucket.to_string(), source_name.to_string()))
        {
            return Err(StorageError::from_status(
                StatusCode::SERVICE_UNAVAILABLE,
                format!("injected failure copying {}", source_name),
            ));
        }
        let (record, data) = inner
            .bucket(source_bucket)?
            .objects
            .get(source_name)
            .cloned()
            .ok_or_else(|| {
                StorageError::NotFound(format!("{}{}{}", source_bucket, SEPARATOR, source_name))
            })?;
        inner.store(
            destination_bucket,
            destination_name,
            record.content_type.as_deref(),
            data,
        )
    }

    async fn delete_object(&self, bucket: &str, name: &str) -> Result<(), StorageError> {
        self.count(|calls| calls.delete_object += 1);
        // stay in flight across one yield so overlapping deletes are visible
        let in_flight = self.deletes_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_deletes_in_flight.fetch_max(in_flight, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.deletes_in_flight.fetch_sub(1, Ordering::SeqCst);

        let mut inner = self.inner.lock();
        if inner
            .failing_deletes
            .contains(&(bucket.to_string(), name.to_string()))
        {
            return Err(StorageError::from_status(
                StatusCode::SERVICE_UNAVAILABLE,
                format!("injected failure deleting {}", name),
            ));
        }
        inner
            .bucket_mut(bucket)?
            .objects
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(format!("{}{}{}", bucket, SEPARATOR, name)))
    }

    async fn download_object(&self, bucket: &str, name: &str) -> Result<Bytes, StorageError> {
        self.count(|calls| calls.download_object += 1);
        self.content(bucket, name)
            .ok_or_else(|| StorageError::NotFound(format!("{}{}{}", bucket, SEPARATOR, name)))
    }
}
