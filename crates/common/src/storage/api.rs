use bytes::Bytes;

use super::error::StorageError;
use super::types::{Bucket, ListObjectsRequest, ObjectListPage, ObjectRecord, Project};

/// The object storage operations the drive is built on.
///
/// Implementations are expected to be cheap to share behind an `Arc` and to
///  map remote failures onto [`StorageError`] so callers can tell a missing
///  item from a failed request.
#[async_trait::async_trait]
pub trait StorageApi: Send + Sync {
    /// Every project visible to the caller.
    async fn list_projects(&self) -> Result<Vec<Project>, StorageError>;

    /// Every bucket in `project`, all pages.
    async fn list_buckets(&self, project: &str) -> Result<Vec<Bucket>, StorageError>;

    async fn get_bucket(&self, bucket: &str) -> Result<Bucket, StorageError>;

    async fn insert_bucket(&self, project: &str, bucket: &str) -> Result<Bucket, StorageError>;

    /// Fails with [`StorageError::Conflict`] while the bucket still holds objects.
    async fn delete_bucket(&self, bucket: &str) -> Result<(), StorageError>;

    /// A single page of objects.
    async fn list_objects(
        &self,
        request: &ListObjectsRequest,
    ) -> Result<ObjectListPage, StorageError>;

    async fn get_object(&self, bucket: &str, name: &str) -> Result<ObjectRecord, StorageError>;

    async fn insert_object(
        &self,
        bucket: &str,
        name: &str,
        content_type: Option<&str>,
        data: Bytes,
    ) -> Result<ObjectRecord, StorageError>;

    async fn copy_object(
        &self,
        source_bucket: &str,
        source_name: &str,
        destination_bucket: &str,
        destination_name: &str,
    ) -> Result<ObjectRecord, StorageError>;

    async fn delete_object(&self, bucket: &str, name: &str) -> Result<(), StorageError>;

    async fn download_object(&self, bucket: &str, name: &str) -> Result<Bytes, StorageError>;
}
