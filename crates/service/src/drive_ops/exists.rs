use common::prelude::*;

use crate::DriveState;

use super::error::DriveOpsError;

/// Whether anything lives at `path`.
pub async fn item_exists(path: &str, state: &DriveState) -> Result<bool, DriveOpsError> {
    match VirtualPath::parse(path) {
        VirtualPath::Drive => Ok(true),
        VirtualPath::Bucket(bucket) => bucket_exists(&bucket, state).await,
        VirtualPath::Object { bucket, key } => {
            let model = state.models().model(&bucket);
            let result = model.lock().await.object_exists(&key).await;
            absent_as_false(result)
        }
    }
}

/// Whether `path` can hold children: the drive, a bucket, or a folder.
pub async fn is_container(path: &str, state: &DriveState) -> Result<bool, DriveOpsError> {
    match VirtualPath::parse(path) {
        VirtualPath::Drive => Ok(true),
        VirtualPath::Bucket(bucket) => bucket_exists(&bucket, state).await,
        VirtualPath::Object { bucket, key } => {
            let model = state.models().model(&bucket);
            let result = model.lock().await.is_container(&key).await;
            absent_as_false(result)
        }
    }
}

pub async fn has_children(path: &str, state: &DriveState) -> Result<bool, DriveOpsError> {
    let (bucket, key) = match VirtualPath::parse(path) {
        VirtualPath::Drive => {
            let buckets = state.buckets().buckets(state.api().as_ref()).await?;
            return Ok(!buckets.is_empty());
        }
        VirtualPath::Bucket(bucket) => (bucket, String::new()),
        VirtualPath::Object { bucket, key } => (bucket, key),
    };
    let model = state.models().model(&bucket);
    let result = model.lock().await.has_children(&key).await;
    absent_as_false(result)
}

/// Probe a bucket, answering from the drive's bucket cache when it is fresh.
///  A bucket owned by someone else still exists.
pub(crate) async fn bucket_exists(bucket: &str, state: &DriveState) -> Result<bool, DriveOpsError> {
    if state.buckets().contains(bucket).await == Some(true) {
        return Ok(true);
    }
    match state.api().get_bucket(bucket).await {
        Ok(_) => Ok(true),
        Err(StorageError::NotFound(_)) => Ok(false),
        Err(StorageError::Forbidden(message)) => {
            tracing::debug!(bucket, "bucket exists but is not accessible: {}", message);
            Ok(true)
        }
        Err(e) => Err(e.into()),
    }
}

// A missing bucket behind a model query just means the item is absent.
fn absent_as_false(result: Result<bool, StorageError>) -> Result<bool, DriveOpsError> {
    Ok(Lookup::from_result(result)?.into_option().unwrap_or(false))
}
