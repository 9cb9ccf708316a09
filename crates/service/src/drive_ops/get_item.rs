use common::prelude::*;

use crate::DriveState;

use super::error::DriveOpsError;
use super::types::DriveItem;

/// Resolve `path` to its item. Folders without a placeholder object come
///  back as synthesized folder records.
pub async fn get_item(path: &str, state: &DriveState) -> Result<DriveItem, DriveOpsError> {
    match VirtualPath::parse(path) {
        VirtualPath::Drive => Ok(DriveItem::Drive),
        VirtualPath::Bucket(name) => {
            let project = match state.buckets().buckets(state.api().as_ref()).await {
                Ok(buckets) => buckets
                    .into_iter()
                    .find(|(_, bucket)| bucket.name == name)
                    .map(|(project, _)| project),
                Err(StorageError::Forbidden(_)) => None,
                Err(e) => {
                    tracing::warn!(bucket = %name, "could not resolve bucket project: {}", e);
                    None
                }
            };
            let bucket = state
                .api()
                .get_bucket(&name)
                .await
                .map_err(DriveOpsError::not_found_as_item(path))?;
            Ok(DriveItem::Bucket { project, bucket })
        }
        VirtualPath::Object { bucket, key } => {
            let model = state.models().model(&bucket);
            let record = model
                .lock()
                .await
                .get_object(&key)
                .await
                .map_err(DriveOpsError::not_found_as_item(path))?;
            Ok(DriveItem::Object(record))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use common::testkit::MemoryStorage;

    use super::*;
    use crate::ServiceConfig;

    fn state() -> DriveState {
        let storage = Arc::new(MemoryStorage::new());
        storage.add_bucket("proj", "b");
        storage.put("b", "dir/file.txt", b"hello");
        DriveState::with_api(storage, &ServiceConfig::default())
    }

    #[tokio::test]
    async fn test_get_items() {
        let state = state();
        assert_eq!(get_item("", &state).await.unwrap(), DriveItem::Drive);

        match get_item("b", &state).await.unwrap() {
            DriveItem::Bucket { project, bucket } => {
                assert_eq!(project.as_deref(), Some("proj"));
                assert_eq!(bucket.name, "b");
            }
            other => panic!("unexpected item {:?}", other),
        }

        match get_item("b/dir/file.txt", &state).await.unwrap() {
            DriveItem::Object(record) => assert_eq!(record.size, Some(5)),
            other => panic!("unexpected item {:?}", other),
        }

        let folder = get_item("b/dir", &state).await.unwrap();
        assert!(folder.is_container());
        assert_eq!(folder.name(), "dir");
    }

    #[tokio::test]
    async fn test_bucket_without_project_listing() {
        let storage = Arc::new(MemoryStorage::new());
        storage.add_bucket("proj", "b");
        storage.fail_project_listing();
        let state = DriveState::with_api(storage, &ServiceConfig::default());

        match get_item("b", &state).await.unwrap() {
            DriveItem::Bucket { project, bucket } => {
                assert_eq!(project, None);
                assert_eq!(bucket.name, "b");
            }
            other => panic!("unexpected item {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_items() {
        let state = state();
        assert!(matches!(
            get_item("b/nope", &state).await,
            Err(DriveOpsError::ItemNotFound(path)) if path == "b/nope"
        ));
        assert!(matches!(
            get_item("nope", &state).await,
            Err(DriveOpsError::ItemNotFound(_))
        ));
    }
}
