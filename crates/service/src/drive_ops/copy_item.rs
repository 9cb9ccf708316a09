use common::prelude::*;

use crate::DriveState;

use super::error::DriveOpsError;
use super::listing::list_all;
use super::types::CopyOptions;

/// Copy an object, or with `recurse` a bucket or folder, to `destination`.
///
/// A single object copied onto a bucket or an existing folder keeps its
///  name. A recursive copy places every descendant at the same relative
///  path under `destination`. Returns the records of the new objects.
pub async fn copy_item(
    source: &str,
    destination: &str,
    options: CopyOptions,
    state: &DriveState,
) -> Result<Vec<ObjectRecord>, DriveOpsError> {
    let source_path = VirtualPath::parse(source);
    let destination_path = VirtualPath::parse(destination);
    let (Some(source_bucket), Some(_)) =
        (source_path.bucket(), destination_path.bucket())
    else {
        return Err(DriveOpsError::InvalidOperation(
            "cannot copy to or from the drive root".to_string(),
        ));
    };

    let source_is_container = match source_path.key() {
        None => true,
        Some(key) => {
            let model = state.models().model(source_bucket);
            let container = model.lock().await.is_container(key).await;
            Lookup::from_result(container)?
                .into_option()
                .unwrap_or(false)
        }
    };

    let copied = if source_is_container {
        if !options.recurse {
            return Err(DriveOpsError::ContainerRequiresRecurse(source.to_string()));
        }
        copy_tree(&source_path, &destination_path, state).await
    } else {
        copy_one(source, &source_path, &destination_path, state).await
    };
    // some copies may have landed before a failure
    state.invalidate(false).await;
    let copied = copied?;

    tracing::info!(
        source = %source_path,
        destination = %destination_path,
        objects = copied.len(),
        "copied"
    );
    Ok(copied)
}

async fn copy_one(
    source: &str,
    source_path: &VirtualPath,
    destination_path: &VirtualPath,
    state: &DriveState,
) -> Result<Vec<ObjectRecord>, DriveOpsError> {
    let source_bucket = source_path.bucket().unwrap_or_default();
    let destination_bucket = destination_path.bucket().unwrap_or_default();
    let source_key = source_path.key().unwrap_or_default();
    let destination_key = single_destination(source_key, destination_path, state).await?;
    let record = state
        .api()
        .copy_object(source_bucket, source_key, destination_bucket, &destination_key)
        .await
        .map_err(DriveOpsError::not_found_as_item(source))?;
    Ok(vec![record])
}

async fn single_destination(
    source_key: &str,
    destination: &VirtualPath,
    state: &DriveState,
) -> Result<String, DriveOpsError> {
    let file_name = source_key
        .rsplit_once(SEPARATOR)
        .map(|(_, name)| name)
        .unwrap_or(source_key);

    match destination {
        VirtualPath::Object { bucket, key } => {
            let model = state.models().model(bucket);
            let container = model.lock().await.is_container(key).await;
            let into_folder = Lookup::from_result(container)?
                .into_option()
                .unwrap_or(false);
            if into_folder || key.ends_with(SEPARATOR) {
                Ok(format!("{}{}", destination.child_prefix(), file_name))
            } else {
                Ok(key.clone())
            }
        }
        _ => Ok(file_name.to_string()),
    }
}

async fn copy_tree(
    source: &VirtualPath,
    destination: &VirtualPath,
    state: &DriveState,
) -> Result<Vec<ObjectRecord>, DriveOpsError> {
    let source_bucket = source.bucket().unwrap_or_default();
    let destination_bucket = destination.bucket().unwrap_or_default();
    let source_prefix = source.child_prefix();
    let destination_prefix = destination.child_prefix();

    let listing = list_all(source_bucket, &source_prefix, false, state).await?;
    let mut copied = Vec::with_capacity(listing.items.len());
    for record in listing.items {
        if state.is_stopping() {
            return Err(DriveOpsError::Stopped);
        }
        let relative = record
            .name
            .strip_prefix(source_prefix.as_str())
            .unwrap_or(&record.name);
        let destination_name = format!("{}{}", destination_prefix, relative);
        if destination_name.is_empty() {
            continue;
        }
        tracing::debug!(from = %record.name, to = %destination_name, "copying object");
        copied.push(
            state
                .api()
                .copy_object(
                    source_bucket,
                    &record.name,
                    destination_bucket,
                    &destination_name,
                )
                .await?,
        );
    }
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use common::testkit::MemoryStorage;

    use super::*;
    use crate::drive_ops::item_exists;
    use crate::ServiceConfig;

    fn state() -> (Arc<MemoryStorage>, DriveState) {
        let storage = Arc::new(MemoryStorage::new());
        storage.add_bucket("proj", "src");
        storage.add_bucket("proj", "dst");
        for name in ["file.txt", "dir/", "dir/a.txt", "dir/sub/b.txt"] {
            storage.put("src", name, name.as_bytes());
        }
        storage.put("dst", "existing/", b"");
        let state = DriveState::with_api(storage.clone(), &ServiceConfig::default());
        (storage, state)
    }

    #[tokio::test]
    async fn test_copy_single_object() {
        let (storage, state) = state();
        copy_item("src/file.txt", "dst/renamed.txt", CopyOptions::default(), &state)
            .await
            .unwrap();
        copy_item("src/dir/a.txt", "dst", CopyOptions::default(), &state)
            .await
            .unwrap();
        copy_item("src/file.txt", "dst/existing", CopyOptions::default(), &state)
            .await
            .unwrap();
        assert_eq!(
            storage.object_names("dst"),
            vec!["a.txt", "existing/", "existing/file.txt", "renamed.txt"]
        );
    }

    #[tokio::test]
    async fn test_copy_folder_requires_recurse() {
        let (_, state) = state();
        assert!(matches!(
            copy_item("src/dir", "dst/copy", CopyOptions::default(), &state).await,
            Err(DriveOpsError::ContainerRequiresRecurse(_))
        ));
    }

    #[tokio::test]
    async fn test_copy_folder_preserves_relative_paths() {
        let (storage, state) = state();
        let copied = copy_item("src/dir", "dst/copy", CopyOptions { recurse: true }, &state)
            .await
            .unwrap();
        assert_eq!(copied.len(), 3);
        assert_eq!(storage.calls().copy_object, 3);
        assert_eq!(
            storage.object_names("dst"),
            vec!["copy/", "copy/a.txt", "copy/sub/b.txt", "existing/"]
        );
        assert_eq!(storage.content("dst", "copy/sub/b.txt").unwrap(), "dir/sub/b.txt");
    }

    #[tokio::test]
    async fn test_copy_bucket_into_bucket() {
        let (storage, state) = state();
        copy_item("src", "dst", CopyOptions { recurse: true }, &state)
            .await
            .unwrap();
        assert_eq!(
            storage.object_names("dst"),
            vec!["dir/", "dir/a.txt", "dir/sub/b.txt", "existing/", "file.txt"]
        );
    }

    #[tokio::test]
    async fn test_failed_copy_still_invalidates() {
        let (storage, state) = state();
        storage.fail_copy_of("src", "dir/sub/b.txt");
        assert!(!item_exists("dst/copy/a.txt", &state).await.unwrap());

        let result = copy_item("src/dir", "dst/copy", CopyOptions { recurse: true }, &state).await;
        assert!(matches!(result, Err(DriveOpsError::Storage(_))));
        assert!(storage.content("dst", "copy/a.txt").is_some());
        assert!(item_exists("dst/copy/a.txt", &state).await.unwrap());
    }

    #[tokio::test]
    async fn test_copy_missing_source() {
        let (_, state) = state();
        assert!(matches!(
            copy_item("src/nope.txt", "dst", CopyOptions::default(), &state).await,
            Err(DriveOpsError::ItemNotFound(_))
        ));
    }
}
