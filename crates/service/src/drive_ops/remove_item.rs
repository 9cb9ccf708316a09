use futures::stream::{self, StreamExt};

use common::prelude::*;

use crate::confirm::{Confirm, ConfirmSession};
use crate::DriveState;

use super::error::DriveOpsError;
use super::listing::list_all;
use super::types::{RemoveOptions, RemoveOutcome};

/// Object deletes kept in flight while emptying a bucket.
pub(crate) const PURGE_CONCURRENCY: usize = 32;

/// Remove a bucket, a folder with its contents, or a single object.
///
/// A bucket is deleted directly first. If it is not empty and `recurse` is
///  set, every object is deleted (after one confirmation) and the bucket
///  delete is retried. A folder is removed object by object, asking before
///  each one unless told otherwise, then its placeholder goes last.
pub async fn remove_item(
    path: &str,
    options: RemoveOptions,
    prompter: &mut dyn Confirm,
    state: &DriveState,
) -> Result<RemoveOutcome, DriveOpsError> {
    let mut session = ConfirmSession::new(prompter, options.force);
    let outcome = match VirtualPath::parse(path) {
        VirtualPath::Drive => {
            return Err(DriveOpsError::InvalidOperation(
                "cannot remove the drive root".to_string(),
            ))
        }
        VirtualPath::Bucket(bucket) => {
            let outcome = remove_bucket(&bucket, options, &mut session, state).await;
            state.invalidate(true).await;
            outcome?
        }
        VirtualPath::Object { bucket, key } => {
            let outcome = remove_object(path, &bucket, &key, options, &mut session, state).await;
            state.invalidate(false).await;
            outcome?
        }
    };

    tracing::info!(
        path,
        removed = outcome.objects_removed,
        skipped = outcome.objects_skipped,
        bucket_removed = outcome.bucket_removed,
        "removed"
    );
    Ok(outcome)
}

async fn remove_bucket(
    bucket: &str,
    options: RemoveOptions,
    session: &mut ConfirmSession<'_>,
    state: &DriveState,
) -> Result<RemoveOutcome, DriveOpsError> {
    let mut outcome = RemoveOutcome::default();
    match state.api().delete_bucket(bucket).await {
        Ok(()) => {
            outcome.bucket_removed = true;
            return Ok(outcome);
        }
        Err(StorageError::NotFound(_)) => {
            return Err(DriveOpsError::ItemNotFound(bucket.to_string()))
        }
        Err(StorageError::Conflict(message)) if options.recurse => {
            tracing::debug!(bucket, "bucket not empty, removing objects: {}", message);
        }
        Err(e) => return Err(e.into()),
    }

    let names: Vec<String> = list_all(bucket, "", false, state)
        .await?
        .items
        .into_iter()
        .map(|record| record.name)
        .collect();

    let query = format!(
        "Bucket {} still holds {} objects. Delete all of them and the bucket?",
        bucket,
        names.len()
    );
    if !session.should_continue(&query, "Confirm bucket removal") {
        outcome.objects_skipped = names.len();
        return Ok(outcome);
    }

    let failed = purge(bucket, &names, &mut outcome, state).await?;
    match state.api().delete_bucket(bucket).await {
        Ok(()) => {
            outcome.bucket_removed = true;
            Ok(outcome)
        }
        Err(source) if failed > 0 => Err(DriveOpsError::PurgeFailed {
            bucket: bucket.to_string(),
            failed,
            source,
        }),
        Err(e) => Err(e.into()),
    }
}

/// Delete `names` with up to [`PURGE_CONCURRENCY`] requests in flight,
///  logging progress every 10%. Failures are logged and counted but do not
///  stop the others.
async fn purge(
    bucket: &str,
    names: &[String],
    outcome: &mut RemoveOutcome,
    state: &DriveState,
) -> Result<usize, DriveOpsError> {
    let total = names.len();
    let api = state.api();
    let deletes: Vec<_> = names
        .iter()
        .map(|name| async move { (name, api.delete_object(bucket, name).await) })
        .collect();
    let mut pending = stream::iter(deletes).buffer_unordered(PURGE_CONCURRENCY);

    let mut done = 0;
    let mut failed = 0;
    let mut reported = 0;
    while let Some((name, result)) = pending.next().await {
        if state.is_stopping() {
            return Err(DriveOpsError::Stopped);
        }
        done += 1;
        match result {
            Ok(()) => outcome.objects_removed += 1,
            Err(e) => {
                failed += 1;
                tracing::warn!(bucket, name = %name, "failed to delete object: {}", e);
            }
        }
        let percent = done * 100 / total;
        if percent / 10 > reported / 10 {
            reported = percent;
            tracing::info!(bucket, "{}% of {} objects deleted", percent, total);
        }
    }
    Ok(failed)
}

async fn remove_object(
    path: &str,
    bucket: &str,
    key: &str,
    options: RemoveOptions,
    session: &mut ConfirmSession<'_>,
    state: &DriveState,
) -> Result<RemoveOutcome, DriveOpsError> {
    let (container, children) = {
        let model = state.models().model(bucket);
        let mut model = model.lock().await;
        let container = Lookup::from_result(model.is_container(key).await)?
            .into_option()
            .unwrap_or(false);
        let children = container
            && Lookup::from_result(model.has_children(key).await)?
                .into_option()
                .unwrap_or(false);
        (container, children)
    };

    let mut outcome = RemoveOutcome::default();
    if !container {
        state
            .api()
            .delete_object(bucket, key)
            .await
            .map_err(DriveOpsError::not_found_as_item(path))?;
        outcome.objects_removed = 1;
        return Ok(outcome);
    }

    if children && !options.recurse {
        let query = format!(
            "{} has children and recurse was not given. Remove it and everything beneath it?",
            path
        );
        if !session.should_continue(&query, "Confirm folder removal") {
            return Err(DriveOpsError::ContainerRequiresRecurse(path.to_string()));
        }
    }

    let placeholder = VirtualPath::join(bucket, key).child_prefix();
    let listing = list_all(bucket, &placeholder, false, state).await?;
    let mut has_placeholder = false;
    for record in listing.items {
        if record.name == placeholder {
            has_placeholder = true;
            continue;
        }
        if state.is_stopping() {
            return Err(DriveOpsError::Stopped);
        }
        let query = format!("Remove {}{}{}?", bucket, SEPARATOR, record.name);
        if !session.should_continue(&query, "Confirm") {
            outcome.objects_skipped += 1;
            continue;
        }
        delete_if_present(bucket, &record.name, state).await?;
        outcome.objects_removed += 1;
    }

    if has_placeholder && outcome.objects_skipped == 0 {
        delete_if_present(bucket, &placeholder, state).await?;
        outcome.objects_removed += 1;
    }
    Ok(outcome)
}

async fn delete_if_present(
    bucket: &str,
    name: &str,
    state: &DriveState,
) -> Result<(), DriveOpsError> {
    match state.api().delete_object(bucket, name).await {
        Ok(()) | Err(StorageError::NotFound(_)) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use common::testkit::MemoryStorage;

    use super::*;
    use crate::confirm::{AlwaysConfirm, Confirmation};
    use crate::ServiceConfig;

    struct Answer(Confirmation, usize);

    impl Confirm for Answer {
        fn confirm(&mut self, _query: &str, _caption: &str) -> Confirmation {
            self.1 += 1;
            self.0
        }
    }

    fn state() -> (Arc<MemoryStorage>, DriveState) {
        let storage = Arc::new(MemoryStorage::new());
        storage.add_bucket("proj", "b");
        for name in ["keep.txt", "dir/", "dir/a.txt", "dir/sub/b.txt", "empty/"] {
            storage.put("b", name, name.as_bytes());
        }
        let state = DriveState::with_api(storage.clone(), &ServiceConfig::default());
        (storage, state)
    }

    #[tokio::test]
    async fn test_remove_plain_object() {
        let (storage, state) = state();
        let outcome = remove_item(
            "b/keep.txt",
            RemoveOptions::default(),
            &mut AlwaysConfirm,
            &state,
        )
        .await
        .unwrap();
        assert_eq!(outcome.objects_removed, 1);
        assert!(!storage.object_names("b").contains(&"keep.txt".to_string()));

        let again = remove_item(
            "b/keep.txt",
            RemoveOptions::default(),
            &mut AlwaysConfirm,
            &state,
        )
        .await;
        assert!(matches!(again, Err(DriveOpsError::ItemNotFound(_))));
    }

    #[tokio::test]
    async fn test_remove_folder_with_yes_to_all() {
        let (storage, state) = state();
        let mut prompter = Answer(Confirmation::YesToAll, 0);
        let options = RemoveOptions {
            recurse: true,
            force: false,
        };
        let outcome = remove_item("b/dir", options, &mut prompter, &state)
            .await
            .unwrap();
        assert_eq!(outcome.objects_removed, 3);
        assert_eq!(prompter.1, 1);
        assert_eq!(storage.object_names("b"), vec!["empty/", "keep.txt"]);
    }

    #[tokio::test]
    async fn test_remove_folder_declined() {
        let (storage, state) = state();
        let mut prompter = Answer(Confirmation::No, 0);
        let result = remove_item("b/dir", RemoveOptions::default(), &mut prompter, &state).await;
        assert!(matches!(
            result,
            Err(DriveOpsError::ContainerRequiresRecurse(_))
        ));
        assert_eq!(storage.object_names("b").len(), 5);
    }

    #[tokio::test]
    async fn test_remove_folder_no_to_all_keeps_placeholder() {
        let (storage, state) = state();
        let mut prompter = Answer(Confirmation::NoToAll, 0);
        let options = RemoveOptions {
            recurse: true,
            force: false,
        };
        let outcome = remove_item("b/dir", options, &mut prompter, &state)
            .await
            .unwrap();
        assert_eq!(outcome.objects_skipped, 2);
        assert_eq!(outcome.objects_removed, 0);
        assert_eq!(prompter.1, 1);
        assert_eq!(storage.object_names("b").len(), 5);
    }

    #[tokio::test]
    async fn test_remove_empty_folder() {
        let (storage, state) = state();
        let outcome = remove_item(
            "b/empty",
            RemoveOptions::default(),
            &mut AlwaysConfirm,
            &state,
        )
        .await
        .unwrap();
        assert_eq!(outcome.objects_removed, 1);
        assert!(!storage.object_names("b").contains(&"empty/".to_string()));
    }

    #[tokio::test]
    async fn test_remove_non_empty_bucket_without_recurse() {
        let (storage, state) = state();
        let result = remove_item("b", RemoveOptions::default(), &mut AlwaysConfirm, &state).await;
        assert!(matches!(
            result,
            Err(DriveOpsError::Storage(StorageError::Conflict(_)))
        ));
        assert!(storage.has_bucket("b"));
    }

    #[tokio::test]
    async fn test_remove_bucket_batch_confirmation_declined() {
        let (storage, state) = state();
        let mut prompter = Answer(Confirmation::No, 0);
        let options = RemoveOptions {
            recurse: true,
            force: false,
        };
        let outcome = remove_item("b", options, &mut prompter, &state)
            .await
            .unwrap();
        assert!(!outcome.bucket_removed);
        assert_eq!(outcome.objects_skipped, 5);
        assert_eq!(storage.calls().delete_object, 0);
        assert!(storage.has_bucket("b"));
    }

    #[tokio::test]
    async fn test_purge_failure_is_reported() {
        let (storage, state) = state();
        storage.fail_delete_of("b", "dir/a.txt");
        let options = RemoveOptions {
            recurse: true,
            force: true,
        };
        let result = remove_item("b", options, &mut AlwaysConfirm, &state).await;
        match result {
            Err(DriveOpsError::PurgeFailed { bucket, failed, source }) => {
                assert_eq!(bucket, "b");
                assert_eq!(failed, 1);
                assert!(source.is_conflict());
            }
            other => panic!("unexpected result {:?}", other),
        }
        assert_eq!(storage.object_names("b"), vec!["dir/a.txt"]);
    }

    #[tokio::test]
    async fn test_purge_bounds_concurrent_deletes() {
        let storage = Arc::new(MemoryStorage::new());
        storage.add_bucket("proj", "big");
        for i in 0..100 {
            storage.put("big", &format!("obj-{:03}", i), b"x");
        }
        let state = DriveState::with_api(storage.clone(), &ServiceConfig::default());
        let options = RemoveOptions {
            recurse: true,
            force: true,
        };
        let outcome = remove_item("big", options, &mut AlwaysConfirm, &state)
            .await
            .unwrap();
        assert!(outcome.bucket_removed);
        assert_eq!(outcome.objects_removed, 100);
        assert_eq!(storage.peak_concurrent_deletes(), PURGE_CONCURRENCY);
    }
}
