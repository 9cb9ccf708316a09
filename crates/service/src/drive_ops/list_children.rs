use std::collections::BTreeMap;

use common::prelude::*;

use crate::DriveState;

use super::error::DriveOpsError;
use super::get_item::get_item;
use super::listing::list_all;
use super::types::{DriveItem, ListOptions};

/// Items directly under `path`, or every descendant with `recurse`.
///
/// The drive root lists every bucket of every accessible project. Folders
///  are returned as folder records whether or not a placeholder exists. A
///  path naming a plain object yields just that object.
pub async fn get_child_items(
    path: &str,
    options: ListOptions,
    state: &DriveState,
) -> Result<Vec<DriveItem>, DriveOpsError> {
    let path = VirtualPath::parse(path);
    match &path {
        VirtualPath::Drive => {
            let buckets = state.buckets().buckets(state.api().as_ref()).await?;
            let mut items = Vec::new();
            for (project, bucket) in buckets {
                let name = bucket.name.clone();
                items.push(DriveItem::Bucket {
                    project: Some(project),
                    bucket,
                });
                if options.recurse {
                    items.extend(list_bucket(&VirtualPath::Bucket(name), true, state).await?);
                }
            }
            Ok(items)
        }
        VirtualPath::Bucket(_) => list_bucket(&path, options.recurse, state).await,
        VirtualPath::Object { bucket, key } => {
            let model = state.models().model(bucket);
            let container = model.lock().await.is_container(key).await;
            if !Lookup::from_result(container)?.into_option().unwrap_or(false) {
                return Ok(vec![get_item(&path.to_string(), state).await?]);
            }
            list_bucket(&path, options.recurse, state).await
        }
    }
}

/// Names of the items [`get_child_items`] returns, relative to `path`.
pub async fn get_child_names(
    path: &str,
    options: ListOptions,
    state: &DriveState,
) -> Result<Vec<String>, DriveOpsError> {
    let parent = VirtualPath::parse(path);
    let prefix = parent.child_prefix();
    let items = get_child_items(path, options, state).await?;

    Ok(items
        .iter()
        .map(|item| match (&parent, item) {
            (VirtualPath::Drive, DriveItem::Object(record)) => {
                format!("{}{}{}", record.bucket, SEPARATOR, trimmed(&record.name))
            }
            (_, DriveItem::Object(record)) if options.recurse => trimmed(&record.name)
                .strip_prefix(prefix.as_str())
                .unwrap_or_else(|| trimmed(&record.name))
                .to_string(),
            _ => item.name().to_string(),
        })
        .collect())
}

async fn list_bucket(
    path: &VirtualPath,
    recurse: bool,
    state: &DriveState,
) -> Result<Vec<DriveItem>, DriveOpsError> {
    let bucket = path.bucket().unwrap_or_default();
    let prefix = path.child_prefix();
    let page = list_all(bucket, &prefix, !recurse, state)
        .await
        .map_err(|e| match e {
            DriveOpsError::Storage(StorageError::NotFound(_)) => {
                DriveOpsError::ItemNotFound(path.to_string())
            }
            e => e,
        })?;

    let mut entries: BTreeMap<String, ObjectRecord> = BTreeMap::new();
    for folder in &page.prefixes {
        entries.insert(folder.clone(), ObjectRecord::folder(bucket, folder));
    }
    for record in page.items {
        if record.name == prefix {
            continue;
        }
        if recurse {
            // Folders implied by deeper keys.
            let mut current = record.name.trim_end_matches(SEPARATOR);
            while let Some((parent, _)) = current.rsplit_once(SEPARATOR) {
                if parent.len() < prefix.len() {
                    break;
                }
                let folder = format!("{}{}", parent, SEPARATOR);
                if folder == prefix {
                    break;
                }
                entries
                    .entry(folder)
                    .or_insert_with(|| ObjectRecord::folder(bucket, parent));
                current = parent;
            }
        }
        entries.insert(record.name.clone(), record);
    }

    Ok(entries.into_values().map(DriveItem::Object).collect())
}

fn trimmed(name: &str) -> &str {
    name.trim_end_matches(SEPARATOR)
}
