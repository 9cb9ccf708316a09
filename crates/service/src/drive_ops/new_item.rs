use bytes::Bytes;

use common::prelude::*;

use crate::DriveState;

use super::error::DriveOpsError;
use super::types::{DriveItem, NewItemOptions, NewObjectOptions};

/// Create a bucket, a file or a folder placeholder at `path`.
///
/// The options variant must match what `path` names. Every bucket model is
///  invalidated afterwards.
pub async fn new_item(
    path: &str,
    options: NewItemOptions,
    state: &DriveState,
) -> Result<DriveItem, DriveOpsError> {
    match (VirtualPath::parse(path), options) {
        (VirtualPath::Drive, _) => Err(DriveOpsError::InvalidOperation(
            "cannot create the drive root".to_string(),
        )),
        (VirtualPath::Bucket(name), NewItemOptions::Bucket(options)) => {
            let project = options
                .project
                .or_else(|| state.default_project().map(str::to_string))
                .ok_or_else(|| DriveOpsError::MissingProject(name.clone()))?;
            let bucket = state.api().insert_bucket(&project, &name).await?;
            tracing::info!(bucket = %name, project = %project, "created bucket");
            state.invalidate(true).await;
            Ok(DriveItem::Bucket {
                project: Some(project),
                bucket,
            })
        }
        (VirtualPath::Object { bucket, key }, NewItemOptions::Object(options)) => {
            let (name, content_type, content) = match options {
                NewObjectOptions::File {
                    content,
                    content_type,
                } => {
                    let content_type = content_type.unwrap_or_else(|| guess_content_type(&key));
                    (key, content_type, content)
                }
                NewObjectOptions::Folder => {
                    let mut name = key.trim_end_matches(SEPARATOR).to_string();
                    name.push(SEPARATOR);
                    (name, FOLDER_CONTENT_TYPE.to_string(), Bytes::new())
                }
            };
            let record = state
                .api()
                .insert_object(&bucket, &name, Some(&content_type), content)
                .await
                .map_err(DriveOpsError::not_found_as_item(&bucket))?;
            tracing::info!(bucket = %bucket, name = %name, size = ?record.size, "created object");
            state.invalidate(false).await;
            Ok(DriveItem::Object(record))
        }
        (parsed, options) => Err(DriveOpsError::InvalidOptions {
            path: path.to_string(),
            message: format!(
                "{} options given for a {} path",
                options.kind(),
                parsed.kind()
            ),
        }),
    }
}

pub(crate) fn guess_content_type(key: &str) -> String {
    mime_guess::from_path(key)
        .first_raw()
        .unwrap_or("application/octet-stream")
        .to_string()
}
