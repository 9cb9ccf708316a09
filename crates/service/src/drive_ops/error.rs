use common::prelude::StorageError;

#[derive(Debug, thiserror::Error)]
pub enum DriveOpsError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("item not found: {0}")]
    ItemNotFound(String),
    #[error("invalid operation: {0}")]
    InvalidOperation(String),
    #[error("invalid options for {path}: {message}")]
    InvalidOptions { path: String, message: String },
    #[error("{0} is a container, pass recurse to include its contents")]
    ContainerRequiresRecurse(String),
    #[error("no project given for new bucket {0} and no default project configured")]
    MissingProject(String),
    #[error("operation stopped")]
    Stopped,
    #[error("failed to empty bucket {bucket}: {failed} object deletes failed")]
    PurgeFailed {
        bucket: String,
        failed: usize,
        #[source]
        source: StorageError,
    },
}

impl DriveOpsError {
    /// Map a backend `NotFound` onto `ItemNotFound` for `path`.
    pub(crate) fn not_found_as_item(path: &str) -> impl FnOnce(StorageError) -> Self + '_ {
        move |e| match e {
            StorageError::NotFound(_) => DriveOpsError::ItemNotFound(path.to_string()),
            e => DriveOpsError::Storage(e),
        }
    }
}
