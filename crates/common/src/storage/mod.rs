mod api;
mod error;
mod types;

pub use api::StorageApi;
pub use error::{Lookup, StorageError};
pub use types::{
    Bucket, ListObjectsRequest, ObjectListPage, ObjectRecord, Project, Projection,
    FOLDER_CONTENT_TYPE,
};
