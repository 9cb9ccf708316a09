/**
 * Virtual drive paths.
 *  - `bucket/object/key` parsing and classification
 */
pub mod path;
/**
 * Object storage data model and the API seam
 *  every backend implements.
 *  - Buckets, objects, projects
 *  - Error taxonomy with HTTP status preserved
 */
pub mod storage;
/**
 * Per-bucket listing cache. Answers existence and
 *  container queries from a single page of listings,
 *  falling back to live calls when the page was truncated.
 */
pub mod model;
/**
 * In-process object store for tests.
 */
#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
/**
 * Helper for setting build version information
 *  at compile time.
 */
pub mod version;

pub mod prelude {
    pub use crate::model::{
        BucketModel, BucketSnapshot, CachedObject, ModelCache, SharedModel, DEFAULT_STALENESS,
    };
    pub use crate::path::{PathKind, VirtualPath, SEPARATOR};
    pub use crate::storage::{
        Bucket, ListObjectsRequest, Lookup, ObjectListPage, ObjectRecord, Project, Projection,
        StorageApi, StorageError, FOLDER_CONTENT_TYPE,
    };
    pub use crate::version::build_info;
}
