mod bucket_model;
mod cache;
mod snapshot;

pub use bucket_model::{BucketModel, DEFAULT_STALENESS};
pub use cache::{ModelCache, SharedModel};
pub use snapshot::{BucketSnapshot, CachedObject};
