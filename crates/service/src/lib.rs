mod bucket_cache;
pub mod confirm;
pub mod drive_ops;
pub mod gcs;
pub mod logging;

mod config;
mod state;

pub use bucket_cache::BucketCache;
pub use config::{Config as ServiceConfig, RESOURCE_MANAGER_ENDPOINT, STORAGE_ENDPOINT};
pub use drive_ops::DriveOpsError;
pub use state::{State as DriveState, StateSetupError as DriveStateSetupError};
