use bytes::Bytes;
use serde::Serialize;

use common::prelude::*;

/// What a drive path resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DriveItem {
    Drive,
    Bucket {
        #[serde(skip_serializing_if = "Option::is_none")]
        project: Option<String>,
        #[serde(flatten)]
        bucket: Bucket,
    },
    Object(ObjectRecord),
}

impl DriveItem {
    /// Display name: bucket name, or the last segment of an object key.
    pub fn name(&self) -> &str {
        match self {
            DriveItem::Drive => "",
            DriveItem::Bucket { bucket, .. } => &bucket.name,
            DriveItem::Object(record) => record.file_name(),
        }
    }

    /// Drive path of the item.
    pub fn path(&self) -> VirtualPath {
        match self {
            DriveItem::Drive => VirtualPath::Drive,
            DriveItem::Bucket { bucket, .. } => VirtualPath::Bucket(bucket.name.clone()),
            DriveItem::Object(record) => VirtualPath::join(
                record.bucket.clone(),
                record.name.trim_end_matches(SEPARATOR),
            ),
        }
    }

    pub fn is_container(&self) -> bool {
        match self {
            DriveItem::Drive | DriveItem::Bucket { .. } => true,
            DriveItem::Object(record) => record.is_folder(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "clap", derive(clap::Args))]
pub struct ListOptions {
    /// Include every descendant instead of just direct children
    #[cfg_attr(feature = "clap", arg(short, long))]
    pub recurse: bool,
}

#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "clap", derive(clap::Args))]
pub struct CopyOptions {
    /// Copy a bucket or folder with everything beneath it
    #[cfg_attr(feature = "clap", arg(short, long))]
    pub recurse: bool,
}

#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "clap", derive(clap::Args))]
pub struct RemoveOptions {
    /// Remove a bucket or folder with everything beneath it
    #[cfg_attr(feature = "clap", arg(short, long))]
    pub recurse: bool,
    /// Do not ask for confirmation
    #[cfg_attr(feature = "clap", arg(short, long))]
    pub force: bool,
}

/// Options for creating a bucket.
#[derive(Debug, Clone, Default)]
pub struct NewBucketOptions {
    /// Project to bill the bucket to. Falls back to the configured project.
    pub project: Option<String>,
}

/// Options for creating an object.
#[derive(Debug, Clone)]
pub enum NewObjectOptions {
    File {
        content: Bytes,
        /// Guessed from the key's extension when not set.
        content_type: Option<String>,
    },
    Folder,
}

/// Creation options, one variant per kind of path that can be created.
#[derive(Debug, Clone)]
pub enum NewItemOptions {
    Bucket(NewBucketOptions),
    Object(NewObjectOptions),
}

impl NewItemOptions {
    pub fn folder() -> Self {
        NewItemOptions::Object(NewObjectOptions::Folder)
    }

    pub fn file(content: impl Into<Bytes>) -> Self {
        NewItemOptions::Object(NewObjectOptions::File {
            content: content.into(),
            content_type: None,
        })
    }

    pub fn bucket(project: Option<String>) -> Self {
        NewItemOptions::Bucket(NewBucketOptions { project })
    }

    pub(crate) fn kind(&self) -> PathKind {
        match self {
            NewItemOptions::Bucket(_) => PathKind::Bucket,
            NewItemOptions::Object(_) => PathKind::Object,
        }
    }
}

/// What a removal actually did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoveOutcome {
    /// Objects deleted, including folder placeholders.
    pub objects_removed: usize,
    /// Objects the user declined to delete.
    pub objects_skipped: usize,
    pub bucket_removed: bool,
}
