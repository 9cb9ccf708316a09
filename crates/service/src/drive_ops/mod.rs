//! Filesystem verbs over the drive. Each verb is a free function taking the
//!  drive path as a string and the shared [`DriveState`](crate::DriveState).

mod content;
mod copy_item;
mod error;
mod exists;
mod get_item;
mod list_children;
mod listing;
mod new_item;
mod remove_item;
mod types;

pub use content::{
    clear_content, get_content_reader, get_content_writer, ContentReader, ContentWriter,
};
pub use copy_item::copy_item;
pub use error::DriveOpsError;
pub use exists::{has_children, is_container, item_exists};
pub use get_item::get_item;
pub use list_children::{get_child_items, get_child_names};
pub use new_item::new_item;
pub use remove_item::remove_item;
pub use types::{
    CopyOptions, DriveItem, ListOptions, NewBucketOptions, NewItemOptions, NewObjectOptions,
    RemoveOptions, RemoveOutcome,
};
