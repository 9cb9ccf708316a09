//! Cloud Storage JSON API backend.

mod client;
mod error;

pub use client::GcsClient;
pub use error::GcsClientError;
