use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use time::OffsetDateTime;

use crate::path::SEPARATOR;

/// Content type given to folder placeholder objects.
pub const FOLDER_CONTENT_TYPE: &str = "application/x-directory";

/// Metadata for a single object, as returned by the storage JSON API.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectRecord {
    pub name: String,
    pub bucket: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation: Option<i64>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metageneration: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub md5_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crc32c: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub time_created: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated: Option<OffsetDateTime>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl ObjectRecord {
    /// A bare record with only the identifying fields set.
    pub fn new(bucket: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bucket: bucket.into(),
            content_type: None,
            size: None,
            generation: None,
            metageneration: None,
            storage_class: None,
            md5_hash: None,
            crc32c: None,
            etag: None,
            time_created: None,
            updated: None,
            metadata: BTreeMap::new(),
        }
    }

    /// Placeholder record for a logical folder that has no object of its own.
    pub fn folder(bucket: impl Into<String>, key: &str) -> Self {
        let mut name = key.trim_end_matches(SEPARATOR).to_string();
        name.push(SEPARATOR);
        let mut record = Self::new(bucket, name);
        record.content_type = Some(FOLDER_CONTENT_TYPE.to_string());
        record.size = Some(0);
        record
    }

    /// Whether this record names a folder (its key ends with a separator).
    pub fn is_folder(&self) -> bool {
        self.name.ends_with(SEPARATOR)
    }

    /// The last path segment of the key, without a trailing separator.
    pub fn file_name(&self) -> &str {
        let trimmed = self.name.trim_end_matches(SEPARATOR);
        trimmed
            .rsplit_once(SEPARATOR)
            .map(|(_, name)| name)
            .unwrap_or(trimmed)
    }
}

/// Bucket metadata.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_class: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub time_created: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated: Option<OffsetDateTime>,
}

impl Bucket {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            project_number: None,
            location: None,
            storage_class: None,
            time_created: None,
            updated: None,
        }
    }
}

/// A project buckets are billed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub project_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifecycle_state: Option<String>,
}

impl Project {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            name: None,
            project_number: None,
            lifecycle_state: None,
        }
    }

    /// Projects pending deletion still show up in listings.
    pub fn is_active(&self) -> bool {
        self.lifecycle_state
            .as_deref()
            .map(|state| state == "ACTIVE")
            .unwrap_or(true)
    }
}

/// How much metadata a listing returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Projection {
    #[default]
    NoAcl,
    Full,
}

impl Projection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Projection::NoAcl => "noAcl",
            Projection::Full => "full",
        }
    }
}

/// Parameters for one page of an object listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListObjectsRequest {
    pub bucket: String,
    pub prefix: Option<String>,
    pub delimiter: Option<String>,
    pub page_token: Option<String>,
    pub max_results: Option<u32>,
    pub projection: Projection,
}

impl ListObjectsRequest {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            prefix: None,
            delimiter: None,
            page_token: None,
            max_results: None,
            projection: Projection::default(),
        }
    }

    /// Set the key prefix. An empty prefix lists the whole bucket.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.prefix = if prefix.is_empty() { None } else { Some(prefix) };
        self
    }

    /// Group keys at the next `/` after the prefix.
    pub fn delimited(mut self) -> Self {
        self.delimiter = Some(SEPARATOR.to_string());
        self
    }

    pub fn page_token(mut self, token: Option<String>) -> Self {
        self.page_token = token;
        self
    }

    pub fn max_results(mut self, max_results: Option<u32>) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn full(mut self) -> Self {
        self.projection = Projection::Full;
        self
    }
}

/// One page of an object listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectListPage {
    #[serde(default)]
    pub items: Vec<ObjectRecord>,
    #[serde(default)]
    pub prefixes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

impl ObjectListPage {
    pub fn is_truncated(&self) -> bool {
        self.next_page_token.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.prefixes.is_empty()
    }
}
