use std::collections::HashMap;

use crate::path::SEPARATOR;
use crate::storage::{ObjectListPage, ObjectRecord};

/// What the snapshot knows about a single key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedObject {
    Known(ObjectRecord),
    /// A live lookup confirmed the key does not exist.
    Missing,
}

/// Local view of one bucket, built from the first page of a full listing.
///
/// `prefixes` maps every logical folder (without its trailing separator) to
///  whether the folder holds anything besides its own placeholder object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BucketSnapshot {
    objects: HashMap<String, CachedObject>,
    prefixes: HashMap<String, bool>,
    truncated: bool,
}

impl BucketSnapshot {
    pub fn from_page(page: &ObjectListPage) -> Self {
        let mut snapshot = Self {
            truncated: page.is_truncated(),
            ..Self::default()
        };
        for record in &page.items {
            snapshot.insert(record.clone());
        }
        snapshot
    }

    /// More objects exist than the snapshot holds. Only known keys and
    ///  recorded misses can be answered locally.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn objects(&self) -> &HashMap<String, CachedObject> {
        &self.objects
    }

    pub fn prefixes(&self) -> &HashMap<String, bool> {
        &self.prefixes
    }

    pub fn record(&self, key: &str) -> Option<&ObjectRecord> {
        match self.objects.get(key) {
            Some(CachedObject::Known(record)) => Some(record),
            _ => None,
        }
    }

    pub fn is_missing(&self, key: &str) -> bool {
        matches!(self.objects.get(key), Some(CachedObject::Missing))
    }

    pub fn is_prefix(&self, key: &str) -> bool {
        self.prefixes.contains_key(trim(key))
    }

    pub fn prefix_has_children(&self, key: &str) -> Option<bool> {
        self.prefixes.get(trim(key)).copied()
    }

    /// Whether any real object is known.
    pub fn has_objects(&self) -> bool {
        self.objects
            .values()
            .any(|cached| matches!(cached, CachedObject::Known(_)))
    }

    /// Answer an existence query without going to the network, if possible.
    pub fn exists_locally(&self, key: &str) -> Option<bool> {
        if self.record(key).is_some() || self.is_prefix(key) {
            Some(true)
        } else if self.is_missing(key) {
            Some(false)
        } else {
            None
        }
    }

    pub fn insert(&mut self, record: ObjectRecord) {
        self.record_prefixes(&record.name);
        self.objects
            .insert(record.name.clone(), CachedObject::Known(record));
    }

    pub fn mark_missing(&mut self, key: &str) {
        self.objects.insert(key.to_string(), CachedObject::Missing);
    }

    // Walk the ancestors of `name` from the deepest up. The folder a
    //  placeholder (`a/b/`) stands for gets no children from it; every
    //  ancestor above the first one always has at least one.
    fn record_prefixes(&mut self, name: &str) {
        let mut has_children = !name.ends_with(SEPARATOR);
        let mut current = name;
        while let Some((prefix, _)) = current.rsplit_once(SEPARATOR) {
            if prefix.is_empty() {
                break;
            }
            let flag = self.prefixes.entry(prefix.to_string()).or_insert(false);
            if *flag && has_children {
                // Everything above was marked by an earlier object.
                break;
            }
            *flag |= has_children;
            has_children = true;
            current = prefix;
        }
    }
}

fn trim(key: &str) -> &str {
    key.trim_end_matches(SEPARATOR)
}
