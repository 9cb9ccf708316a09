use std::fmt;

/// Separator used inside object keys. Input paths may also use `\`.
pub const SEPARATOR: char = '/';

const SEPARATORS: [char; 2] = ['/', '\\'];

/// Classification of a [`VirtualPath`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathKind {
    Drive,
    Bucket,
    Object,
}

impl fmt::Display for PathKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathKind::Drive => write!(f, "drive"),
            PathKind::Bucket => write!(f, "bucket"),
            PathKind::Object => write!(f, "object"),
        }
    }
}

/// A location on the drive: the root, a bucket, or an object key
///  (which may name a real object or a logical folder) inside a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum VirtualPath {
    Drive,
    Bucket(String),
    Object { bucket: String, key: String },
}

impl VirtualPath {
    /// Parse a slash or backslash delimited path. Never fails; anything
    ///  malformed degrades to a drive or bucket path.
    pub fn parse(path: &str) -> Self {
        let path = path.trim_start_matches(SEPARATORS);
        if path.is_empty() {
            return VirtualPath::Drive;
        }

        match path.split_once(SEPARATORS) {
            None => VirtualPath::Bucket(path.to_string()),
            Some((bucket, "")) => VirtualPath::Bucket(bucket.to_string()),
            Some((bucket, key)) => VirtualPath::Object {
                bucket: bucket.to_string(),
                key: key.replace('\\', "/"),
            },
        }
    }

    /// Build the path for `key` inside `bucket`. An empty key names the bucket.
    pub fn join(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        let bucket = bucket.into();
        let key = key.into();
        if bucket.is_empty() {
            VirtualPath::Drive
        } else if key.is_empty() {
            VirtualPath::Bucket(bucket)
        } else {
            VirtualPath::Object { bucket, key }
        }
    }

    pub fn kind(&self) -> PathKind {
        match self {
            VirtualPath::Drive => PathKind::Drive,
            VirtualPath::Bucket(_) => PathKind::Bucket,
            VirtualPath::Object { .. } => PathKind::Object,
        }
    }

    pub fn bucket(&self) -> Option<&str> {
        match self {
            VirtualPath::Drive => None,
            VirtualPath::Bucket(bucket) => Some(bucket),
            VirtualPath::Object { bucket, .. } => Some(bucket),
        }
    }

    pub fn key(&self) -> Option<&str> {
        match self {
            VirtualPath::Object { key, .. } => Some(key),
            _ => None,
        }
    }

    /// The listing prefix for the children of this location: empty for a
    ///  bucket root, `key/` for an object or folder.
    pub fn child_prefix(&self) -> String {
        match self.key() {
            Some(key) => {
                let mut prefix = key.trim_end_matches(SEPARATOR).to_string();
                prefix.push(SEPARATOR);
                prefix
            }
            None => String::new(),
        }
    }

    /// Descend one level.
    pub fn child(&self, name: &str) -> Self {
        let name = name.trim_matches(SEPARATORS);
        match self {
            VirtualPath::Drive => VirtualPath::parse(name),
            VirtualPath::Bucket(bucket) => VirtualPath::join(bucket.clone(), name),
            VirtualPath::Object { bucket, key } => VirtualPath::Object {
                bucket: bucket.clone(),
                key: format!("{}{}{}", key.trim_end_matches(SEPARATOR), SEPARATOR, name),
            },
        }
    }

    /// Ascend one level. The drive root is its own parent.
    pub fn parent(&self) -> Self {
        match self {
            VirtualPath::Drive | VirtualPath::Bucket(_) => VirtualPath::Drive,
            VirtualPath::Object { bucket, key } => {
                match key.trim_end_matches(SEPARATOR).rsplit_once(SEPARATOR) {
                    Some((parent, _)) => VirtualPath::join(bucket.clone(), parent),
                    None => VirtualPath::Bucket(bucket.clone()),
                }
            }
        }
    }
}

impl fmt::Display for VirtualPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VirtualPath::Drive => Ok(()),
            VirtualPath::Bucket(bucket) => write!(f, "{}", bucket),
            VirtualPath::Object { bucket, key } => write!(f, "{}{}{}", bucket, SEPARATOR, key),
        }
    }
}

impl From<&str> for VirtualPath {
    fn from(path: &str) -> Self {
        VirtualPath::parse(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_drive() {
        assert_eq!(VirtualPath::parse(""), VirtualPath::Drive);
        assert_eq!(VirtualPath::parse("/"), VirtualPath::Drive);
        assert_eq!(VirtualPath::parse("\\\\"), VirtualPath::Drive);
        assert_eq!(VirtualPath::parse("").kind(), PathKind::Drive);
    }

    #[test]
    fn test_parse_bucket() {
        assert_eq!(
            VirtualPath::parse("my-bucket"),
            VirtualPath::Bucket("my-bucket".to_string())
        );
        assert_eq!(
            VirtualPath::parse("my-bucket/"),
            VirtualPath::Bucket("my-bucket".to_string())
        );
        assert_eq!(VirtualPath::parse("/my-bucket").kind(), PathKind::Bucket);
    }

    #[test]
    fn test_parse_object_normalizes_separators() {
        let path = VirtualPath::parse("my-bucket\\dir\\sub/file.txt");
        assert_eq!(path.kind(), PathKind::Object);
        assert_eq!(path.bucket(), Some("my-bucket"));
        assert_eq!(path.key(), Some("dir/sub/file.txt"));
    }

    #[test]
    fn test_parse_keeps_trailing_separator() {
        let path = VirtualPath::parse("b/folder/");
        assert_eq!(path.key(), Some("folder/"));
        assert_eq!(path.child_prefix(), "folder/");
    }

    #[test]
    fn test_round_trip() {
        let cases = [
            ("bucket", "a"),
            ("bucket", "a/b/c.txt"),
            ("bucket.with.dots", "folder/"),
            ("b", "x y/z"),
        ];
        for (bucket, key) in cases {
            let joined = VirtualPath::join(bucket, key);
            let reparsed = VirtualPath::parse(&joined.to_string());
            assert_eq!(reparsed.bucket(), Some(bucket));
            assert_eq!(reparsed.key(), Some(key));
            assert_eq!(reparsed, joined);
        }
    }

    #[test]
    fn test_child_and_parent() {
        let root = VirtualPath::Drive;
        let bucket = root.child("b");
        assert_eq!(bucket, VirtualPath::Bucket("b".to_string()));

        let dir = bucket.child("dir");
        let file = dir.child("file.txt");
        assert_eq!(file.key(), Some("dir/file.txt"));
        assert_eq!(file.parent(), dir);
        assert_eq!(dir.parent(), bucket);
        assert_eq!(bucket.parent(), VirtualPath::Drive);
        assert_eq!(VirtualPath::Drive.parent(), VirtualPath::Drive);
    }

    #[test]
    fn test_child_prefix() {
        assert_eq!(VirtualPath::parse("b").child_prefix(), "");
        assert_eq!(VirtualPath::parse("b/dir").child_prefix(), "dir/");
    }
}
