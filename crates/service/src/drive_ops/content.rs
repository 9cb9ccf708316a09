use std::borrow::Cow;

use bytes::{Bytes, BytesMut};

use common::prelude::*;

use crate::DriveState;

use super::error::DriveOpsError;
use super::new_item::guess_content_type;

/// Downloaded object content, consumed in blocks or as text.
#[derive(Debug, Clone)]
pub struct ContentReader {
    data: Bytes,
    position: usize,
}

impl ContentReader {
    pub fn new(data: Bytes) -> Self {
        Self { data, position: 0 }
    }

    /// Up to `max` bytes from the current position. Empty once exhausted.
    pub fn read_block(&mut self, max: usize) -> Bytes {
        let end = self.position.saturating_add(max).min(self.data.len());
        let block = self.data.slice(self.position..end);
        self.position = end;
        block
    }

    /// The whole content as text, replacing invalid UTF-8.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }

    pub fn lines(&self) -> Vec<String> {
        self.text().lines().map(str::to_string).collect()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_bytes(self) -> Bytes {
        self.data
    }
}

/// Buffers writes to an object and uploads them on [`close`](Self::close).
pub struct ContentWriter {
    bucket: String,
    key: String,
    content_type: String,
    buffer: BytesMut,
    state: DriveState,
}

impl ContentWriter {
    pub fn write(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    pub fn write_line(&mut self, line: &str) {
        self.write(line.as_bytes());
        self.write(b"\n");
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Upload everything written, replacing the object.
    pub async fn close(self) -> Result<ObjectRecord, DriveOpsError> {
        let size = self.buffer.len();
        let record = self
            .state
            .api()
            .insert_object(
                &self.bucket,
                &self.key,
                Some(&self.content_type),
                self.buffer.freeze(),
            )
            .await?;
        tracing::debug!(bucket = %self.bucket, key = %self.key, size, "uploaded content");
        self.state.invalidate(false).await;
        Ok(record)
    }
}

pub async fn get_content_reader(
    path: &str,
    state: &DriveState,
) -> Result<ContentReader, DriveOpsError> {
    let (bucket, key) = object_path(path)?;
    let data = state
        .api()
        .download_object(&bucket, &key)
        .await
        .map_err(DriveOpsError::not_found_as_item(path))?;
    Ok(ContentReader::new(data))
}

/// A writer for `path`. Nothing is sent until the writer is closed.
pub async fn get_content_writer(
    path: &str,
    state: &DriveState,
) -> Result<ContentWriter, DriveOpsError> {
    let (bucket, key) = object_path(path)?;
    let model = state.models().model(&bucket);
    let existing = Lookup::from_result(model.lock().await.get_object(&key).await)?.into_option();
    let content_type = existing
        .and_then(|record| record.content_type)
        .unwrap_or_else(|| guess_content_type(&key));

    Ok(ContentWriter {
        bucket,
        key,
        content_type,
        buffer: BytesMut::new(),
        state: state.clone(),
    })
}

/// Replace the object's content with nothing, keeping its content type.
pub async fn clear_content(
    path: &str,
    state: &DriveState,
) -> Result<ObjectRecord, DriveOpsError> {
    let (bucket, key) = object_path(path)?;
    let model = state.models().model(&bucket);
    let existing = model
        .lock()
        .await
        .get_object(&key)
        .await
        .map_err(DriveOpsError::not_found_as_item(path))?;
    if existing.is_folder() {
        return Err(DriveOpsError::InvalidOperation(format!(
            "{} is a folder and has no content",
            path
        )));
    }

    let record = state
        .api()
        .insert_object(&bucket, &key, existing.content_type.as_deref(), Bytes::new())
        .await?;
    state.invalidate(false).await;
    Ok(record)
}

fn object_path(path: &str) -> Result<(String, String), DriveOpsError> {
    match VirtualPath::parse(path) {
        VirtualPath::Object { bucket, key } if !key.ends_with(SEPARATOR) => Ok((bucket, key)),
        parsed => Err(DriveOpsError::InvalidOperation(format!(
            "{} has no content, only objects do (got a {} path)",
            path,
            parsed.kind()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use common::testkit::MemoryStorage;

    use super::*;
    use crate::ServiceConfig;

    fn state() -> (Arc<MemoryStorage>, DriveState) {
        let storage = Arc::new(MemoryStorage::new());
        storage.add_bucket("proj", "b");
        storage.put("b", "notes.txt", b"first\nsecond\nthird");
        storage.put("b", "dir/", b"");
        let state = DriveState::with_api(storage.clone(), &ServiceConfig::default());
        (storage, state)
    }

    #[tokio::test]
    async fn test_reader_blocks_and_lines() {
        let (_, state) = state();
        let mut reader = get_content_reader("b/notes.txt", &state).await.unwrap();
        assert_eq!(reader.lines(), vec!["first", "second", "third"]);
        assert_eq!(reader.read_block(6), "first\n");
        assert_eq!(reader.read_block(100), "second\nthird");
        assert!(reader.read_block(100).is_empty());
    }

    #[test]
    fn test_read_block_unbounded() {
        let mut reader = ContentReader::new(Bytes::from_static(b"abcdef"));
        assert_eq!(reader.read_block(2), "ab");
        assert_eq!(reader.read_block(usize::MAX), "cdef");
        assert!(reader.read_block(usize::MAX).is_empty());
    }

    #[tokio::test]
    async fn test_writer_uploads_on_close() {
        let (storage, state) = state();
        let mut writer = get_content_writer("b/new.json", &state).await.unwrap();
        writer.write(b"{");
        writer.write_line("}");
        assert!(storage.content("b", "new.json").is_none());

        let record = writer.close().await.unwrap();
        assert_eq!(record.content_type.as_deref(), Some("application/json"));
        assert_eq!(storage.content("b", "new.json").unwrap(), "{}\n");
    }

    #[tokio::test]
    async fn test_clear_keeps_content_type() {
        let (storage, state) = state();
        let mut writer = get_content_writer("b/page.html", &state)
            .await
            .unwrap()
            .with_content_type("text/x-custom");
        writer.write(b"<p>");
        writer.close().await.unwrap();

        let record = clear_content("b/page.html", &state).await.unwrap();
        assert_eq!(record.size, Some(0));
        assert_eq!(record.content_type.as_deref(), Some("text/x-custom"));
        assert!(storage.content("b", "page.html").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_content_of_non_objects() {
        let (_, state) = state();
        assert!(matches!(
            get_content_reader("b", &state).await,
            Err(DriveOpsError::InvalidOperation(_))
        ));
        assert!(matches!(
            clear_content("b/dir", &state).await,
            Err(DriveOpsError::InvalidOperation(_))
        ));
        assert!(matches!(
            get_content_reader("b/missing.txt", &state).await,
            Err(DriveOpsError::ItemNotFound(_))
        ));
    }
}
