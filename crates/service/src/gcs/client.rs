use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use common::prelude::*;

use super::error::GcsClientError;

const STORAGE_V1: [&str; 2] = ["storage", "v1"];
const UPLOAD_V1: [&str; 3] = ["upload", "storage", "v1"];
const PROJECTS_V1: [&str; 2] = ["v1", "projects"];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BucketList {
    #[serde(default)]
    items: Vec<Bucket>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectList {
    #[serde(default)]
    projects: Vec<Project>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Client for the Cloud Storage JSON API and the Resource Manager
///  project listing.
#[derive(Debug, Clone)]
pub struct GcsClient {
    storage: Url,
    resource_manager: Url,
    client: Client,
}

impl GcsClient {
    pub fn new(
        storage: &Url,
        resource_manager: &Url,
        access_token: Option<&str>,
    ) -> Result<Self, GcsClientError> {
        let mut default_headers = HeaderMap::new();
        if let Some(token) = access_token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token))?;
            value.set_sensitive(true);
            default_headers.insert(AUTHORIZATION, value);
        }
        let client = Client::builder().default_headers(default_headers).build()?;

        Ok(Self {
            storage: storage.clone(),
            resource_manager: resource_manager.clone(),
            client,
        })
    }

    fn storage_url(&self, segments: &[&str]) -> Result<Url, StorageError> {
        endpoint(&self.storage, &STORAGE_V1, segments)
    }

    fn upload_url(&self, segments: &[&str]) -> Result<Url, StorageError> {
        endpoint(&self.storage, &UPLOAD_V1, segments)
    }

    fn projects_url(&self) -> Result<Url, StorageError> {
        endpoint(&self.resource_manager, &PROJECTS_V1, &[])
    }

    async fn send(request: RequestBuilder) -> Result<Response, StorageError> {
        let response = request
            .send()
            .await
            .map_err(|e| StorageError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(StorageError::from_status(status, error_message(&body)))
    }

    async fn call<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, StorageError> {
        Self::send(request)
            .await?
            .json::<T>()
            .await
            .map_err(|e| StorageError::Decode(e.to_string()))
    }
}

/// Append percent-encoded path segments to `base`. Object names keep
///  their `/` encoded as `%2F` so they stay a single segment.
fn endpoint(base: &Url, root: &[&str], segments: &[&str]) -> Result<Url, StorageError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| StorageError::Transport(format!("invalid endpoint {}", base)))?
        .pop_if_empty()
        .extend(root)
        .extend(segments);
    Ok(url)
}

/// Pull the message out of a JSON API error body, falling back to the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .map(|parsed| parsed.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

#[async_trait::async_trait]
impl StorageApi for GcsClient {
    async fn list_projects(&self) -> Result<Vec<Project>, StorageError> {
        let url = self.projects_url()?;
        let mut projects = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut request = self.client.get(url.clone());
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token)]);
            }
            let page: ProjectList = Self::call(request).await?;
            projects.extend(page.projects);
            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }
        Ok(projects)
    }

    async fn list_buckets(&self, project: &str) -> Result<Vec<Bucket>, StorageError> {
        let url = self.storage_url(&["b"])?;
        let mut buckets = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut request = self.client.get(url.clone()).query(&[("project", project)]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token)]);
            }
            let page: BucketList = Self::call(request).await?;
            buckets.extend(page.items);
            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }
        Ok(buckets)
    }

    async fn get_bucket(&self, bucket: &str) -> Result<Bucket, StorageError> {
        let url = self.storage_url(&["b", bucket])?;
        Self::call(self.client.get(url)).await
    }

    async fn insert_bucket(&self, project: &str, bucket: &str) -> Result<Bucket, StorageError> {
        let url = self.storage_url(&["b"])?;
        let request = self
            .client
            .post(url)
            .query(&[("project", project)])
            .json(&serde_json::json!({ "name": bucket }));
        Self::call(request).await
    }

    async fn delete_bucket(&self, bucket: &str) -> Result<(), StorageError> {
        let url = self.storage_url(&["b", bucket])?;
        Self::send(self.client.delete(url)).await?;
        Ok(())
    }

    async fn list_objects(
        &self,
        request: &ListObjectsRequest,
    ) -> Result<ObjectListPage, StorageError> {
        let url = self.storage_url(&["b", &request.bucket, "o"])?;
        let mut query: Vec<(&str, String)> =
            vec![("projection", request.projection.as_str().to_string())];
        if let Some(prefix) = &request.prefix {
            query.push(("prefix", prefix.clone()));
        }
        if let Some(delimiter) = &request.delimiter {
            query.push(("delimiter", delimiter.clone()));
        }
        if let Some(token) = &request.page_token {
            query.push(("pageToken", token.clone()));
        }
        if let Some(max_results) = request.max_results {
            query.push(("maxResults", max_results.to_string()));
        }
        Self::call(self.client.get(url).query(&query)).await
    }

    async fn get_object(&self, bucket: &str, name: &str) -> Result<ObjectRecord, StorageError> {
        let url = self.storage_url(&["b", bucket, "o", name])?;
        Self::call(self.client.get(url)).await
    }

    async fn insert_object(
        &self,
        bucket: &str,
        name: &str,
        content_type: Option<&str>,
        data: Bytes,
    ) -> Result<ObjectRecord, StorageError> {
        let url = self.upload_url(&["b", bucket, "o"])?;
        let request = self
            .client
            .post(url)
            .query(&[("uploadType", "media"), ("name", name)])
            .header(
                CONTENT_TYPE,
                content_type.unwrap_or("application/octet-stream"),
            )
            .body(data);
        Self::call(request).await
    }

    async fn copy_object(
        &self,
        source_bucket: &str,
        source_name: &str,
        destination_bucket: &str,
        destination_name: &str,
    ) -> Result<ObjectRecord, StorageError> {
        let url = self.storage_url(&[
            "b",
            source_bucket,
            "o",
            source_name,
            "copyTo",
            "b",
            destination_bucket,
            "o",
            destination_name,
        ])?;
        Self::call(self.client.post(url).json(&serde_json::json!({}))).await
    }

    async fn delete_object(&self, bucket: &str, name: &str) -> Result<(), StorageError> {
        let url = self.storage_url(&["b", bucket, "o", name])?;
        Self::send(self.client.delete(url)).await?;
        Ok(())
    }

    async fn download_object(&self, bucket: &str, name: &str) -> Result<Bytes, StorageError> {
        let url = self.storage_url(&["b", bucket, "o", name])?;
        Self::send(self.client.get(url).query(&[("alt", "media")]))
            .await?
            .bytes()
            .await
            .map_err(|e| StorageError::Transport(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GcsClient {
        let storage = Url::parse("https://storage.example.com/").unwrap();
        let manager = Url::parse("https://manager.example.com/").unwrap();
        GcsClient::new(&storage, &manager, Some("token")).unwrap()
    }

    #[test]
    fn test_object_names_are_one_segment() {
        let url = client()
            .storage_url(&["b", "bucket", "o", "dir/sub file.txt"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://storage.example.com/storage/v1/b/bucket/o/dir%2Fsub%20file.txt"
        );
    }

    #[test]
    fn test_upload_and_projects_urls() {
        let client = client();
        assert_eq!(
            client.upload_url(&["b", "bucket", "o"]).unwrap().as_str(),
            "https://storage.example.com/upload/storage/v1/b/bucket/o"
        );
        assert_eq!(
            client.projects_url().unwrap().as_str(),
            "https://manager.example.com/v1/projects"
        );
    }

    #[test]
    fn test_endpoint_with_base_path() {
        let base = Url::parse("http://localhost:4443/emulator/").unwrap();
        let url = endpoint(&base, &STORAGE_V1, &["b"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:4443/emulator/storage/v1/b");
    }

    #[test]
    fn test_error_message() {
        let body = r#"{"error":{"code":409,"message":"The bucket you tried to delete is not empty."}}"#;
        assert_eq!(
            error_message(body),
            "The bucket you tried to delete is not empty."
        );
        assert_eq!(error_message("  plain text \n"), "plain text");
    }

    #[test]
    fn test_invalid_token_is_rejected() {
        let url = Url::parse("https://storage.example.com/").unwrap();
        let err = GcsClient::new(&url, &url, Some("bad\ntoken")).unwrap_err();
        assert!(matches!(err, GcsClientError::InvalidToken(_)));
    }
}
