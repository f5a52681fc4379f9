use async_trait::async_trait;
use aws_sdk_s3 as s3;
use s3::presigning::PresigningConfig;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Lifetime of every presigned upload URL.
pub const PRESIGN_TTL: Duration = Duration::from_secs(600);

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("presign configuration rejected: {0}")]
    Config(String),
    #[error("object storage request failed: {0}")]
    Request(String),
}

/// StorageService
///
/// The object storage contract. Handlers only ever ask for presigned upload URLs;
/// clients then `PUT` the bytes straight to the bucket.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Provisions the configured bucket. Only called at startup in `Env::Local`.
    async fn ensure_bucket_exists(&self);

    /// Signs a `PUT` for `key`. The upload must carry `content_type`.
    async fn get_presigned_upload_url(
        &self,
        key: &str,
        content_type: &str,
    ) -> Result<String, StorageError>;
}

/// S3StorageClient
///
/// AWS SDK client pointed at any S3-compatible endpoint (MinIO locally).
/// `force_path_style(true)` is required for MinIO.
#[derive(Clone)]
pub struct S3StorageClient {
    client: s3::Client,
    bucket_name: String,
}

impl S3StorageClient {
    pub async fn new(
        endpoint: &str,
        region: &str,
        access_key: &str,
        secret_key: &str,
        bucket: &str,
    ) -> Self {
        let credentials =
            s3::config::Credentials::new(access_key, secret_key, None, None, "static");

        let config = s3::Config::builder()
            .credentials_provider(credentials)
            .endpoint_url(endpoint)
            .region(s3::config::Region::new(region.to_string()))
            .behavior_version_latest()
            .force_path_style(true)
            .build();

        Self {
            client: s3::Client::from_conf(config),
            bucket_name: bucket.to_string(),
        }
    }
}

#[async_trait]
impl StorageService for S3StorageClient {
    async fn ensure_bucket_exists(&self) {
        // CreateBucket fails harmlessly when the bucket is already there.
        if let Err(e) = self
            .client
            .create_bucket()
            .bucket(&self.bucket_name)
            .send()
            .await
        {
            tracing::debug!(bucket = %self.bucket_name, error = %e, "create_bucket skipped");
        }
    }

    async fn get_presigned_upload_url(
        &self,
        key: &str,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let presigning = PresigningConfig::expires_in(PRESIGN_TTL)
            .map_err(|e| StorageError::Config(e.to_string()))?;

        let presigned_req = self
            .client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .content_type(content_type)
            .presigned(presigning)
            .await
            .map_err(|e| StorageError::Request(e.to_string()))?;

        Ok(presigned_req.uri().to_string())
    }
}

/// sanitize_key
///
/// Drops empty, `.` and `..` segments so a key can never climb out of its prefix.
pub fn sanitize_key(key: &str) -> String {
    key.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".." && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// upload_key
///
/// Object key for a member upload: `uploads/{member_id}/{uuid}.{ext}`. The extension
/// comes from the client filename (lower-cased, alphanumeric only); anything else
/// falls back to `bin`.
pub fn upload_key(member_id: Uuid, filename: &str) -> String {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.len() <= 10)
        .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| "bin".to_string());
    sanitize_key(&format!("uploads/{member_id}/{}.{ext}", Uuid::new_v4()))
}

/// MockStorageService
///
/// Offline `StorageService` for tests. Produces deterministic local URLs, or fails
/// every call when built with `new_failing`.
#[derive(Clone, Default)]
pub struct MockStorageService {
    pub should_fail: bool,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self { should_fail: false }
    }

    pub fn new_failing() -> Self {
        Self { should_fail: true }
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn ensure_bucket_exists(&self) {}

    async fn get_presigned_upload_url(
        &self,
        key: &str,
        _content_type: &str,
    ) -> Result<String, StorageError> {
        if self.should_fail {
            return Err(StorageError::Request("simulated outage".to_string()));
        }
        Ok(format!(
            "http://localhost:9000/mock-bucket/{}?signature=fake",
            sanitize_key(key)
        ))
    }
}

pub type StorageState = Arc<dyn StorageService>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_key_strips_traversal_segments() {
        assert_eq!(sanitize_key("uploads/../../etc/./passwd"), "uploads/etc/passwd");
        assert_eq!(sanitize_key("//a//b/"), "a/b");
    }

    #[test]
    fn upload_key_keeps_member_prefix_and_extension() {
        let member = Uuid::new_v4();
        let key = upload_key(member, "Holiday.Photo.PNG");
        assert!(key.starts_with(&format!("uploads/{member}/")));
        assert!(key.ends_with(".png"));
    }

    #[test]
    fn upload_key_falls_back_to_bin() {
        let member = Uuid::new_v4();
        assert!(upload_key(member, "noextension").ends_with(".bin"));
        assert!(upload_key(member, "weird.p/ng").ends_with(".bin"));
    }

    #[tokio::test]
    async fn mock_storage_signs_or_fails_on_demand() {
        let ok = MockStorageService::new()
            .get_presigned_upload_url("uploads/a/b.png", "image/png")
            .await
            .unwrap();
        assert_eq!(
            ok,
            "http://localhost:9000/mock-bucket/uploads/a/b.png?signature=fake"
        );

        let failing = MockStorageService::new_failing()
            .get_presigned_upload_url("uploads/a/b.png", "image/png")
            .await;
        assert!(failing.is_err());
    }
}
