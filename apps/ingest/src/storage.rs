//! Blob storage collaborator. The pipeline only reads through `BlobStorage`;
//! `S3Storage` is the production backend (AWS S3 or MinIO).

use std::time::Duration;

use async_trait::async_trait;
use aws_config::timeout::TimeoutConfig;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object not found: {bucket}/{path}")]
    NotFound { bucket: String, path: String },

    #[error("Storage backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Stores `bytes` and returns the object location.
    async fn put(
        &self,
        bucket: &str,
        path: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, StorageError>;

    async fn get(&self, bucket: &str, path: &str) -> Result<Bytes, StorageError>;

    async fn delete(&self, bucket: &str, path: &str) -> Result<(), StorageError>;
}

/// Conventional upload path: `{owner_id}/{category}/{id}_{original_name}`.
/// Path separators in the original name are replaced so it stays one segment.
pub fn object_path(owner_id: Uuid, category: &str, id: Uuid, original_name: &str) -> String {
    let name: String = original_name
        .trim()
        .chars()
        .map(|c| if matches!(c, '/' | '\\') || c.is_control() { '_' } else { c })
        .collect();
    format!("{owner_id}/{category}/{id}_{name}")
}

/// Every S3 call is bounded: connect, each attempt, and the whole operation.
pub fn s3_timeouts(operation: Duration) -> TimeoutConfig {
    TimeoutConfig::builder()
        .connect_timeout(operation.min(Duration::from_secs(5)))
        .operation_attempt_timeout(operation)
        .operation_timeout(operation)
        .build()
}

#[derive(Clone)]
pub struct S3Storage {
    client: aws_sdk_s3::Client,
}

impl S3Storage {
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl BlobStorage for S3Storage {
    async fn put(
        &self,
        bucket: &str,
        path: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, StorageError> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(path)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::Backend(format!("S3 upload failed: {e}")))?;

        info!("Uploaded s3://{bucket}/{path}");
        Ok(format!("s3://{bucket}/{path}"))
    }

    async fn get(&self, bucket: &str, path: &str) -> Result<Bytes, StorageError> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(path)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|se| se.is_no_such_key()) {
                    StorageError::NotFound {
                        bucket: bucket.to_string(),
                        path: path.to_string(),
                    }
                } else {
                    StorageError::Backend(format!("S3 download failed: {e}"))
                }
            })?;

        let data = output
            .body
            .collect()
            .await
            .map_err(|e| StorageError::Backend(format!("S3 body read failed: {e}")))?;
        Ok(data.into_bytes())
    }

    async fn delete(&self, bucket: &str, path: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(path)
            .send()
            .await
            .map_err(|e| StorageError::Backend(format!("S3 delete failed: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::InMemoryStorage;

    #[test]
    fn test_object_path_convention() {
        let owner = Uuid::nil();
        let id = Uuid::from_u128(7);
        assert_eq!(
            object_path(owner, "resumes", id, "Jane Doe CV.pdf"),
            format!("{owner}/resumes/{id}_Jane Doe CV.pdf")
        );
    }

    #[test]
    fn test_object_path_flattens_separators() {
        let path = object_path(Uuid::nil(), "resumes", Uuid::nil(), "../../etc/passwd");
        assert!(path.ends_with("_.._.._etc_passwd"));
        assert_eq!(path.matches('/').count(), 2);
    }

    #[test]
    fn test_s3_timeouts_bound_every_operation() {
        let timeouts = s3_timeouts(Duration::from_secs(30));
        assert_eq!(timeouts.operation_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(timeouts.operation_attempt_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(timeouts.connect_timeout(), Some(Duration::from_secs(5)));
    }

    #[tokio::test]
    async fn test_in_memory_round_trip_and_delete() {
        let storage = InMemoryStorage::default();
        let location = storage
            .put("uploads", "a/b.txt", Bytes::from_static(b"hello"), "text/plain")
            .await
            .unwrap();
        assert_eq!(location, "mem://uploads/a/b.txt");
        assert_eq!(storage.get("uploads", "a/b.txt").await.unwrap(), "hello");

        storage.delete("uploads", "a/b.txt").await.unwrap();
        assert!(matches!(
            storage.get("uploads", "a/b.txt").await,
            Err(StorageError::NotFound { .. })
        ));
    }
}
