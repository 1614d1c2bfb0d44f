//! S3 upload of exported files

use crate::aws::context::{AwsContext, FromAwsContext};
use crate::aws::error::classify_sdk_error;
use aws_sdk_s3::{Client, primitives::ByteStream};
use std::path::Path;
use tracing::debug;
use usage_export_common::{AwsError, ObjectStore};

/// S3 client for export uploads
pub struct S3Client {
    client: Client,
}

impl FromAwsContext for S3Client {
    fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.s3_client(),
        }
    }
}

impl S3Client {
    /// Upload a file to S3
    pub async fn upload_file(&self, bucket: &str, key: &str, path: &Path) -> Result<(), AwsError> {
        debug!(bucket = %bucket, key = %key, path = %path.display(), "Uploading file");

        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| AwsError::other(format!("Failed to read {}: {e}", path.display())))?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(body)
            .send()
            .await
            .map_err(|e| classify_sdk_error(&e))?;

        Ok(())
    }
}

impl ObjectStore for S3Client {
    async fn upload_file(&self, bucket: &str, key: &str, path: &Path) -> Result<(), AwsError> {
        S3Client::upload_file(self, bucket, key, path).await
    }
}
