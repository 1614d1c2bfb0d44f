//! Local file output with optional upload to object storage
//!
//! Files land in `<output_dir>/output/`. When a bucket is configured each file
//! is uploaded under `data/{partition}/date={YYYY-MM-DD}/{file}` and the local
//! copy is removed only once the upload has been confirmed.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use usage_export_common::naming::{OUTPUT_SUBDIR, object_key};
use usage_export_common::{Artifact, ObjectStore, Table};

/// What happened to one exported file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SinkOutcome {
    /// Nothing to write
    Skipped,
    /// Written locally, no bucket configured
    Written { path: PathBuf },
    /// Uploaded and removed locally
    Uploaded { bucket: String, key: String },
    /// Upload failed; the local file is kept
    UploadFailed {
        path: PathBuf,
        key: String,
        error: String,
    },
}

impl SinkOutcome {
    pub fn is_upload_failure(&self) -> bool {
        matches!(self, SinkOutcome::UploadFailed { .. })
    }
}

/// Writes tables and JSON payloads, then optionally uploads them
#[derive(Debug, Clone)]
pub struct Sink<O> {
    output_dir: PathBuf,
    bucket: Option<String>,
    store: O,
}

impl<O: ObjectStore> Sink<O> {
    /// An empty bucket name is treated as no bucket.
    pub fn new(output_dir: impl Into<PathBuf>, bucket: Option<String>, store: O) -> Self {
        Self {
            output_dir: output_dir.into(),
            bucket: bucket.filter(|b| !b.trim().is_empty()),
            store,
        }
    }

    /// Directory that receives generated files
    pub fn files_dir(&self) -> PathBuf {
        self.output_dir.join(OUTPUT_SUBDIR)
    }

    pub fn bucket(&self) -> Option<&str> {
        self.bucket.as_deref()
    }

    /// Write `table` as CSV. An empty table writes nothing.
    pub async fn write_csv(
        &self,
        table: &Table,
        artifact: &Artifact,
        at: DateTime<Utc>,
    ) -> Result<SinkOutcome> {
        if table.is_empty() {
            info!(function = %artifact.function, "No rows to write, skipping CSV");
            return Ok(SinkOutcome::Skipped);
        }
        let bytes = table.to_csv().context("Failed to render CSV")?;
        self.write_bytes(artifact, "csv", bytes, at).await
    }

    /// Write `value` as pretty-printed JSON. A `null` payload writes nothing.
    pub async fn write_json<T: Serialize>(
        &self,
        value: &T,
        artifact: &Artifact,
        at: DateTime<Utc>,
    ) -> Result<SinkOutcome> {
        let value = serde_json::to_value(value).context("Failed to serialize JSON payload")?;
        if value.is_null() {
            info!(function = %artifact.function, "Empty payload, skipping JSON");
            return Ok(SinkOutcome::Skipped);
        }
        let bytes = serde_json::to_vec_pretty(&value).context("Failed to render JSON")?;
        self.write_bytes(artifact, "json", bytes, at).await
    }

    async fn write_bytes(
        &self,
        artifact: &Artifact,
        ext: &str,
        bytes: Vec<u8>,
        at: DateTime<Utc>,
    ) -> Result<SinkOutcome> {
        let dir = self.files_dir();
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create {}", dir.display()))?;

        let file_name = artifact.file_name(at, ext);
        let path = dir.join(&file_name);
        tokio::fs::write(&path, &bytes)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), bytes = bytes.len(), "Wrote file");

        let Some(bucket) = self.bucket.as_deref() else {
            return Ok(SinkOutcome::Written { path });
        };

        let key = object_key(&artifact.partition, at.date_naive(), &file_name);
        match self.store.upload_file(bucket, &key, &path).await {
            Ok(()) => {
                info!(bucket = %bucket, key = %key, "Uploaded file");
                if let Err(e) = tokio::fs::remove_file(&path).await {
                    warn!(path = %path.display(), error = %e, "Failed to remove uploaded file");
                }
                Ok(SinkOutcome::Uploaded {
                    bucket: bucket.to_string(),
                    key,
                })
            }
            Err(e) => {
                if e.is_credentials() {
                    warn!(
                        bucket = %bucket,
                        key = %key,
                        error = %e,
                        "Upload skipped: no usable credentials"
                    );
                } else {
                    error!(bucket = %bucket, key = %key, error = %e, "Upload failed");
                }
                Ok(SinkOutcome::UploadFailed {
                    path,
                    key,
                    error: e.to_string(),
                })
            }
        }
    }
}

/// Read back a JSON file written by [`Sink::write_json`]
pub fn read_json(path: &Path) -> Result<serde_json::Value> {
    let data =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_slice(&data).with_context(|| format!("Invalid JSON in {}", path.display()))
}
