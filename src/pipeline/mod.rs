//! Per-item transfer pipeline.
//!
//! Each item moves through download → ledger `LocalOnly` → upload →
//! ledger `Done` → staging cleanup, with a durable ledger write between
//! steps so a crash at any point leaves an exact resume position. The
//! entry decision reads the ledger: `Done` items are skipped outright, a
//! `LocalOnly` item with its staging file still on disk goes straight to
//! upload, and everything else starts from the download.

pub mod error;
pub mod staging;

use std::path::{Path, PathBuf};

use async_trait::async_trait;

pub use error::{PipelineError, TransferError};

use crate::discover::SourceItem;
use crate::ledger::{Ledger, Status};
use crate::relpath::RelativePath;

/// Capability for moving bytes in and out of remote storage.
#[async_trait]
pub trait BlobTransport: Send + Sync {
    /// Stream the remote file behind `locator` into the local file at
    /// `dest`, creating or truncating it.
    async fn fetch(&self, locator: &str, dest: &Path) -> Result<(), TransferError>;

    /// Place the local file's bytes at the absolute remote path `dest`.
    async fn store(&self, local: &Path, dest: &str) -> Result<(), TransferError>;

    /// Create the remote folder at `dest` if absent. Idempotent: an
    /// already-existing folder is success, not an error.
    async fn ensure_folder(&self, dest: &str) -> Result<(), TransferError>;
}

/// What the pipeline did with one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    /// Already `Done`; nothing touched.
    Skipped,
    /// Reached `Done` during this run.
    Transferred,
}

/// Drives one item at a time through the transfer state machine.
pub struct Pipeline<'a> {
    transport: &'a dyn BlobTransport,
    cache_dir: PathBuf,
    destination_root: String,
}

impl<'a> Pipeline<'a> {
    pub fn new(transport: &'a dyn BlobTransport, cache_dir: PathBuf, destination_root: &str) -> Self {
        Self {
            transport,
            cache_dir,
            destination_root: destination_root.trim_end_matches('/').to_string(),
        }
    }

    /// Process one item to its terminal state, updating the ledger after
    /// each completed step.
    pub async fn process(
        &self,
        item: &SourceItem,
        ledger: &mut Ledger,
    ) -> Result<ItemOutcome, PipelineError> {
        let rel = &item.relative_path;
        let staging = staging::staging_path(&self.cache_dir, rel);

        let status = ledger.status_of(rel);
        if status == Status::Done {
            tracing::debug!(path = %rel, "already mirrored, skipping");
            return Ok(ItemOutcome::Skipped);
        }

        let have_local = status == Status::LocalOnly && staging.exists();
        if have_local {
            tracing::info!(path = %rel, "resuming from staged local copy");
        } else {
            if status == Status::LocalOnly {
                tracing::info!(path = %rel, "staged copy missing, downloading again");
            }
            self.download(item, &staging).await?;
            ledger.mark_local_only(rel)?;
        }

        self.upload(rel, &staging).await?;
        ledger.mark_done(rel)?;

        // Upload succeeded and is durably recorded; a leftover staging
        // file is a cleanup nuisance, not a correctness problem.
        if let Err(e) = tokio::fs::remove_file(&staging).await {
            tracing::warn!(path = %staging.display(), "could not remove staging file: {e}");
        }

        Ok(ItemOutcome::Transferred)
    }

    async fn download(&self, item: &SourceItem, staging: &Path) -> Result<(), PipelineError> {
        let fail = |source| PipelineError::Download {
            path: item.relative_path.to_string(),
            source,
        };
        if let Some(parent) = staging.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| fail(TransferError::Disk(e)))?;
        }
        tracing::info!(path = %item.relative_path, size_hint = ?item.size_hint, "downloading");
        self.transport
            .fetch(&item.remote_locator, staging)
            .await
            .map_err(fail)
    }

    async fn upload(&self, rel: &RelativePath, staging: &Path) -> Result<(), PipelineError> {
        let fail = |source| PipelineError::Upload {
            path: rel.to_string(),
            source,
        };

        // Build the destination hierarchy segment by segment; re-creating
        // an existing folder is success by contract.
        let mut folder = self.destination_root.clone();
        self.transport.ensure_folder(&folder).await.map_err(fail)?;
        for segment in rel.parent().segments() {
            folder.push('/');
            folder.push_str(segment);
            self.transport.ensure_folder(&folder).await.map_err(fail)?;
        }

        let dest = format!("{}/{}", self.destination_root, rel);
        tracing::info!(path = %rel, dest = %dest, "uploading");
        self.transport.store(staging, &dest).await.map_err(fail)
    }
}
