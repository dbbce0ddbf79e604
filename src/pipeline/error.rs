//! Error types for per-item transfer processing.

use thiserror::Error;

use crate::ledger::LedgerError;

/// A byte-transfer failure from the Blob Transport.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("HTTP error {status} for {context}")]
    HttpStatus { status: u16, context: String },

    #[error("network error for {context}: {source}")]
    Http {
        context: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("disk error: {0}")]
    Disk(#[from] std::io::Error),

    #[error("{0}")]
    Api(String),
}

/// Fatal pipeline failures. Each stops the run at the current item; the
/// ledger and staging file are left positioned for a later resume.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("download failed for {path}: {source}")]
    Download {
        path: String,
        #[source]
        source: TransferError,
    },

    #[error("upload failed for {path}: {source}")]
    Upload {
        path: String,
        #[source]
        source: TransferError,
    },

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
