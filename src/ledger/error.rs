//! Error types for the progress ledger.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from loading or persisting the ledger file.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The ledger file exists but could not be read.
    #[error("failed to read ledger {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A durable status update could not be persisted. Fatal: the
    /// pipeline must not continue in an unrecorded state.
    #[error("failed to persist ledger {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
