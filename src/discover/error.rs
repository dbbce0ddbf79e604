//! Error types for remote tree discovery.

use thiserror::Error;

use crate::relpath::InvalidPath;

/// Errors raised while linearizing the remote folder tree.
///
/// Every variant is fatal: a partial tree is never returned, so a failed
/// discovery aborts the run before any item is processed.
#[derive(Debug, Error)]
pub enum DiscoverError {
    /// The Structure Provider could not enumerate a folder.
    #[error("cannot enumerate remote folder {path:?}: {source}")]
    DiscoveryFailed {
        path: String,
        #[source]
        source: anyhow::Error,
    },

    /// The provider reported a name that does not form a valid path
    /// segment — a contract violation, not a user error.
    #[error(transparent)]
    InvalidPath(#[from] InvalidPath),

    /// Recursion guard tripped; bounds worst-case behavior against
    /// malformed or adversarial listings.
    #[error("folder nesting exceeds {max} levels at {path:?}")]
    StructureTooDeep { path: String, max: usize },
}
