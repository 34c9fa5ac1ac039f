//! Error taxonomy for capacity management.

use crate::bucket::Bck;
use std::io;
use std::path::PathBuf;

/// Result alias used throughout the eviction engine.
pub type EvictResult<T> = Result<T, EvictError>;

/// Errors surfaced by the eviction engine.
///
/// Most failures are handled locally (the offending file is skipped); the
/// variants here are the ones that cross component boundaries. See the
/// predicate helpers for the classes the jogger treats specially.
#[derive(Debug, thiserror::Error)]
pub enum EvictError {
    /// A second start attempt while a job is still running.
    #[error("{0} is already running - not starting a new eviction")]
    AlreadyRunning(String),

    /// The node has no mountpaths to operate on.
    #[error("no mountpaths available")]
    NoMountpaths,

    /// The job was aborted, externally or by a jogger stop signal.
    #[error("{0}: aborted")]
    Aborted(String),

    /// A bucket disappeared mid-pass.
    #[error("bucket {0} does not exist")]
    BucketNotFound(Bck),

    /// An object disappeared under a concurrent writer.
    #[error("object {0} no longer exists")]
    ObjectGone(String),

    /// A fatal read error while walking a mountpath.
    #[error("walk {}: {source}", path.display())]
    WalkIo {
        /// Directory the walker failed to read
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },

    /// Any other I/O failure that must propagate.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl EvictError {
    /// Graceful cancellation, not a failure.
    pub fn is_aborted(&self) -> bool {
        matches!(self, EvictError::Aborted(_))
    }

    /// Bucket-level "nought": log, trash, move on to the next bucket.
    pub fn is_bucket_nought(&self) -> bool {
        matches!(self, EvictError::BucketNotFound(_))
    }

    /// Object-level "nought": ignore and continue.
    pub fn is_obj_nought(&self) -> bool {
        matches!(self, EvictError::ObjectGone(_))
    }
}
