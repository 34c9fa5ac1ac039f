//! Host environment.
//!
//! The eviction engine never owns cluster state; the host node injects it
//! through [`NodeEnv`]. Production nodes back the capacity callbacks with
//! `statvfs` and the device-utilization sampler; tests inject fixtures.

use ostor_core::{Bck, Bmd, Config};
use ostor_fs::{FsStats, Mountpath};
use std::io;
use std::path::Path;
use std::sync::Arc;

/// Everything the engine needs from the hosting node.
pub trait NodeEnv: Send + Sync {
    /// Current configuration snapshot. Taken by value at job entry and
    /// refreshed at capacity-check boundaries; never cached across them.
    fn config(&self) -> Arc<Config>;

    /// Current bucket-metadata snapshot.
    fn bmd(&self) -> Arc<Bmd>;

    /// Filesystem statistics for the mountpath at `path`.
    fn fs_stats(&self, path: &Path) -> io::Result<FsStats>;

    /// Used-capacity percentage for the mountpath at `path`, when the
    /// sample is available.
    fn fs_used_percentage(&self, path: &Path) -> Option<i64> {
        self.fs_stats(path).ok().map(|s| s.used_pct())
    }

    /// Current disk-utilization percentile of the mountpath's device.
    fn mpath_util(&self, path: &Path) -> i64;

    /// Whether the mountpath sees no competing I/O (throttling is skipped
    /// on idle mountpaths).
    fn is_idle(&self, mpath: &Mountpath, config: &Config) -> bool;

    /// A walked bucket turned out not to exist in the BMD; the host moves
    /// its directories to trash.
    fn trash_nonexisting_bucket(&self, bck: &Bck);

    /// Whether a rebalance or resilver is running or was interrupted.
    /// While true, misplaced objects and EC fragments must not be
    /// removed: the mover may still pick them up.
    fn rebalance_or_resilver_active(&self) -> bool;
}
