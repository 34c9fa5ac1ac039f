//! Filesystem capacity sampling.

use std::io;
use std::path::Path;

/// Raw filesystem statistics for a mountpath.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FsStats {
    /// Total data blocks.
    pub blocks: u64,
    /// Blocks available to unprivileged users.
    pub bavail: u64,
    /// Block size in bytes.
    pub bsize: i64,
}

impl FsStats {
    /// Used-capacity percentage, `0..=100`.
    pub fn used_pct(&self) -> i64 {
        if self.blocks == 0 {
            return 0;
        }
        let used = self.blocks - self.bavail.min(self.blocks);
        (used * 100 / self.blocks) as i64
    }
}

/// Sample `statvfs` for the filesystem holding `path`.
#[cfg(unix)]
pub fn statvfs(path: &Path) -> io::Result<FsStats> {
    use std::os::unix::ffi::OsStrExt;

    let cpath = std::ffi::CString::new(path.as_os_str().as_bytes())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "path contains NUL"))?;

    let mut vfs: libc::statvfs = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::statvfs(cpath.as_ptr(), &mut vfs) };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }

    Ok(FsStats {
        blocks: vfs.f_blocks as u64,
        bavail: vfs.f_bavail as u64,
        bsize: vfs.f_frsize as i64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_used_pct() {
        let stats = FsStats {
            blocks: 1000,
            bavail: 150,
            bsize: 4096,
        };
        assert_eq!(stats.used_pct(), 85);

        let empty = FsStats {
            blocks: 0,
            bavail: 0,
            bsize: 4096,
        };
        assert_eq!(empty.used_pct(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_statvfs_smoke() {
        let stats = statvfs(Path::new("/")).unwrap();
        assert!(stats.blocks > 0);
        assert!(stats.bsize > 0);
        assert!(stats.bavail <= stats.blocks);
    }
}
