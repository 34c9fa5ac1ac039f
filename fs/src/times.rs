//! File timestamp helpers.
//!
//! Access time is the eviction key, carried as nanoseconds since the
//! epoch. Timestamps before the epoch (or unsupported platforms) collapse
//! to 0, which simply makes the file maximally old.

use std::fs::Metadata;
use std::io;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Nanoseconds since the epoch, saturating at 0.
pub fn unix_nanos(t: SystemTime) -> i64 {
    t.duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos().min(i64::MAX as u128) as i64)
        .unwrap_or(0)
}

/// Access time of `md` in nanoseconds since the epoch.
pub fn atime_ns(md: &Metadata) -> i64 {
    md.accessed().map(unix_nanos).unwrap_or(0)
}

/// Modification time of `md` in nanoseconds since the epoch.
pub fn mtime_ns(md: &Metadata) -> i64 {
    md.modified().map(unix_nanos).unwrap_or(0)
}

/// Set both access and modification time of `path`.
///
/// Used by hosts restoring timestamps on received objects, and by test
/// fixtures aging files into the eviction window.
#[cfg(unix)]
pub fn set_file_times(path: &Path, atime: SystemTime, mtime: SystemTime) -> io::Result<()> {
    use std::os::unix::ffi::OsStrExt;

    fn timespec(t: SystemTime) -> libc::timespec {
        let d = t.duration_since(UNIX_EPOCH).unwrap_or_default();
        libc::timespec {
            tv_sec: d.as_secs() as libc::time_t,
            tv_nsec: libc::c_long::from(d.subsec_nanos() as i32),
        }
    }

    let cpath = std::ffi::CString::new(path.as_os_str().as_bytes())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "path contains NUL"))?;
    let times = [timespec(atime), timespec(mtime)];

    let rc = unsafe { libc::utimensat(libc::AT_FDCWD, cpath.as_ptr(), times.as_ptr(), 0) };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Set both access and modification time of `path`.
#[cfg(not(unix))]
pub fn set_file_times(_path: &Path, _atime: SystemTime, _mtime: SystemTime) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "set_file_times is unix-only",
    ))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_set_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f");
        std::fs::write(&path, b"x").unwrap();

        let past = SystemTime::now() - Duration::from_secs(3600);
        set_file_times(&path, past, past).unwrap();

        let md = std::fs::metadata(&path).unwrap();
        let want = unix_nanos(past);
        // Some filesystems truncate to seconds.
        assert!((atime_ns(&md) - want).abs() < 1_000_000_000);
        assert!((mtime_ns(&md) - want).abs() < 1_000_000_000);
    }

    #[test]
    fn test_unix_nanos_saturates_before_epoch() {
        let before = UNIX_EPOCH - Duration::from_secs(10);
        assert_eq!(unix_nanos(before), 0);
    }
}
