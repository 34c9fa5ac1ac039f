//! Content types and workfile naming.
//!
//! Each kind of on-disk content lives in its own directory tree under the
//! mountpath root. Workfiles additionally carry a `<base>.<tie>.<pid>`
//! suffix so that leftovers from dead processes can be told apart from
//! files a live writer is still producing.

use std::fmt;
use std::sync::OnceLock;
use std::time::{SystemTime, UNIX_EPOCH};

/// Kind of an on-disk file, derived from its location in the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// A stored object (the primary content type).
    Object,
    /// A transient staging file produced during an object write.
    Workfile,
    /// One erasure-coded data/parity fragment.
    EcSlice,
    /// Sidecar metafile describing an object's EC slices/replicas.
    EcMeta,
}

impl ContentType {
    /// Every content type, in walk order.
    pub const ALL: [ContentType; 4] = [
        ContentType::Object,
        ContentType::Workfile,
        ContentType::EcSlice,
        ContentType::EcMeta,
    ];

    /// Top-level directory name for this content type.
    pub fn dir(&self) -> &'static str {
        match self {
            ContentType::Object => "obj",
            ContentType::Workfile => "work",
            ContentType::EcSlice => "ec",
            ContentType::EcMeta => "ecm",
        }
    }

    /// Inverse of [`ContentType::dir`].
    pub fn parse_dir(s: &str) -> Option<ContentType> {
        match s {
            "obj" => Some(ContentType::Object),
            "work" => Some(ContentType::Workfile),
            "ec" => Some(ContentType::EcSlice),
            "ecm" => Some(ContentType::EcMeta),
            _ => None,
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir())
    }
}

/// Per-process tie-breaker embedded into workfile names.
///
/// Two writers with the same pid (across a restart) still produce distinct
/// workfile names because the tie-breaker is seeded from startup time.
fn proc_tie() -> u64 {
    static TIE: OnceLock<u64> = OnceLock::new();
    *TIE.get_or_init(|| {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        nanos ^ u64::from(std::process::id())
    })
}

/// Produce a unique workfile name for `base`.
pub fn make_work_name(base: &str) -> String {
    format!("{}.{:x}.{}", base, proc_tie(), std::process::id())
}

/// Parse a workfile name into its base, reporting whether the file is
/// *old* (left behind by a process that is no longer running).
///
/// Returns `None` when the name does not carry the workfile suffix; such
/// files are not workfiles this node produced and are left alone.
pub fn parse_work_name(name: &str) -> Option<(&str, bool)> {
    let (rest, pid) = name.rsplit_once('.')?;
    let (base, tie) = rest.rsplit_once('.')?;
    if base.is_empty() {
        return None;
    }
    let pid: u32 = pid.parse().ok()?;
    let tie = u64::from_str_radix(tie, 16).ok()?;

    let old = pid != std::process::id() || tie != proc_tie();
    Some((base, old))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dir_roundtrip() {
        for ct in ContentType::ALL {
            assert_eq!(ContentType::parse_dir(ct.dir()), Some(ct));
        }
        assert_eq!(ContentType::parse_dir("tmp"), None);
    }

    #[test]
    fn test_own_workfile_is_not_old() {
        let name = make_work_name("upload.bin");
        let (base, old) = parse_work_name(&name).unwrap();
        assert_eq!(base, "upload.bin");
        assert!(!old);
    }

    #[test]
    fn test_foreign_workfile_is_old() {
        // A pid that cannot be ours (pid 0 is the idle task).
        let name = format!("upload.bin.{:x}.0", proc_tie());
        let (_, old) = parse_work_name(&name).unwrap();
        assert!(old);

        // Same pid, different tie-breaker: a previous incarnation.
        let name = format!("upload.bin.{:x}.{}", proc_tie() ^ 1, std::process::id());
        let (_, old) = parse_work_name(&name).unwrap();
        assert!(old);
    }

    #[test]
    fn test_non_workfile_names_are_skipped() {
        assert!(parse_work_name("plain").is_none());
        assert!(parse_work_name("a.b").is_none());
        assert!(parse_work_name("a.nothex.123").is_none());
        assert!(parse_work_name("a.ff.notpid").is_none());
        assert!(parse_work_name(".ff.123").is_none());
    }

    #[test]
    fn test_base_with_dots() {
        let name = make_work_name("archive.tar.gz");
        let (base, _) = parse_work_name(&name).unwrap();
        assert_eq!(base, "archive.tar.gz");
    }
}
