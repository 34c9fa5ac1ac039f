//! Bucket tree walking.
//!
//! Walks a mountpath filtered to one bucket and a set of content types,
//! invoking the callback for every regular file. Directory order is
//! unspecified (whatever the OS returns). The callback doubles as the
//! yield hook: returning an error stops the walk and propagates it, which
//! is how joggers observe abort between entries.

use crate::content::ContentType;
use crate::mountpath::Mountpath;
use ostor_core::{Bck, EvictError, EvictResult};
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use tracing::debug;

/// What to walk.
pub struct WalkOpts<'a> {
    /// Mountpath to walk.
    pub mpath: &'a Mountpath,
    /// Bucket to restrict the walk to.
    pub bck: &'a Bck,
    /// Content types to visit; trees of other types are not descended.
    pub cts: &'a [ContentType],
}

/// Walk every regular file of the requested content types.
///
/// Per-entry `stat` failures are logged and skipped; failing to read a
/// directory is fatal and aborts the walk with [`EvictError::WalkIo`].
/// A content-type tree that does not exist on disk is simply empty.
pub fn walk<F>(opts: &WalkOpts<'_>, cb: &mut F) -> EvictResult<()>
where
    F: FnMut(&Path, &Metadata) -> EvictResult<()>,
{
    for ct in opts.cts {
        let root = opts.mpath.make_path_ct(opts.bck, *ct);
        if !root.is_dir() {
            continue;
        }
        walk_dir(&root, cb)?;
    }
    Ok(())
}

fn walk_dir<F>(dir: &Path, cb: &mut F) -> EvictResult<()>
where
    F: FnMut(&Path, &Metadata) -> EvictResult<()>,
{
    let entries = std::fs::read_dir(dir).map_err(|source| EvictError::WalkIo {
        path: dir.to_path_buf(),
        source,
    })?;

    for entry in entries {
        let entry = entry.map_err(|source| EvictError::WalkIo {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = entry.path();

        let md = match entry.metadata() {
            Ok(md) => md,
            Err(err) => {
                // Entry may have been removed under us.
                debug!(path = %path.display(), %err, "skipping unstatable entry");
                continue;
            }
        };

        if md.is_dir() {
            walk_dir(&path, cb)?;
        } else if md.is_file() {
            cb(&path, &md)?;
        }
        // Symlinks and special files are not node content.
    }
    Ok(())
}

/// Total size in bytes of all regular files under `path`.
///
/// Missing directories count as empty; unreadable entries are skipped.
pub fn dir_size(path: &Path) -> u64 {
    fn visit(dir: &Path, total: &mut u64) {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return;
        };
        for entry in entries.flatten() {
            let Ok(md) = entry.metadata() else { continue };
            if md.is_dir() {
                visit(&entry.path(), total);
            } else if md.is_file() {
                *total += md.len();
            }
        }
    }

    let mut total = 0;
    let p: PathBuf = path.to_path_buf();
    if p.is_dir() {
        visit(&p, &mut total);
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use ostor_core::Provider;
    use std::collections::HashSet;

    fn fixture() -> (tempfile::TempDir, Mountpath, Bck) {
        let dir = tempfile::tempdir().unwrap();
        let mpath = Mountpath::new(dir.path());
        let bck = Bck::new(Provider::Ais, "b");
        (dir, mpath, bck)
    }

    fn put(mpath: &Mountpath, bck: &Bck, ct: ContentType, name: &str, len: usize) {
        let fqn = mpath.make_fqn(bck, ct, name);
        std::fs::create_dir_all(fqn.parent().unwrap()).unwrap();
        std::fs::write(&fqn, vec![0u8; len]).unwrap();
    }

    #[test]
    fn test_visits_requested_content_types_once() {
        let (_dir, mpath, bck) = fixture();
        put(&mpath, &bck, ContentType::Object, "a", 1);
        put(&mpath, &bck, ContentType::Object, "nested/b", 1);
        put(&mpath, &bck, ContentType::Workfile, "w", 1);
        put(&mpath, &bck, ContentType::EcSlice, "s", 1);

        let mut seen = HashSet::new();
        let opts = WalkOpts {
            mpath: &mpath,
            bck: &bck,
            cts: &[ContentType::Object, ContentType::Workfile],
        };
        walk(&opts, &mut |path, _md| {
            assert!(seen.insert(path.to_path_buf()), "visited twice: {:?}", path);
            Ok(())
        })
        .unwrap();

        assert_eq!(seen.len(), 3);
        assert!(seen.contains(&mpath.make_fqn(&bck, ContentType::Object, "nested/b")));
        assert!(!seen.contains(&mpath.make_fqn(&bck, ContentType::EcSlice, "s")));
    }

    #[test]
    fn test_other_buckets_are_not_visited() {
        let (_dir, mpath, bck) = fixture();
        let other = Bck::new(Provider::Ais, "other");
        put(&mpath, &bck, ContentType::Object, "a", 1);
        put(&mpath, &other, ContentType::Object, "x", 1);

        let mut count = 0;
        let opts = WalkOpts {
            mpath: &mpath,
            bck: &bck,
            cts: &[ContentType::Object],
        };
        walk(&opts, &mut |_, _| {
            count += 1;
            Ok(())
        })
        .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_callback_error_stops_walk() {
        let (_dir, mpath, bck) = fixture();
        for i in 0..10 {
            put(&mpath, &bck, ContentType::Object, &format!("o{}", i), 1);
        }

        let mut visited = 0;
        let opts = WalkOpts {
            mpath: &mpath,
            bck: &bck,
            cts: &[ContentType::Object],
        };
        let err = walk(&opts, &mut |_, _| {
            visited += 1;
            if visited == 3 {
                return Err(EvictError::Aborted("test".to_string()));
            }
            Ok(())
        })
        .unwrap_err();

        assert!(err.is_aborted());
        assert_eq!(visited, 3);
    }

    #[test]
    fn test_missing_tree_is_empty() {
        let (_dir, mpath, bck) = fixture();
        let opts = WalkOpts {
            mpath: &mpath,
            bck: &bck,
            cts: &ContentType::ALL,
        };
        walk(&opts, &mut |_, _| panic!("nothing to visit")).unwrap();
    }

    #[test]
    fn test_dir_size() {
        let (_dir, mpath, bck) = fixture();
        put(&mpath, &bck, ContentType::Object, "a", 100);
        put(&mpath, &bck, ContentType::Object, "n/b", 50);

        let root = mpath.make_path_ct(&bck, ContentType::Object);
        assert_eq!(dir_size(&root), 150);
        assert_eq!(dir_size(&mpath.path().join("absent")), 0);
    }
}
