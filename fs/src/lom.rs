//! Object and content-file metadata.
//!
//! [`Lom`] is the in-memory descriptor of a stored object; [`Ct`] describes
//! any other content file (EC slices, metafiles, objects viewed as plain
//! content). Both are cheap value types caching size and timestamps read
//! from the filesystem.

use crate::content::ContentType;
use crate::fqn::ParsedFqn;
use crate::hrw;
use crate::mountpath::Mountpath;
use crate::times;
use ostor_core::{Bck, EvictError, EvictResult};
use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};

/// Logical object metadata.
#[derive(Debug, Clone)]
pub struct Lom {
    bck: Bck,
    obj_name: String,
    mpath: Mountpath,
    fqn: PathBuf,
    size: u64,
    atime_ns: i64,
}

impl Lom {
    /// Descriptor for `obj_name` of `bck` as located on `mpath`.
    pub fn new(mpath: Mountpath, bck: Bck, obj_name: impl Into<String>) -> Self {
        let obj_name = obj_name.into();
        let fqn = mpath.make_fqn(&bck, ContentType::Object, &obj_name);
        Self {
            bck,
            obj_name,
            mpath,
            fqn,
            size: 0,
            atime_ns: 0,
        }
    }

    /// Descriptor for a walked entry. The parsed FQN must be an object.
    pub fn from_parsed(parsed: ParsedFqn) -> Self {
        debug_assert_eq!(parsed.content_type, ContentType::Object);
        let fqn = parsed
            .mpath
            .make_fqn(&parsed.bck, ContentType::Object, &parsed.obj_name);
        Self {
            bck: parsed.bck,
            obj_name: parsed.obj_name,
            mpath: parsed.mpath,
            fqn,
            size: 0,
            atime_ns: 0,
        }
    }

    /// Cache size and access time from already-fetched metadata.
    pub fn load_md(&mut self, md: &Metadata) {
        self.size = md.len();
        self.atime_ns = times::atime_ns(md);
    }

    /// Re-read size and access time from the filesystem.
    ///
    /// A vanished object maps to [`EvictError::ObjectGone`].
    pub fn load(&mut self) -> EvictResult<()> {
        match std::fs::metadata(&self.fqn) {
            Ok(md) => {
                self.load_md(&md);
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Err(EvictError::ObjectGone(self.uname()))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Bucket this object belongs to.
    pub fn bck(&self) -> &Bck {
        &self.bck
    }

    /// Object name within the bucket.
    pub fn obj_name(&self) -> &str {
        &self.obj_name
    }

    /// Mountpath of this on-disk instance.
    pub fn mountpath(&self) -> &Mountpath {
        &self.mpath
    }

    /// Canonical path of this instance.
    pub fn fqn(&self) -> &Path {
        &self.fqn
    }

    /// Cached size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Cached access time, nanoseconds since the epoch.
    pub fn atime_ns(&self) -> i64 {
        self.atime_ns
    }

    /// Cluster-unique object name.
    pub fn uname(&self) -> String {
        format!("{}/{}", self.bck.uname(), self.obj_name)
    }

    /// Whether this instance sits on the object's HRW-correct mountpath.
    /// Instances anywhere else are misplaced.
    pub fn is_hrw(&self, mpaths: &[Mountpath]) -> bool {
        hrw::select(mpaths, &self.uname()) == Some(&self.mpath)
    }

    /// Unlink this instance. The caller holds the object's exclusive lock.
    pub fn remove(&self) -> io::Result<()> {
        std::fs::remove_file(&self.fqn)
    }
}

/// A content file: an EC slice, an EC metafile, or an object viewed as
/// plain content.
#[derive(Debug, Clone)]
pub struct Ct {
    bck: Bck,
    obj_name: String,
    content_type: ContentType,
    mpath: Mountpath,
    fqn: PathBuf,
    size: u64,
    mtime_ns: i64,
}

impl Ct {
    /// Descriptor for a walked entry.
    pub fn from_parsed(parsed: ParsedFqn) -> Self {
        let fqn = parsed
            .mpath
            .make_fqn(&parsed.bck, parsed.content_type, &parsed.obj_name);
        Self {
            bck: parsed.bck,
            obj_name: parsed.obj_name,
            content_type: parsed.content_type,
            mpath: parsed.mpath,
            fqn,
            size: 0,
            mtime_ns: 0,
        }
    }

    /// View an object as content of type `ct` at the same location.
    pub fn from_lom(lom: &Lom, ct: ContentType) -> Self {
        let fqn = lom.mountpath().make_fqn(lom.bck(), ct, lom.obj_name());
        Self {
            bck: lom.bck().clone(),
            obj_name: lom.obj_name().to_string(),
            content_type: ct,
            mpath: lom.mountpath().clone(),
            fqn,
            size: lom.size(),
            mtime_ns: 0,
        }
    }

    /// Cache size and modification time from already-fetched metadata.
    pub fn load_md(&mut self, md: &Metadata) {
        self.size = md.len();
        self.mtime_ns = times::mtime_ns(md);
    }

    /// Content type of this file.
    pub fn content_type(&self) -> ContentType {
        self.content_type
    }

    /// Canonical path of this file.
    pub fn fqn(&self) -> &Path {
        &self.fqn
    }

    /// Cached size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Cached modification time, nanoseconds since the epoch.
    pub fn mtime_ns(&self) -> i64 {
        self.mtime_ns
    }

    /// Path of the sibling content file of type `ct` for the same object.
    pub fn sibling_fqn(&self, ct: ContentType) -> PathBuf {
        self.mpath.make_fqn(&self.bck, ct, &self.obj_name)
    }

    /// Path of this object's EC metafile.
    pub fn meta_fqn(&self) -> PathBuf {
        self.sibling_fqn(ContentType::EcMeta)
    }

    /// Unlink this content file.
    pub fn remove(&self) -> io::Result<()> {
        std::fs::remove_file(&self.fqn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fqn::resolve_fqn;
    use ostor_core::Provider;
    use std::time::{Duration, SystemTime};

    fn fixture() -> (tempfile::TempDir, Vec<Mountpath>, Bck) {
        let dir = tempfile::tempdir().unwrap();
        let mpaths = vec![
            Mountpath::new(dir.path().join("d0")),
            Mountpath::new(dir.path().join("d1")),
        ];
        let bck = Bck::new(Provider::Ais, "b");
        (dir, mpaths, bck)
    }

    fn put(mpath: &Mountpath, bck: &Bck, ct: ContentType, name: &str, len: usize) -> PathBuf {
        let fqn = mpath.make_fqn(bck, ct, name);
        std::fs::create_dir_all(fqn.parent().unwrap()).unwrap();
        std::fs::write(&fqn, vec![0u8; len]).unwrap();
        fqn
    }

    #[test]
    fn test_load_caches_size_and_atime() {
        let (_dir, mpaths, bck) = fixture();
        let fqn = put(&mpaths[0], &bck, ContentType::Object, "o", 1234);

        let past = SystemTime::now() - Duration::from_secs(600);
        times::set_file_times(&fqn, past, past).unwrap();

        let mut lom = Lom::new(mpaths[0].clone(), bck, "o");
        lom.load().unwrap();
        assert_eq!(lom.size(), 1234);
        assert!((lom.atime_ns() - times::unix_nanos(past)).abs() < 1_000_000_000);
    }

    #[test]
    fn test_load_vanished_object() {
        let (_dir, mpaths, bck) = fixture();
        let mut lom = Lom::new(mpaths[0].clone(), bck, "ghost");
        assert!(lom.load().unwrap_err().is_obj_nought());
    }

    #[test]
    fn test_hrw_placement() {
        let (_dir, mpaths, bck) = fixture();

        // Find an object name whose HRW home is d0.
        let name = (0..64)
            .map(|i| format!("o{}", i))
            .find(|n| {
                let lom = Lom::new(mpaths[0].clone(), bck.clone(), n.clone());
                lom.is_hrw(&mpaths)
            })
            .expect("some name must land on d0");

        let home = Lom::new(mpaths[0].clone(), bck.clone(), name.clone());
        assert!(home.is_hrw(&mpaths));

        // The same object anywhere else is misplaced, whether or not the
        // home instance exists.
        let stray = Lom::new(mpaths[1].clone(), bck.clone(), name.clone());
        assert!(!stray.is_hrw(&mpaths));
        put(&mpaths[0], &bck, ContentType::Object, &name, 1);
        assert!(!stray.is_hrw(&mpaths));
    }

    #[test]
    fn test_ct_siblings() {
        let (_dir, mpaths, bck) = fixture();
        let fqn = put(&mpaths[0], &bck, ContentType::EcSlice, "x", 10);

        let parsed = resolve_fqn(&mpaths, &fqn).unwrap();
        let mut ct = Ct::from_parsed(parsed);
        ct.load_md(&std::fs::metadata(&fqn).unwrap());

        assert_eq!(ct.content_type(), ContentType::EcSlice);
        assert_eq!(ct.size(), 10);
        assert_eq!(
            ct.meta_fqn(),
            mpaths[0].make_fqn(&bck, ContentType::EcMeta, "x")
        );
        assert_eq!(
            ct.sibling_fqn(ContentType::Object),
            mpaths[0].make_fqn(&bck, ContentType::Object, "x")
        );
    }
}
