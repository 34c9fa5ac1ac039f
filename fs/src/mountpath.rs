//! Mountpaths.
//!
//! A mountpath is a local filesystem root owned by the node. During an
//! eviction run each mountpath is owned exclusively by one jogger.

use crate::content::ContentType;
use ostor_core::{Bck, EvictError, EvictResult, Provider, NS_GLOBAL};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// Name of the per-mountpath trash directory. Deleted buckets are moved
/// here and reclaimed lazily by the eviction engine.
pub const TRASH_DIR: &str = ".trash";

/// A local filesystem root holding node content.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Mountpath {
    path: PathBuf,
}

impl Mountpath {
    /// Mountpath rooted at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Filesystem root of this mountpath.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding `ct` content of bucket `bck` on this mountpath.
    pub fn make_path_ct(&self, bck: &Bck, ct: ContentType) -> PathBuf {
        self.path
            .join(ct.dir())
            .join(bck.provider.as_str())
            .join(bck.ns_segment())
            .join(&bck.name)
    }

    /// FQN of `obj_name` of content type `ct` in bucket `bck`.
    pub fn make_fqn(&self, bck: &Bck, ct: ContentType, obj_name: &str) -> PathBuf {
        self.make_path_ct(bck, ct).join(obj_name)
    }

    /// This mountpath's trash directory.
    pub fn trash_path(&self) -> PathBuf {
        self.path.join(TRASH_DIR)
    }

    /// Buckets of `provider` that have any content on this mountpath.
    ///
    /// The union over all content-type trees, so buckets holding nothing
    /// but stray EC fragments or workfiles are still reported. Sorted by
    /// `(namespace, name)` for deterministic iteration.
    pub fn list_buckets(&self, provider: Provider) -> EvictResult<Vec<Bck>> {
        let mut found = BTreeSet::new();
        for ct in ContentType::ALL {
            let root = self.path.join(ct.dir()).join(provider.as_str());
            if !root.is_dir() {
                continue;
            }
            for ns_entry in read_dir_fatal(&root)? {
                let ns_path = ns_entry.path();
                if !ns_path.is_dir() {
                    continue;
                }
                let Some(ns_seg) = ns_entry.file_name().to_str().map(String::from) else {
                    continue;
                };
                let ns = if ns_seg == "@global" {
                    NS_GLOBAL.to_string()
                } else {
                    ns_seg
                };
                for bck_entry in read_dir_fatal(&ns_path)? {
                    if !bck_entry.path().is_dir() {
                        continue;
                    }
                    if let Some(name) = bck_entry.file_name().to_str() {
                        found.insert((ns.clone(), name.to_string()));
                    }
                }
            }
        }
        Ok(found
            .into_iter()
            .map(|(ns, name)| Bck {
                provider,
                ns,
                name,
            })
            .collect())
    }
}

fn read_dir_fatal(dir: &Path) -> EvictResult<Vec<std::fs::DirEntry>> {
    let entries = std::fs::read_dir(dir).map_err(|source| EvictError::WalkIo {
        path: dir.to_path_buf(),
        source,
    })?;
    entries
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| EvictError::WalkIo {
            path: dir.to_path_buf(),
            source,
        })
}

impl fmt::Display for Mountpath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ostor_core::Provider;

    #[test]
    fn test_layout() {
        let mpath = Mountpath::new("/data/d0");
        let bck = Bck::new(Provider::Amazon, "media");

        assert_eq!(
            mpath.make_path_ct(&bck, ContentType::Object),
            PathBuf::from("/data/d0/obj/aws/@global/media")
        );
        assert_eq!(
            mpath.make_fqn(&bck, ContentType::EcMeta, "img/01.jpg"),
            PathBuf::from("/data/d0/ecm/aws/@global/media/img/01.jpg")
        );
        assert_eq!(mpath.trash_path(), PathBuf::from("/data/d0/.trash"));
    }

    #[test]
    fn test_list_buckets_unions_content_types() {
        let dir = tempfile::tempdir().unwrap();
        let mpath = Mountpath::new(dir.path());

        // A bucket with objects, one with only EC leftovers, one from
        // another provider.
        for (ct, bck) in [
            (ContentType::Object, Bck::new(Provider::Ais, "objects")),
            (ContentType::EcSlice, Bck::new(Provider::Ais, "leftovers")),
            (ContentType::Object, Bck::new(Provider::Amazon, "remote")),
        ] {
            let marker = mpath.make_fqn(&bck, ct, "f");
            std::fs::create_dir_all(marker.parent().unwrap()).unwrap();
            std::fs::write(marker, b"x").unwrap();
        }

        let ais = mpath.list_buckets(Provider::Ais).unwrap();
        assert_eq!(
            ais,
            vec![
                Bck::new(Provider::Ais, "leftovers"),
                Bck::new(Provider::Ais, "objects"),
            ]
        );

        let aws = mpath.list_buckets(Provider::Amazon).unwrap();
        assert_eq!(aws, vec![Bck::new(Provider::Amazon, "remote")]);

        assert!(mpath.list_buckets(Provider::Google).unwrap().is_empty());
    }
}
