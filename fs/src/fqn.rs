//! FQN resolution.
//!
//! The inverse of [`Mountpath::make_fqn`]: parse an absolute path back
//! into `{mountpath, content type, bucket, object name}`. Paths that do
//! not match the layout are unrelated to the node and resolve to `None`.

use crate::content::ContentType;
use crate::mountpath::Mountpath;
use ostor_core::{Bck, Provider, NS_GLOBAL};
use std::path::Path;

/// A successfully resolved FQN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFqn {
    /// Mountpath the file lives on.
    pub mpath: Mountpath,
    /// Content type, from the first path segment under the mountpath.
    pub content_type: ContentType,
    /// Bucket the file belongs to.
    pub bck: Bck,
    /// Object name (may contain `/` separators), with any workfile suffix
    /// still attached.
    pub obj_name: String,
}

/// Resolve `path` against the node's mountpaths.
///
/// Returns `None` for paths outside every mountpath or not conforming to
/// `<ct-dir>/<provider>/<ns>/<bucket>/<obj-name>`.
pub fn resolve_fqn(mpaths: &[Mountpath], path: &Path) -> Option<ParsedFqn> {
    let (mpath, rel) = mpaths
        .iter()
        .find_map(|m| path.strip_prefix(m.path()).ok().map(|rel| (m, rel)))?;

    let mut comps = rel.iter();
    let ct = ContentType::parse_dir(comps.next()?.to_str()?)?;
    let provider = Provider::parse(comps.next()?.to_str()?)?;
    let ns_seg = comps.next()?.to_str()?;
    let name = comps.next()?.to_str()?;

    let ns = if ns_seg == "@global" {
        NS_GLOBAL.to_string()
    } else {
        ns_seg.to_string()
    };

    let obj_parts: Vec<&str> = comps.map(|c| c.to_str()).collect::<Option<_>>()?;
    if obj_parts.is_empty() {
        return None;
    }

    Some(ParsedFqn {
        mpath: mpath.clone(),
        content_type: ct,
        bck: Bck {
            provider,
            ns,
            name: name.to_string(),
        },
        obj_name: obj_parts.join("/"),
    })
}
