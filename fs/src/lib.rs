//! ostor-fs: the on-disk layout of a storage node.
//!
//! Every object, workfile, and erasure-coded fragment lives under a
//! mountpath at a canonical fully-qualified name (FQN):
//!
//! ```text
//! <mountpath>/<content-type-dir>/<provider>/<namespace>/<bucket>/<object-name>
//! ```
//!
//! This crate owns that layout end to end: generating FQNs, resolving
//! arbitrary paths back into `{mountpath, bucket, content type, object}`,
//! walking bucket trees, HRW placement across mountpaths, and loading
//! object/content metadata from the filesystem.

#![warn(clippy::all)]

pub mod content;
pub mod fqn;
pub mod hrw;
pub mod locks;
pub mod lom;
pub mod mountpath;
pub mod statfs;
pub mod times;
pub mod walk;

pub use content::ContentType;
pub use fqn::ParsedFqn;
pub use locks::ObjectLocks;
pub use lom::{Ct, Lom};
pub use mountpath::Mountpath;
pub use statfs::FsStats;
#[cfg(unix)]
pub use statfs::statvfs;
pub use walk::{dir_size, walk, WalkOpts};
