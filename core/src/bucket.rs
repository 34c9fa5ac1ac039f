//! Bucket identifiers and properties.
//!
//! A bucket is a provider-scoped namespace of objects. The node keeps a
//! bucket-metadata table ([`Bmd`]) mapping each known bucket to its
//! [`BucketProps`]; subsystems snapshot it via `Arc` and never mutate it in
//! place.

use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;

/// The global (default) namespace.
pub const NS_GLOBAL: &str = "";

/// Backend provider of a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Native ostor bucket
    Ais,
    /// Amazon S3
    Amazon,
    /// Azure Blob Storage
    Azure,
    /// Google Cloud Storage
    Google,
}

impl Provider {
    /// All known providers, in the fixed order jobs iterate them.
    pub const ALL: [Provider; 4] = [
        Provider::Ais,
        Provider::Amazon,
        Provider::Azure,
        Provider::Google,
    ];

    /// On-disk directory segment for this provider.
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Ais => "ais",
            Provider::Amazon => "aws",
            Provider::Azure => "azure",
            Provider::Google => "gcp",
        }
    }

    /// Parse a provider from its on-disk directory segment.
    pub fn parse(s: &str) -> Option<Provider> {
        match s {
            "ais" => Some(Provider::Ais),
            "aws" => Some(Provider::Amazon),
            "azure" => Some(Provider::Azure),
            "gcp" => Some(Provider::Google),
            _ => None,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bucket identifier: `{provider, namespace, name}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct Bck {
    /// Backend provider
    pub provider: Provider,
    /// Namespace; [`NS_GLOBAL`] for the default namespace
    #[serde(default)]
    pub ns: String,
    /// Bucket name
    pub name: String,
}

impl Bck {
    /// Bucket in the global namespace.
    pub fn new(provider: Provider, name: impl Into<String>) -> Self {
        Self {
            provider,
            ns: NS_GLOBAL.to_string(),
            name: name.into(),
        }
    }

    /// Namespace directory segment ("@global" for the default namespace).
    pub fn ns_segment(&self) -> &str {
        if self.ns.is_empty() { "@global" } else { &self.ns }
    }

    /// Unique name usable as a map key or path-independent object prefix.
    pub fn uname(&self) -> String {
        format!("{}/{}/{}", self.provider, self.ns_segment(), self.name)
    }
}

impl fmt::Display for Bck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.uname())
    }
}

/// Access permission bitset for a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct AccessFlags(pub u64);

impl AccessFlags {
    /// Read object data and metadata.
    pub const OBJ_GET: AccessFlags = AccessFlags(1 << 0);
    /// Create or overwrite objects.
    pub const OBJ_PUT: AccessFlags = AccessFlags(1 << 1);
    /// Delete objects.
    pub const OBJ_DELETE: AccessFlags = AccessFlags(1 << 2);
    /// List bucket contents.
    pub const BCK_LIST: AccessFlags = AccessFlags(1 << 3);

    /// Every permission set.
    pub const ALL: AccessFlags = AccessFlags(u64::MAX);
    /// No permissions.
    pub const NONE: AccessFlags = AccessFlags(0);

    /// Whether every bit of `flags` is set.
    pub fn allows(&self, flags: AccessFlags) -> bool {
        self.0 & flags.0 == flags.0
    }
}

impl std::ops::BitOr for AccessFlags {
    type Output = AccessFlags;

    fn bitor(self, rhs: AccessFlags) -> AccessFlags {
        AccessFlags(self.0 | rhs.0)
    }
}

/// LRU-related bucket properties.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct LruProps {
    /// Whether the eviction engine may reclaim objects from this bucket
    pub enabled: bool,
}

/// Erasure-coding bucket properties.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct EcProps {
    /// Whether the bucket stores EC slices and metafiles
    pub enabled: bool,
}

/// Properties of a bucket, as recorded in the bucket-metadata table.
#[derive(Debug, Clone, Deserialize)]
pub struct BucketProps {
    /// LRU eviction properties
    pub lru: LruProps,
    /// Erasure-coding properties
    pub ec: EcProps,
    /// Access permissions
    pub access: AccessFlags,
}

impl Default for BucketProps {
    fn default() -> Self {
        Self {
            lru: LruProps { enabled: true },
            ec: EcProps { enabled: false },
            access: AccessFlags::ALL,
        }
    }
}

/// Bucket-metadata table: the node's view of every known bucket.
#[derive(Debug, Default, Clone)]
pub struct Bmd {
    version: u64,
    buckets: HashMap<Bck, BucketProps>,
}

impl Bmd {
    /// Empty table at version 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Table version; bumps on every [`Bmd::put`].
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Properties of `bck`, or `None` when the bucket does not exist.
    pub fn get(&self, bck: &Bck) -> Option<&BucketProps> {
        self.buckets.get(bck)
    }

    /// Record (or replace) a bucket.
    pub fn put(&mut self, bck: Bck, props: BucketProps) {
        self.version += 1;
        self.buckets.insert(bck, props);
    }

    /// Forget a bucket.
    pub fn remove(&mut self, bck: &Bck) -> Option<BucketProps> {
        self.version += 1;
        self.buckets.remove(bck)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uname_is_stable() {
        let bck = Bck::new(Provider::Amazon, "archive");
        assert_eq!(bck.uname(), "aws/@global/archive");

        let mut scoped = Bck::new(Provider::Ais, "logs");
        scoped.ns = "team-a".to_string();
        assert_eq!(scoped.uname(), "ais/team-a/logs");
    }

    #[test]
    fn test_provider_roundtrip() {
        for p in Provider::ALL {
            assert_eq!(Provider::parse(p.as_str()), Some(p));
        }
        assert_eq!(Provider::parse("ftp"), None);
    }

    #[test]
    fn test_access_flags() {
        let ro = AccessFlags::OBJ_GET | AccessFlags::BCK_LIST;
        assert!(ro.allows(AccessFlags::OBJ_GET));
        assert!(!ro.allows(AccessFlags::OBJ_DELETE));
        assert!(AccessFlags::ALL.allows(AccessFlags::OBJ_DELETE));
        assert!(!AccessFlags::NONE.allows(AccessFlags::OBJ_GET));
    }

    #[test]
    fn test_bmd_versioning() {
        let mut bmd = Bmd::new();
        assert_eq!(bmd.version(), 0);

        let bck = Bck::new(Provider::Ais, "data");
        bmd.put(bck.clone(), BucketProps::default());
        assert_eq!(bmd.version(), 1);
        assert!(bmd.get(&bck).is_some());

        bmd.remove(&bck);
        assert_eq!(bmd.version(), 2);
        assert!(bmd.get(&bck).is_none());
    }
}
