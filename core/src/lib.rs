//! ostor-core: shared building blocks for the ostor storage node.
//!
//! This crate provides the types every other node subsystem depends on:
//!
//! - **Configuration**: [`Config`] with LRU watermarks and disk-utilization
//!   bands, loaded from TOML
//! - **Buckets**: [`Bck`] identifiers, [`BucketProps`], the [`AccessFlags`]
//!   bitset, and the [`Bmd`] bucket-metadata table
//! - **Errors**: the [`EvictError`] taxonomy shared by the eviction engine
//! - **Statistics**: [`EvictStats`] atomic counters with point-in-time
//!   snapshots

#![warn(missing_docs)]
#![warn(clippy::all)]

mod bucket;
mod config;
mod error;
mod stats;

pub use bucket::{AccessFlags, Bck, Bmd, BucketProps, EcProps, LruProps, Provider, NS_GLOBAL};
pub use config::{format_size, parse_duration, Config, DiskConfig, LruConfig};
pub use error::{EvictError, EvictResult};
pub use stats::{EvictStats, StatsSnapshot};
