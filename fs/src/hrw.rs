//! Highest-random-weight (rendezvous) placement.
//!
//! For each object there is exactly one correct home among the node's
//! mountpaths: the one with the highest hash weight for the object's
//! unique name. Instances found elsewhere are misplaced (or replicas).

use crate::mountpath::Mountpath;
use ahash::RandomState;
use std::hash::{BuildHasher, Hash, Hasher};

// Fixed seeds: placement must be stable across restarts and nodes.
const SEED: (u64, u64, u64, u64) = (
    0x9ae1_6a3b_2f90_404f,
    0x3bd3_9e10_cb0e_f593,
    0x6c62_272e_07bb_0142,
    0x2545_f491_4f6c_dd1d,
);

fn hasher() -> RandomState {
    RandomState::with_seeds(SEED.0, SEED.1, SEED.2, SEED.3)
}

/// Placement weight of `uname` on `mpath`.
pub fn weight(mpath: &Mountpath, uname: &str) -> u64 {
    let mut h = hasher().build_hasher();
    mpath.path().hash(&mut h);
    uname.hash(&mut h);
    h.finish()
}

/// The hash-ring winner for `uname` among `mpaths`.
///
/// Deterministic: weight ties (vanishingly unlikely) break toward the
/// lexicographically smaller mountpath.
pub fn select<'a>(mpaths: &'a [Mountpath], uname: &str) -> Option<&'a Mountpath> {
    mpaths
        .iter()
        .max_by(|a, b| {
            weight(a, uname)
                .cmp(&weight(b, uname))
                .then_with(|| b.path().cmp(a.path()))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mpaths(n: usize) -> Vec<Mountpath> {
        (0..n).map(|i| Mountpath::new(format!("/data/d{}", i))).collect()
    }

    #[test]
    fn test_stable_selection() {
        let mpaths = mpaths(4);
        let winner = select(&mpaths, "ais/@global/b/obj-17").unwrap().clone();
        for _ in 0..8 {
            assert_eq!(select(&mpaths, "ais/@global/b/obj-17").unwrap(), &winner);
        }
    }

    #[test]
    fn test_selection_is_order_independent() {
        let mut mpaths = mpaths(4);
        let winner = select(&mpaths, "aws/@global/b/x").unwrap().clone();
        mpaths.reverse();
        assert_eq!(select(&mpaths, "aws/@global/b/x").unwrap(), &winner);
    }

    #[test]
    fn test_spread() {
        // Not a distribution test, just a sanity check that placement is
        // not degenerate.
        let mpaths = mpaths(4);
        let mut seen = std::collections::HashSet::new();
        for i in 0..64 {
            let uname = format!("ais/@global/b/obj-{}", i);
            seen.insert(select(&mpaths, &uname).unwrap().clone());
        }
        assert!(seen.len() > 1);
    }

    #[test]
    fn test_empty_mountpaths() {
        assert!(select(&[], "ais/@global/b/x").is_none());
    }
}
