//! Min-heap of eviction candidates.
//!
//! Objects ordered by access time, oldest on top. Owned by exactly one
//! jogger; not thread-safe by design.

use ostor_fs::Lom;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

struct Entry {
    atime_ns: i64,
    seq: u64,
    lom: Lom,
}

// BinaryHeap is a max-heap; reverse the ordering so the oldest access
// time wins. Sequence numbers make the order total (ties pop in insertion
// order, though nothing relies on that).
impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .atime_ns
            .cmp(&self.atime_ns)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.atime_ns == other.atime_ns && self.seq == other.seq
    }
}

impl Eq for Entry {}

/// Priority queue of objects keyed on cached access time.
#[derive(Default)]
pub struct AtimeHeap {
    heap: BinaryHeap<Entry>,
    seq: u64,
}

impl AtimeHeap {
    /// Empty heap.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an eviction candidate. O(log n) amortized.
    pub fn push(&mut self, lom: Lom) {
        self.seq += 1;
        self.heap.push(Entry {
            atime_ns: lom.atime_ns(),
            seq: self.seq,
            lom,
        });
    }

    /// Remove and return the least recently used candidate.
    pub fn pop(&mut self) -> Option<Lom> {
        self.heap.pop().map(|e| e.lom)
    }

    /// Number of queued candidates.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether the heap holds no candidates.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Drop all candidates (reused across buckets).
    pub fn clear(&mut self) {
        self.heap.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ostor_core::{Bck, Provider};
    use ostor_fs::Mountpath;
    use std::time::{Duration, SystemTime};

    fn lom_with_atime(name: &str, age: Duration) -> Lom {
        let dir = tempfile::tempdir().unwrap();
        let mpath = Mountpath::new(dir.path());
        let bck = Bck::new(Provider::Ais, "b");
        let fqn = mpath.make_fqn(&bck, ostor_fs::ContentType::Object, name);
        std::fs::create_dir_all(fqn.parent().unwrap()).unwrap();
        std::fs::write(&fqn, b"x").unwrap();
        let past = SystemTime::now() - age;
        ostor_fs::times::set_file_times(&fqn, past, past).unwrap();

        let mut lom = Lom::new(mpath, bck, name);
        lom.load().unwrap();
        // Keep the tempdir alive long enough for load; Lom carries only
        // the cached values afterwards.
        drop(dir);
        lom
    }

    #[test]
    fn test_oldest_pops_first() {
        let mut heap = AtimeHeap::new();
        heap.push(lom_with_atime("mid", Duration::from_secs(3600)));
        heap.push(lom_with_atime("old", Duration::from_secs(7200)));
        heap.push(lom_with_atime("new", Duration::from_secs(60)));

        assert_eq!(heap.len(), 3);
        assert_eq!(heap.pop().unwrap().obj_name(), "old");
        assert_eq!(heap.pop().unwrap().obj_name(), "mid");
        assert_eq!(heap.pop().unwrap().obj_name(), "new");
        assert!(heap.pop().is_none());
    }

    #[test]
    fn test_clear() {
        let mut heap = AtimeHeap::new();
        heap.push(lom_with_atime("a", Duration::from_secs(10)));
        assert!(!heap.is_empty());
        heap.clear();
        assert!(heap.is_empty());
    }
}
