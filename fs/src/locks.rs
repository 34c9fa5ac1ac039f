//! Per-object exclusive locks.
//!
//! Deletion must not race concurrent readers or writers of the same
//! object, so removal takes the object's exclusive lock for the duration
//! of the unlink. The table is sharded by object uname; entries exist
//! only while a lock is held or contended.

use ahash::RandomState;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

type Held = parking_lot::lock_api::ArcMutexGuard<parking_lot::RawMutex, ()>;

const SHARDS: usize = 64;

/// Sharded table of per-object exclusive locks.
pub struct ObjectLocks {
    shards: Vec<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
    hasher: RandomState,
}

impl ObjectLocks {
    /// Empty lock table.
    pub fn new() -> Self {
        Self {
            shards: (0..SHARDS).map(|_| Mutex::new(HashMap::new())).collect(),
            hasher: RandomState::with_seeds(7, 11, 13, 17),
        }
    }

    fn shard_of(&self, uname: &str) -> usize {
        (self.hasher.hash_one(uname) as usize) % SHARDS
    }

    /// Acquire the exclusive lock for `uname`, blocking while another
    /// holder exists. Released on guard drop, on every exit path.
    pub fn lock(&self, uname: &str) -> UnameGuard<'_> {
        let shard = self.shard_of(uname);
        let entry = {
            let mut map = self.shards[shard].lock();
            map.entry(uname.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        // Block outside the shard lock so unrelated objects stay unaffected.
        let held = entry.lock_arc();
        UnameGuard {
            locks: self,
            shard,
            uname: uname.to_string(),
            held: Some(held),
        }
    }

    #[cfg(test)]
    fn entry_count(&self) -> usize {
        self.shards.iter().map(|s| s.lock().len()).sum()
    }
}

impl Default for ObjectLocks {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII holder of one object's exclusive lock.
pub struct UnameGuard<'a> {
    locks: &'a ObjectLocks,
    shard: usize,
    uname: String,
    held: Option<Held>,
}

impl Drop for UnameGuard<'_> {
    fn drop(&mut self) {
        let mut map = self.locks.shards[self.shard].lock();
        if let Some(entry) = map.get(&self.uname) {
            // Two strong refs mean map + us: no waiter can appear while we
            // hold the shard lock, so the entry can go.
            if Arc::strong_count(entry) == 2 {
                map.remove(&self.uname);
            }
        }
        // Release the object lock before the shard lock so a surviving
        // waiter observes a consistent table.
        self.held = None;
        drop(map);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_exclusive_across_threads() {
        let locks = Arc::new(ObjectLocks::new());
        let active = Arc::new(AtomicU32::new(0));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let locks = locks.clone();
            let active = active.clone();
            handles.push(thread::spawn(move || {
                for _ in 0..50 {
                    let _g = locks.lock("ais/@global/b/contended");
                    assert_eq!(active.fetch_add(1, Ordering::SeqCst), 0);
                    thread::sleep(Duration::from_micros(50));
                    active.fetch_sub(1, Ordering::SeqCst);
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
    }

    #[test]
    fn test_distinct_objects_do_not_block() {
        let locks = ObjectLocks::new();
        let _a = locks.lock("ais/@global/b/x");
        let _b = locks.lock("ais/@global/b/y");
    }

    #[test]
    fn test_entries_are_reclaimed() {
        let locks = ObjectLocks::new();
        {
            let _a = locks.lock("ais/@global/b/x");
            let _b = locks.lock("ais/@global/b/y");
            assert_eq!(locks.entry_count(), 2);
        }
        assert_eq!(locks.entry_count(), 0);

        // Reacquirable after cleanup.
        let _again = locks.lock("ais/@global/b/x");
        assert_eq!(locks.entry_count(), 1);
    }
}
