//! Mountpath jogger.
//!
//! One jogger owns one mountpath for the lifetime of a run: it clears
//! trash, computes the byte budget, then walks each bucket classifying
//! entries into the atime heap and the scratch lists, and finally evicts.
//! Strictly sequential within the mountpath; all pacing happens here.

use crate::capacity::{self, CAP_CHECK_THRESH, MIN_EVICT_THRESH};
use crate::env::NodeEnv;
use crate::heap::AtimeHeap;
use crate::job::Job;
use crate::throttle::{ratio, THROTTLE_MAX, THROTTLE_MIN};
use ostor_core::{
    format_size, AccessFlags, Bck, Config, EvictError, EvictResult, EvictStats, Provider,
};
use ostor_fs::content::{parse_work_name, ContentType};
use ostor_fs::fqn::{resolve_fqn, ParsedFqn};
use ostor_fs::walk::{dir_size, walk, WalkOpts};
use ostor_fs::{Ct, Lom, Mountpath, ObjectLocks};
use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, error, info, warn};

const KIB: i64 = 1024;

/// Content types a bucket pass visits.
const WALK_CTS: [ContentType; 4] = [
    ContentType::Workfile,
    ContentType::Object,
    ContentType::EcSlice,
    ContentType::EcMeta,
];

/// Everything a jogger needs at spawn time.
pub(crate) struct JoggerInit {
    pub env: Arc<dyn NodeEnv>,
    pub job: Arc<Job>,
    pub stats: Arc<EvictStats>,
    pub locks: Arc<ObjectLocks>,
    pub mpath: Mountpath,
    pub mpaths: Arc<Vec<Mountpath>>,
    pub buckets: Vec<Bck>,
    pub force: bool,
    pub cleanup: bool,
    pub stop: Arc<AtomicBool>,
}

pub(crate) struct Jogger {
    env: Arc<dyn NodeEnv>,
    job: Arc<Job>,
    stats: Arc<EvictStats>,
    locks: Arc<ObjectLocks>,
    mpath: Mountpath,
    mpaths: Arc<Vec<Mountpath>>,
    buckets: Vec<Bck>,
    force: bool,
    cleanup: bool,
    stop: Arc<AtomicBool>,

    config: Arc<Config>,
    bck: Bck,
    now_ns: i64,
    cur_size: i64,
    total_size: i64,
    newest_ns: i64,
    throttle: bool,
    allow_del_obj: bool,

    heap: AtimeHeap,
    old_work: Vec<PathBuf>,
    misplaced_loms: Vec<Lom>,
    misplaced_ec: Vec<Ct>,
}

impl Jogger {
    pub(crate) fn new(init: JoggerInit) -> Self {
        let config = init.env.config();
        Self {
            env: init.env,
            job: init.job,
            stats: init.stats,
            locks: init.locks,
            mpath: init.mpath,
            mpaths: init.mpaths,
            buckets: init.buckets,
            force: init.force,
            cleanup: init.cleanup,
            stop: init.stop,
            config,
            bck: Bck::new(Provider::Ais, ""),
            now_ns: 0,
            cur_size: 0,
            total_size: 0,
            newest_ns: 0,
            throttle: false,
            allow_del_obj: false,
            heap: AtimeHeap::new(),
            old_work: Vec::new(),
            misplaced_loms: Vec::new(),
            misplaced_ec: Vec::new(),
        }
    }

    /// Run the full per-mountpath pipeline.
    pub(crate) fn run(&mut self) -> EvictResult<()> {
        match self.run_inner() {
            Err(ref err) if err.is_bucket_nought() || err.is_obj_nought() => {
                warn!(jogger = %self.mpath, %err, "continuing past vanished entry");
                Ok(())
            }
            other => other,
        }
    }

    fn run_inner(&mut self) -> EvictResult<()> {
        self.remove_trash()?;
        if !self.cleanup {
            self.compute_evict_size()?;
            if self.total_size < MIN_EVICT_THRESH {
                info!(jogger = %self.mpath, "used cap below threshold, nothing to do");
                return Ok(());
            }
        }
        if !self.buckets.is_empty() {
            info!(jogger = %self.mpath, freeing = %format_size(self.total_size), "requested buckets");
            let bcks = self.buckets.clone();
            let force = self.force;
            self.jog_bcks(bcks, force)
        } else {
            self.jog()
        }
    }

    fn jog(&mut self) -> EvictResult<()> {
        info!(jogger = %self.mpath, freeing = %format_size(self.total_size), "all buckets");
        for provider in Provider::ALL {
            let bcks = self.mpath.list_buckets(provider)?;
            self.jog_bcks(bcks, false)?;
        }
        Ok(())
    }

    fn jog_bcks(&mut self, mut bcks: Vec<Bck>, force: bool) -> EvictResult<()> {
        if bcks.is_empty() {
            return Ok(());
        }
        if bcks.len() > 1 {
            self.sort_bsize(&mut bcks);
        }
        for bck in bcks {
            self.bck = bck;
            self.allow_del_obj = match self.allow() {
                Ok(ok) => ok,
                Err(err) => {
                    if err.is_bucket_nought() {
                        self.env.trash_nonexisting_bucket(&self.bck);
                    } else {
                        error!(jogger = %self.mpath, bucket = %self.bck, %err, "skipping bucket");
                    }
                    continue;
                }
            };
            self.allow_del_obj = self.allow_del_obj || force;
            let size = self.jog_bck()?;
            if !self.cleanup {
                if size < KIB {
                    continue;
                }
                // recompute size-to-evict
                self.compute_evict_size()?;
                if self.total_size < KIB {
                    return Ok(());
                }
            }
        }
        Ok(())
    }

    /// Phase 1: reclaim the mountpath's trash directory.
    ///
    /// A missing trash dir is not an error; per-entry removal failures are
    /// logged and skipped. Between subdirectory removals the jogger
    /// samples capacity and throttles while below the high watermark.
    fn remove_trash(&mut self) -> EvictResult<()> {
        let trash = self.mpath.trash_path();
        let entries = match std::fs::read_dir(&trash) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(source) => {
                return Err(EvictError::WalkIo {
                    path: trash,
                    source,
                })
            }
        };

        for entry in entries {
            let entry = entry.map_err(|source| EvictError::WalkIo {
                path: trash.clone(),
                source,
            })?;
            let path = entry.path();
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            if is_dir {
                match std::fs::remove_dir_all(&path) {
                    Ok(()) => {
                        if let Some(used) = self.env.fs_used_percentage(self.mpath.path()) {
                            if used < self.config.lru.high_wm {
                                self.throttle_pace(used)?;
                            }
                        }
                    }
                    Err(err) => error!(jogger = %self.mpath, path = %path.display(), %err),
                }
            } else if let Err(err) = std::fs::remove_file(&path) {
                error!(jogger = %self.mpath, path = %path.display(), %err);
            }
        }
        Ok(())
    }

    /// Phase 2: the byte budget for this mountpath.
    fn compute_evict_size(&mut self) -> EvictResult<()> {
        let stats = self.env.fs_stats(self.mpath.path())?;
        self.total_size =
            capacity::evict_size(&stats, self.config.lru.low_wm, self.config.lru.high_wm);
        Ok(())
    }

    /// One bucket: reset scratch state, walk and classify, then evict.
    /// Returns the bytes freed from workfiles and the heap drain.
    fn jog_bck(&mut self) -> EvictResult<i64> {
        self.heap.clear();
        self.old_work.clear();
        self.misplaced_loms.clear();
        self.misplaced_ec.clear();
        self.now_ns = ostor_fs::times::unix_nanos(SystemTime::now());

        let mpath = self.mpath.clone();
        let bck = self.bck.clone();
        let opts = WalkOpts {
            mpath: &mpath,
            bck: &bck,
            cts: &WALK_CTS,
        };
        walk(&opts, &mut |path, md| self.visit(path, md))?;

        self.evict()
    }

    /// Walker callback: yield, resolve, classify.
    fn visit(&mut self, path: &Path, md: &Metadata) -> EvictResult<()> {
        self.yield_term()?;
        let Some(parsed) = resolve_fqn(&self.mpaths, path) else {
            // Unrelated to the layout; not ours to touch.
            return Ok(());
        };
        if parsed.content_type == ContentType::Object {
            self.visit_lom(parsed, md);
        } else {
            self.visit_ct(parsed, md);
        }
        Ok(())
    }

    /// Classify a non-object entry (workfile, EC slice, EC metafile).
    fn visit_ct(&mut self, parsed: ParsedFqn, md: &Metadata) {
        match parsed.content_type {
            ContentType::Workfile => {
                let Some(name) = Path::new(&parsed.obj_name).file_name().and_then(|n| n.to_str())
                else {
                    return;
                };
                // Workfiles: remove old ones, leave live writers alone.
                if let Some((_base, old)) = parse_work_name(name) {
                    if old {
                        let fqn = parsed.mpath.make_fqn(
                            &parsed.bck,
                            ContentType::Workfile,
                            &parsed.obj_name,
                        );
                        self.old_work.push(fqn);
                    }
                }
            }
            ContentType::EcSlice => {
                // EC slices:
                // - EC enabled: remove only slices with missing metafiles
                // - EC disabled: remove all slices
                let bmd = self.env.bmd();
                let ec_enabled = bmd.get(&parsed.bck).map(|p| p.ec.enabled).unwrap_or(false);
                let mut ct = Ct::from_parsed(parsed);
                ct.load_md(md);
                if !ec_enabled {
                    self.old_work.push(ct.fqn().to_path_buf());
                    return;
                }
                // Saving a slice is not atomic: the metafile follows it.
                // Skip freshly written slices to avoid eating half-done
                // writes.
                if ct.mtime_ns() + self.dont_evict_ns() > self.now_ns {
                    return;
                }
                if !ct.meta_fqn().is_file() {
                    self.misplaced_ec.push(ct);
                }
            }
            ContentType::EcMeta => {
                // EC metafiles:
                // - EC enabled: remove only without corresponding slice or replica
                // - EC disabled: remove all metafiles
                let bmd = self.env.bmd();
                let ec_enabled = bmd.get(&parsed.bck).map(|p| p.ec.enabled).unwrap_or(false);
                let ct = Ct::from_parsed(parsed);
                if !ec_enabled {
                    self.old_work.push(ct.fqn().to_path_buf());
                    return;
                }
                // The metafile is saved last; with neither slice nor
                // replica present it is a stray.
                if ct.sibling_fqn(ContentType::EcSlice).is_file() {
                    return;
                }
                if ct.sibling_fqn(ContentType::Object).is_file() {
                    return;
                }
                self.old_work.push(ct.fqn().to_path_buf());
            }
            ContentType::Object => {
                debug_assert!(false, "object routed to visit_ct");
            }
        }
    }

    /// Classify an object entry.
    fn visit_lom(&mut self, parsed: ParsedFqn, md: &Metadata) {
        if !self.allow_del_obj {
            return;
        }
        let mut lom = Lom::from_parsed(parsed);
        lom.load_md(md);
        if lom.atime_ns() + self.dont_evict_ns() > self.now_ns {
            return;
        }

        // Any instance off its HRW home is misplaced, even when the home
        // instance exists; removal is gated solely on no mover being
        // active.
        if !lom.is_hrw(&self.mpaths) {
            let bmd = self.env.bmd();
            let ec_enabled = bmd.get(lom.bck()).map(|p| p.ec.enabled).unwrap_or(false);
            if ec_enabled {
                let ct = Ct::from_lom(&lom, ContentType::Object);
                if !ct.meta_fqn().is_file() {
                    self.misplaced_ec.push(ct);
                }
            } else {
                self.misplaced_loms.push(lom);
            }
            return;
        }

        if self.cleanup {
            return;
        }

        // The heap caps its own working set: once it holds enough bytes,
        // only files older than its newest member are admitted.
        if self.cur_size >= self.total_size && lom.atime_ns() > self.newest_ns {
            return;
        }
        self.cur_size += lom.size() as i64;
        if lom.atime_ns() > self.newest_ns {
            self.newest_ns = lom.atime_ns();
        }
        self.heap.push(lom);
    }

    /// Phase 3: drain the scratch lists and the heap, oldest first.
    fn evict(&mut self) -> EvictResult<i64> {
        let mut size = 0i64;
        let mut fevicted = 0u64;
        let mut bevicted = 0u64;
        let mut cap_check = 0i64;

        // 1. rm old workfiles and strays
        for fqn in std::mem::take(&mut self.old_work) {
            // Stat first: freed bytes are accounted from the size at
            // removal time, and already-vanished files are not an error.
            let Ok(md) = std::fs::metadata(&fqn) else {
                continue;
            };
            match std::fs::remove_file(&fqn) {
                Ok(()) => size += md.len() as i64,
                Err(err) => {
                    warn!(jogger = %self.mpath, path = %fqn.display(), %err, "failed to remove old work")
                }
            }
        }

        // 2. rm misplaced objects, unless a mover may still want them
        if !self.env.rebalance_or_resilver_active() {
            for lom in std::mem::take(&mut self.misplaced_loms) {
                let mut refreshed = lom.clone();
                let removed = match refreshed.load() {
                    Ok(()) => {
                        let _lock = self.locks.lock(&refreshed.uname());
                        refreshed.remove().is_ok()
                    }
                    // No longer loadable: best-effort unlink of the bare file.
                    Err(_) => std::fs::remove_file(lom.fqn()).is_ok(),
                };
                if removed {
                    cap_check = self.post_remove(cap_check, refreshed.size() as i64)?;
                }
            }
        } else {
            self.misplaced_loms.clear();
        }

        // 3. rm EC slices and replicas still missing their metafile at
        //    removal time
        for ct in std::mem::take(&mut self.misplaced_ec) {
            if ct.meta_fqn().is_file() {
                continue;
            }
            if ct.remove().is_ok() {
                cap_check = self.post_remove(cap_check, ct.size() as i64)?;
            }
        }

        // 4. evict, oldest first, until the budget is spent
        while self.total_size > 0 {
            let Some(lom) = self.heap.pop() else { break };
            if !self.evict_obj(&lom) {
                continue;
            }
            let obj_size = lom.size() as i64;
            bevicted += lom.size();
            fevicted += 1;
            size += obj_size;
            cap_check = self.post_remove(cap_check, obj_size)?;
        }

        self.stats.add_evicted(fevicted, bevicted);
        self.job.add(fevicted as i64, bevicted as i64);
        Ok(size)
    }

    /// Remove one object under its exclusive lock.
    fn evict_obj(&self, lom: &Lom) -> bool {
        let _lock = self.locks.lock(&lom.uname());
        match lom.remove() {
            Ok(()) => true,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(jogger = %self.mpath, obj = %lom.uname(), "object gone before eviction");
                false
            }
            Err(err) => {
                error!(jogger = %self.mpath, obj = %lom.uname(), %err, "failed to remove");
                false
            }
        }
    }

    /// Housekeeping after every removal; full recomputation once per
    /// [`CAP_CHECK_THRESH`] freed bytes.
    fn post_remove(&mut self, prev: i64, size: i64) -> EvictResult<i64> {
        self.total_size -= size;
        let cap_check = prev + size;
        self.yield_term()?;
        if cap_check < CAP_CHECK_THRESH {
            return Ok(cap_check);
        }

        // init, recompute, and throttle - once per CAP_CHECK_THRESH
        self.throttle = false;
        self.allow_del_obj = self.allow().unwrap_or(false);
        self.config = self.env.config();
        self.now_ns = ostor_fs::times::unix_nanos(SystemTime::now());
        if let Some(used) = self.env.fs_used_percentage(self.mpath.path()) {
            if used < self.config.lru.high_wm {
                self.throttle_pace(used)?;
            }
        }
        Ok(0)
    }

    /// Back off when disk utilization outweighs capacity pressure.
    fn throttle_pace(&mut self, used_pct: i64) -> EvictResult<()> {
        if self.env.is_idle(&self.mpath, &self.config) {
            return Ok(());
        }
        let ratio_capacity = ratio(self.config.lru.high_wm, self.config.lru.low_wm, used_pct);
        let curr = self.env.mpath_util(self.mpath.path());
        let ratio_utilization = ratio(
            self.config.disk.disk_util_high_wm,
            self.config.disk.disk_util_low_wm,
            curr,
        );
        if ratio_utilization > ratio_capacity {
            if used_pct < (self.config.lru.low_wm + self.config.lru.high_wm) / 2 {
                self.throttle = true;
            }
            std::thread::sleep(THROTTLE_MAX);
            self.yield_term()?;
        }
        Ok(())
    }

    /// The cancellation observation point, called between walked entries
    /// and after every removal. Also applies the sticky slow-down.
    fn yield_term(&self) -> EvictResult<()> {
        if self.job.abort_requested() || self.stop.load(Ordering::Relaxed) {
            return Err(EvictError::Aborted(self.job.id().to_string()));
        }
        if self.throttle {
            std::thread::sleep(THROTTLE_MIN);
        }
        if self.job.finished() {
            return Err(EvictError::Aborted(self.job.id().to_string()));
        }
        Ok(())
    }

    /// Sort buckets by on-disk size, biggest first, to drain large
    /// buckets before small ones.
    fn sort_bsize(&self, bcks: &mut [Bck]) {
        bcks.sort_by_cached_key(|bck| {
            let path = self.mpath.make_path_ct(bck, ContentType::Object);
            std::cmp::Reverse(dir_size(&path))
        });
    }

    /// Whether objects of the current bucket may be deleted: bucket must
    /// exist, have LRU enabled, and permit object deletion.
    fn allow(&self) -> EvictResult<bool> {
        let bmd = self.env.bmd();
        let props = bmd
            .get(&self.bck)
            .ok_or_else(|| EvictError::BucketNotFound(self.bck.clone()))?;
        Ok(props.lru.enabled && props.access.allows(AccessFlags::OBJ_DELETE))
    }

    fn dont_evict_ns(&self) -> i64 {
        self.config.lru.dont_evict_time.as_nanos().min(i64::MAX as u128) as i64
    }
}
