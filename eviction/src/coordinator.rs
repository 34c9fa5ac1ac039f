//! Eviction coordinator.
//!
//! Spawns one jogger per mountpath, waits for all of them, and finalizes
//! the job with the aggregate outcome. The coordinator never walks files
//! itself.

use crate::env::NodeEnv;
use crate::job::Job;
use crate::jogger::{Jogger, JoggerInit};
use ostor_core::{Bck, EvictError, EvictStats};
use ostor_fs::{Mountpath, ObjectLocks};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{error, info, warn};

/// Parameters of one eviction run.
#[derive(Debug, Clone, Default)]
pub struct EvictRequest {
    /// Mountpaths to reclaim, one jogger each.
    pub mountpaths: Vec<Mountpath>,
    /// Restrict the run to these buckets; empty means every bucket on
    /// every provider.
    pub buckets: Vec<Bck>,
    /// Evict even from buckets whose properties forbid it.
    pub force: bool,
    /// Only remove trash, old workfiles, and strays; no LRU eviction.
    pub cleanup: bool,
}

/// Run an eviction job to completion and finalize it.
pub(crate) fn run(
    env: Arc<dyn NodeEnv>,
    stats: Arc<EvictStats>,
    job: Arc<Job>,
    req: EvictRequest,
) {
    let config = env.config();
    info!(
        job = job.id(),
        dont_evict = ?config.lru.dont_evict_time,
        mountpaths = req.mountpaths.len(),
        cleanup = req.cleanup,
        "eviction started"
    );

    if req.mountpaths.is_empty() {
        warn!(job = job.id(), "no mountpaths");
        job.finish(Some(EvictError::NoMountpaths));
        return;
    }

    let mpaths = Arc::new(req.mountpaths.clone());
    let locks = Arc::new(ObjectLocks::new());
    let mut stops = Vec::with_capacity(req.mountpaths.len());
    let mut handles = Vec::with_capacity(req.mountpaths.len());

    for (i, mpath) in req.mountpaths.iter().enumerate() {
        let stop = Arc::new(AtomicBool::new(false));
        stops.push(stop.clone());
        let mut jogger = Jogger::new(JoggerInit {
            env: env.clone(),
            job: job.clone(),
            stats: stats.clone(),
            locks: locks.clone(),
            mpath: mpath.clone(),
            mpaths: mpaths.clone(),
            buckets: req.buckets.clone(),
            force: req.force,
            cleanup: req.cleanup,
            stop,
        });
        let spawned = thread::Builder::new()
            .name(format!("evict-j{}", i))
            .spawn(move || jogger.run());
        match spawned {
            Ok(handle) => handles.push(handle),
            Err(err) => {
                error!(job = job.id(), mpath = %mpath, %err, "failed to spawn jogger");
                job.finish(Some(err.into()));
                // Unblock any joggers already spawned.
                for stop in &stops {
                    stop.store(true, Ordering::Relaxed);
                }
                for handle in handles {
                    let _ = handle.join();
                }
                return;
            }
        }
    }

    let mut first_err: Option<EvictError> = None;
    let mut aborted = false;
    for handle in handles {
        match handle.join() {
            Ok(Ok(())) => {}
            Ok(Err(err)) if err.is_aborted() => aborted = true,
            Ok(Err(err)) => {
                error!(job = job.id(), %err, "jogger failed");
                if first_err.is_none() {
                    first_err = Some(err);
                }
            }
            Err(_) => {
                error!(job = job.id(), "jogger panicked");
                if first_err.is_none() {
                    first_err = Some(EvictError::Io(io::Error::other("jogger panicked")));
                }
            }
        }
    }

    // Finalization: raise the per-jogger stop flags (idle joggers have
    // exited already; this is for symmetry with external observers).
    for stop in &stops {
        stop.store(true, Ordering::Relaxed);
    }

    let outcome = match first_err {
        Some(err) => Some(err),
        None if aborted || job.abort_requested() => {
            Some(EvictError::Aborted(job.id().to_string()))
        }
        None => None,
    };
    job.finish(outcome);

    let snap = job.snapshot();
    info!(
        job = job.id(),
        objs = snap.objs,
        bytes = snap.bytes,
        aborted = snap.aborted,
        failed = snap.failed(),
        "eviction finished"
    );
}
