//! Job registry.
//!
//! Enforces at most one eviction job per node. The host creates one
//! [`Registry`] at node start and drains it at node stop; everything else
//! goes through `start`/`abort`/`snapshot`.

use crate::coordinator::{self, EvictRequest};
use crate::env::NodeEnv;
use crate::job::{Job, JobSnapshot};
use ostor_core::{EvictError, EvictResult, EvictStats};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

struct Active {
    job: Arc<Job>,
    handle: Option<JoinHandle<()>>,
}

/// Node-wide eviction job registry.
pub struct Registry {
    env: Arc<dyn NodeEnv>,
    stats: Arc<EvictStats>,
    seq: AtomicU64,
    active: Mutex<Option<Active>>,
}

impl Registry {
    /// Registry for a node described by `env`, reporting into `stats`.
    pub fn new(env: Arc<dyn NodeEnv>, stats: Arc<EvictStats>) -> Self {
        Self {
            env,
            stats,
            seq: AtomicU64::new(0),
            active: Mutex::new(None),
        }
    }

    /// Start an eviction job.
    ///
    /// Rejects with [`EvictError::AlreadyRunning`] while a previous job
    /// has not finished. Returns a handle to the running job; completion
    /// is observed via [`Job::finished`] or [`Registry::snapshot`].
    pub fn start(&self, req: EvictRequest) -> EvictResult<Arc<Job>> {
        let mut active = self.active.lock();

        if let Some(prev) = active.as_ref() {
            if prev.job.running() {
                return Err(EvictError::AlreadyRunning(prev.job.id().to_string()));
            }
        }
        // Reap the previous run's thread before replacing it.
        if let Some(mut prev) = active.take() {
            if let Some(handle) = prev.handle.take() {
                let _ = handle.join();
            }
        }

        let id = format!("evict-{}", self.seq.fetch_add(1, Ordering::Relaxed) + 1);
        let job = Arc::new(Job::new(id));

        let env = self.env.clone();
        let stats = self.stats.clone();
        let job_for_run = job.clone();
        let handle = std::thread::Builder::new()
            .name("evict-main".to_string())
            .spawn(move || coordinator::run(env, stats, job_for_run, req))?;

        *active = Some(Active {
            job: job.clone(),
            handle: Some(handle),
        });
        Ok(job)
    }

    /// Request cancellation of the running job, if any. Returns whether
    /// an abort was newly requested.
    pub fn abort(&self) -> bool {
        let active = self.active.lock();
        match active.as_ref() {
            Some(a) if a.job.running() => a.job.abort(),
            _ => false,
        }
    }

    /// Snapshot of the most recent job, running or finished.
    pub fn snapshot(&self) -> Option<JobSnapshot> {
        self.active.lock().as_ref().map(|a| a.job.snapshot())
    }

    /// Abort whatever is running and wait for it. Called at node stop.
    pub fn drain(&self) {
        let taken = {
            let mut active = self.active.lock();
            active.take()
        };
        if let Some(mut active) = taken {
            active.job.abort();
            if let Some(handle) = active.handle.take() {
                let _ = handle.join();
            }
        }
    }
}

impl Drop for Registry {
    fn drop(&mut self) {
        self.drain();
    }
}
