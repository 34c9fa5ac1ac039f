//! Eviction job state.

use ostor_core::EvictError;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::time::SystemTime;

/// A single eviction run: lifecycle flags, progress counters, and the
/// abort signal joggers poll at yield points.
#[derive(Debug)]
pub struct Job {
    id: String,
    start_time: SystemTime,
    end_time: Mutex<Option<SystemTime>>,
    running: AtomicBool,
    finished: AtomicBool,
    aborted: AtomicBool,
    abort_requested: AtomicBool,
    objs: AtomicI64,
    bytes: AtomicI64,
    err: Mutex<Option<EvictError>>,
}

/// Job kind reported in snapshots.
pub const KIND: &str = "evict";

impl Job {
    pub(crate) fn new(id: String) -> Self {
        Self {
            id,
            start_time: SystemTime::now(),
            end_time: Mutex::new(None),
            running: AtomicBool::new(true),
            finished: AtomicBool::new(false),
            aborted: AtomicBool::new(false),
            abort_requested: AtomicBool::new(false),
            objs: AtomicI64::new(0),
            bytes: AtomicI64::new(0),
            err: Mutex::new(None),
        }
    }

    /// Unique id of this run.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Request cancellation. Returns false when the job already finished
    /// or an abort was already requested. Joggers observe the request at
    /// their next yield point.
    pub fn abort(&self) -> bool {
        if self.finished.load(Ordering::SeqCst) {
            return false;
        }
        !self.abort_requested.swap(true, Ordering::SeqCst)
    }

    /// Whether cancellation has been requested.
    pub fn abort_requested(&self) -> bool {
        self.abort_requested.load(Ordering::SeqCst)
    }

    /// Whether the job is still running.
    pub fn running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Whether the job has finalized.
    pub fn finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }

    /// Whether the job finalized due to an abort.
    pub fn aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }

    pub(crate) fn add(&self, objs: i64, bytes: i64) {
        self.objs.fetch_add(objs, Ordering::Relaxed);
        self.bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    pub(crate) fn finish(&self, err: Option<EvictError>) {
        {
            let mut end = self.end_time.lock();
            if end.is_some() {
                return;
            }
            *end = Some(SystemTime::now());
        }
        if let Some(err) = err {
            if err.is_aborted() {
                self.aborted.store(true, Ordering::SeqCst);
            } else {
                *self.err.lock() = Some(err);
            }
        }
        self.running.store(false, Ordering::SeqCst);
        self.finished.store(true, Ordering::SeqCst);
    }

    /// Read-only copy of the job state, safe to hand to observers.
    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            id: self.id.clone(),
            kind: KIND,
            start_time: self.start_time,
            end_time: *self.end_time.lock(),
            running: self.running(),
            finished: self.finished(),
            aborted: self.aborted(),
            objs: self.objs.load(Ordering::Relaxed),
            bytes: self.bytes.load(Ordering::Relaxed),
            err: self.err.lock().as_ref().map(|e| e.to_string()),
        }
    }
}

/// Point-in-time copy of a [`Job`].
#[derive(Debug, Clone)]
pub struct JobSnapshot {
    /// Unique id of the run.
    pub id: String,
    /// Job kind; always [`KIND`].
    pub kind: &'static str,
    /// When the job started.
    pub start_time: SystemTime,
    /// When the job finalized, if it has.
    pub end_time: Option<SystemTime>,
    /// Still running.
    pub running: bool,
    /// Finalized.
    pub finished: bool,
    /// Finalized due to abort.
    pub aborted: bool,
    /// Objects evicted so far.
    pub objs: i64,
    /// Bytes freed by object eviction so far.
    pub bytes: i64,
    /// Failure, when the job failed.
    pub err: Option<String>,
}

impl JobSnapshot {
    /// Whether the run completed with a non-abort error.
    pub fn failed(&self) -> bool {
        self.err.is_some()
    }
}
