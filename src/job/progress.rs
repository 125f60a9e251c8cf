//! The progress observer protocol: how a UI (or a test harness) learns
//! about jobs it didn't spawn itself, grounded on
//! `examples/original_source/src/background.h`'s status-bar push model
//! (`vik_statusbar_set_message` on add/finish, a `GtkProgressBar`
//! fraction update per checkpoint).

use super::JobId;

/// Final outcome of a finished job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Ok,
    Cancelled,
    Error(String),
}

/// Implemented by anything that wants to be told about job lifecycle
/// events. All three methods may be called from any worker thread;
/// implementations must be `Send + Sync`.
pub trait ProgressObserver: Send + Sync {
    /// A new job was spawned and given a stable `id` and human-readable
    /// `description` (e.g. "loading example.gpx", "fetching SRTM tile
    /// N37W123").
    fn on_job_added(&self, id: JobId, description: &str);

    /// The job reached a new progress checkpoint. `percent` is
    /// monotonically non-decreasing for a given `id` over its lifetime.
    fn on_job_progress(&self, id: JobId, percent: u8);

    /// The job is done, one way or another; `id` will not be reused.
    fn on_job_finished(&self, id: JobId, status: JobStatus);
}

/// An observer that discards every event, for callers that don't need
/// progress reporting (tests, headless batch conversion).
pub struct NullObserver;

impl ProgressObserver for NullObserver {
    fn on_job_added(&self, _id: JobId, _description: &str) {}
    fn on_job_progress(&self, _id: JobId, _percent: u8) {}
    fn on_job_finished(&self, _id: JobId, _status: JobStatus) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_observer_accepts_every_event_without_panicking() {
        let obs = NullObserver;
        obs.on_job_added(JobId(1), "noop");
        obs.on_job_progress(JobId(1), 50);
        obs.on_job_finished(JobId(1), JobStatus::Ok);
    }
}
