//! Job aggregator and progress snapshots
//!
//! The aggregator is the only state shared across workers. Counters are
//! plain atomics and only ever incremented, so snapshots are monotonically
//! non-decreasing regardless of worker completion order.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;
use transparenz_domain::{ImportJob, JobStatus, TaskId, TaskState};

/// Per-file status as exposed through the progress interface
#[derive(Debug, Clone, serde::Serialize)]
pub struct FileStatus {
    /// Task id
    pub task_id: TaskId,
    /// Original filename
    pub filename: String,
    /// Current task state
    pub state: TaskState,
    /// Retries consumed
    pub retry_count: u32,
    /// Last error, verbatim
    pub last_error: Option<String>,
}

/// Point-in-time view of a job
#[derive(Debug, Clone, serde::Serialize)]
pub struct ProgressSnapshot {
    /// Total files in the batch
    pub total: usize,
    /// Files that reached Succeeded or Failed
    pub processed: usize,
    /// Files that succeeded
    pub succeeded: usize,
    /// Files that failed
    pub failed: usize,
    /// Files skipped because the job aborted before they started
    pub skipped: usize,
    /// Index of the chunk currently being processed
    pub current_chunk: usize,
    /// Total number of chunks
    pub chunk_count: usize,
    /// Job status at the time of the snapshot
    pub status: JobStatus,
    /// Per-file statuses
    pub files: Vec<FileStatus>,
}

/// Tracks per-file and per-job status for one import job
///
/// Workers report through the `record_*` methods; readers take snapshots.
/// Counters never decrease.
pub struct JobAggregator {
    total: usize,
    chunk_count: usize,
    processed: AtomicUsize,
    succeeded: AtomicUsize,
    failed: AtomicUsize,
    skipped: AtomicUsize,
    current_chunk: AtomicUsize,
    status: RwLock<JobStatus>,
    files: RwLock<Vec<FileStatus>>,
}

impl JobAggregator {
    /// Create an aggregator for a freshly submitted job
    pub fn new(job: &ImportJob) -> Self {
        let files = job
            .tasks
            .iter()
            .map(|t| FileStatus {
                task_id: t.id,
                filename: t.filename.clone(),
                state: t.state,
                retry_count: t.retry_count,
                last_error: t.last_error.clone(),
            })
            .collect();

        Self {
            total: job.tasks.len(),
            chunk_count: job.chunk_count(),
            processed: AtomicUsize::new(0),
            succeeded: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            skipped: AtomicUsize::new(0),
            current_chunk: AtomicUsize::new(0),
            status: RwLock::new(JobStatus::Running),
            files: RwLock::new(files),
        }
    }

    /// Mark the chunk currently being processed
    pub fn set_chunk(&self, index: usize) {
        self.current_chunk.store(index, Ordering::SeqCst);
    }

    /// Record that a file entered an attempt
    pub fn record_attempting(&self, index: usize) {
        self.update_file(index, TaskState::Attempting, None, None);
    }

    /// Record a successful file
    pub fn record_success(&self, index: usize, retry_count: u32) {
        self.update_file(index, TaskState::Succeeded, Some(retry_count), None);
        self.succeeded.fetch_add(1, Ordering::SeqCst);
        self.processed.fetch_add(1, Ordering::SeqCst);
    }

    /// Record a failed file with its last error, verbatim
    pub fn record_failure(&self, index: usize, retry_count: u32, error: String) {
        self.update_file(index, TaskState::Failed, Some(retry_count), Some(error));
        self.failed.fetch_add(1, Ordering::SeqCst);
        self.processed.fetch_add(1, Ordering::SeqCst);
    }

    /// Record a file that never started because the job ended first
    pub fn record_skipped(&self, index: usize) {
        self.update_file(index, TaskState::Skipped, None, None);
        self.skipped.fetch_add(1, Ordering::SeqCst);
    }

    /// Set the job status
    pub fn set_status(&self, status: JobStatus) {
        *self.status.write().unwrap() = status;
    }

    /// Current job status
    pub fn status(&self) -> JobStatus {
        *self.status.read().unwrap()
    }

    /// Number of failed files so far
    pub fn failed_count(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    /// Take a consistent point-in-time snapshot
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            total: self.total,
            processed: self.processed.load(Ordering::SeqCst),
            succeeded: self.succeeded.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
            skipped: self.skipped.load(Ordering::SeqCst),
            current_chunk: self.current_chunk.load(Ordering::SeqCst),
            chunk_count: self.chunk_count,
            status: self.status(),
            files: self.files.read().unwrap().clone(),
        }
    }

    fn update_file(
        &self,
        index: usize,
        state: TaskState,
        retry_count: Option<u32>,
        last_error: Option<String>,
    ) {
        let mut files = self.files.write().unwrap();
        if let Some(file) = files.get_mut(index) {
            file.state = state;
            if let Some(count) = retry_count {
                file.retry_count = count;
            }
            if last_error.is_some() {
                file.last_error = last_error;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use transparenz_domain::{FileTask, JobConfig};

    fn aggregator(n: usize) -> JobAggregator {
        let tasks: Vec<FileTask> = (0..n).map(|i| FileTask::new(format!("f{}.csv", i), 1)).collect();
        let job = ImportJob::new(tasks, JobConfig { chunk_size: 3, ..Default::default() }, 0);
        JobAggregator::new(&job)
    }

    #[test]
    fn test_initial_snapshot() {
        let agg = aggregator(7);
        let snap = agg.snapshot();

        assert_eq!(snap.total, 7);
        assert_eq!(snap.chunk_count, 3);
        assert_eq!(snap.processed, 0);
        assert_eq!(snap.status, JobStatus::Running);
        assert_eq!(snap.files.len(), 7);
        assert!(snap.files.iter().all(|f| f.state == TaskState::Pending));
    }

    #[test]
    fn test_counters_accumulate() {
        let agg = aggregator(4);
        agg.record_success(0, 0);
        agg.record_failure(1, 3, "timeout".to_string());
        agg.record_skipped(2);
        agg.record_skipped(3);

        let snap = agg.snapshot();
        assert_eq!(snap.processed, 2);
        assert_eq!(snap.succeeded, 1);
        assert_eq!(snap.failed, 1);
        assert_eq!(snap.skipped, 2);
        assert_eq!(snap.files[1].last_error.as_deref(), Some("timeout"));
    }

    #[test]
    fn test_snapshots_are_monotonic_under_concurrency() {
        use std::sync::Arc;

        let agg = Arc::new(aggregator(64));

        let writer = {
            let agg = Arc::clone(&agg);
            std::thread::spawn(move || {
                for i in 0..64 {
                    if i % 2 == 0 {
                        agg.record_success(i, 0);
                    } else {
                        agg.record_failure(i, 1, "boom".to_string());
                    }
                }
            })
        };

        let mut last = (0, 0, 0, 0);
        for _ in 0..1000 {
            let snap = agg.snapshot();
            let now = (snap.processed, snap.succeeded, snap.failed, snap.skipped);
            assert!(now.0 >= last.0 && now.1 >= last.1 && now.2 >= last.2 && now.3 >= last.3);
            last = now;
        }

        writer.join().unwrap();
        let final_snap = agg.snapshot();
        assert_eq!(final_snap.processed, 64);
    }
}
