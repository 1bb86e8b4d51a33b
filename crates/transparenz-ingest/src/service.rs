//! Ingestion service: chunk scheduling, worker pool, job registry
//!
//! `submit` returns a job id immediately; a spawned driver task processes
//! the batch chunk by chunk. Chunks run strictly sequentially; within a
//! chunk every file gets its own worker, each driven through the retry
//! controller. Jobs live in a concurrent map keyed by id, so progress and
//! abort are available from any task holding the service.

use crate::events::IngestEvent;
use crate::progress::{JobAggregator, ProgressSnapshot};
use crate::retry::{self, RetryPolicy, TaskOutcome};
use crate::IngestError;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use transparenz_domain::traits::{DocumentStore, OcrService};
use transparenz_domain::{
    ExtractedRecord, FileTask, ImportJob, JobConfig, JobId, JobStatus, RecordId, TaskState,
};
use transparenz_extract::Extractor;
use transparenz_ocr::OcrError;

/// One uploaded file: name plus raw content
#[derive(Debug, Clone)]
pub struct FileUpload {
    /// Original filename
    pub filename: String,
    /// Raw file content
    pub bytes: Vec<u8>,
}

struct JobHandle {
    aggregator: Arc<JobAggregator>,
    cancel: CancellationToken,
    done: watch::Receiver<bool>,
}

#[derive(Clone)]
struct RetryTuning {
    base_backoff: Duration,
    max_backoff: Duration,
    attempt_timeout_override: Option<Duration>,
}

impl Default for RetryTuning {
    fn default() -> Self {
        Self {
            base_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
            attempt_timeout_override: None,
        }
    }
}

/// The ingestion service
///
/// Holds the extractor, the document store and the registry of live jobs.
/// Cloning is cheap; all state is behind `Arc`.
pub struct IngestService<O, S> {
    extractor: Arc<Extractor<O>>,
    store: Arc<Mutex<S>>,
    jobs: Arc<RwLock<HashMap<JobId, Arc<JobHandle>>>>,
    tuning: RetryTuning,
    events: Option<mpsc::UnboundedSender<IngestEvent>>,
}

impl<O, S> Clone for IngestService<O, S> {
    fn clone(&self) -> Self {
        Self {
            extractor: Arc::clone(&self.extractor),
            store: Arc::clone(&self.store),
            jobs: Arc::clone(&self.jobs),
            tuning: self.tuning.clone(),
            events: self.events.clone(),
        }
    }
}

impl<O, S> IngestService<O, S>
where
    O: OcrService<Error = OcrError> + Send + Sync + 'static,
    S: DocumentStore + Send + 'static,
    S::Error: std::fmt::Display,
{
    /// Create a service over an extractor and a document store
    pub fn new(extractor: Extractor<O>, store: S) -> Self {
        Self {
            extractor: Arc::new(extractor),
            store: Arc::new(Mutex::new(store)),
            jobs: Arc::new(RwLock::new(HashMap::new())),
            tuning: RetryTuning::default(),
            events: None,
        }
    }

    /// Override the per-attempt timeout instead of deriving it from the
    /// job configuration (useful for testing)
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.tuning.attempt_timeout_override = Some(timeout);
        self
    }

    /// Tune the retry backoff
    pub fn with_backoff(mut self, base: Duration, cap: Duration) -> Self {
        self.tuning.base_backoff = base;
        self.tuning.max_backoff = cap;
        self
    }

    /// Send ingestion events to the given sink (e.g. the quality monitor)
    pub fn with_event_sink(mut self, sink: mpsc::UnboundedSender<IngestEvent>) -> Self {
        self.events = Some(sink);
        self
    }

    /// Shared handle to the underlying document store
    ///
    /// Query-side consumers (the fact checker) read through this same
    /// handle, so verification always sees what ingestion persisted.
    pub fn store(&self) -> Arc<Mutex<S>> {
        Arc::clone(&self.store)
    }

    /// Submit a batch for ingestion
    ///
    /// Validates the configuration, registers the job and returns its id
    /// immediately; processing happens on a spawned driver task.
    pub fn submit(&self, files: Vec<FileUpload>, config: JobConfig) -> Result<JobId, IngestError> {
        if files.is_empty() {
            return Err(IngestError::EmptyBatch);
        }
        config.validate().map_err(IngestError::InvalidConfig)?;

        let tasks: Vec<FileTask> = files
            .iter()
            .map(|f| FileTask::new(f.filename.clone(), f.bytes.len() as u64))
            .collect();

        let job = ImportJob::new(tasks, config, unix_now());
        let job_id = job.id;

        let aggregator = Arc::new(JobAggregator::new(&job));
        let cancel = CancellationToken::new();
        let (done_tx, done_rx) = watch::channel(false);

        let handle = Arc::new(JobHandle {
            aggregator: Arc::clone(&aggregator),
            cancel: cancel.clone(),
            done: done_rx,
        });
        self.jobs.write().unwrap().insert(job_id, handle);

        info!(
            job = %job_id,
            files = files.len(),
            chunks = job.chunk_count(),
            chunk_size = job.config.chunk_size,
            "job submitted"
        );

        let driver = JobDriver {
            extractor: Arc::clone(&self.extractor),
            store: Arc::clone(&self.store),
            aggregator,
            cancel,
            tuning: self.tuning.clone(),
            events: self.events.clone(),
        };
        tokio::spawn(async move {
            driver.run(job, files).await;
            let _ = done_tx.send(true);
        });

        Ok(job_id)
    }

    /// Point-in-time progress snapshot for a job
    pub fn progress(&self, id: JobId) -> Result<ProgressSnapshot, IngestError> {
        let jobs = self.jobs.read().unwrap();
        jobs.get(&id)
            .map(|h| h.aggregator.snapshot())
            .ok_or(IngestError::JobNotFound(id))
    }

    /// Request an abort
    ///
    /// Propagates to all active workers in the current chunk and prevents
    /// remaining chunks from starting; scheduled retries are cancelled.
    pub fn abort(&self, id: JobId) -> Result<(), IngestError> {
        let jobs = self.jobs.read().unwrap();
        let handle = jobs.get(&id).ok_or(IngestError::JobNotFound(id))?;
        handle.cancel.cancel();
        Ok(())
    }

    /// Wait for a job to reach a terminal status
    pub async fn wait(&self, id: JobId) -> Result<JobStatus, IngestError> {
        let (mut done, aggregator) = {
            let jobs = self.jobs.read().unwrap();
            let handle = jobs.get(&id).ok_or(IngestError::JobNotFound(id))?;
            (handle.done.clone(), Arc::clone(&handle.aggregator))
        };

        while !*done.borrow_and_update() {
            done.changed().await.map_err(|_| IngestError::DriverLost)?;
        }

        Ok(aggregator.status())
    }
}

struct JobDriver<O, S> {
    extractor: Arc<Extractor<O>>,
    store: Arc<Mutex<S>>,
    aggregator: Arc<JobAggregator>,
    cancel: CancellationToken,
    tuning: RetryTuning,
    events: Option<mpsc::UnboundedSender<IngestEvent>>,
}

impl<O, S> JobDriver<O, S>
where
    O: OcrService<Error = OcrError> + Send + Sync + 'static,
    S: DocumentStore + Send + 'static,
    S::Error: std::fmt::Display,
{
    async fn run(self, mut job: ImportJob, files: Vec<FileUpload>) {
        let job_id = job.id;
        let policy = RetryPolicy {
            max_retries: job.config.max_retries,
            base_backoff: self.tuning.base_backoff,
            max_backoff: self.tuning.max_backoff,
            attempt_timeout: self
                .tuning
                .attempt_timeout_override
                .unwrap_or_else(|| job.config.per_file_timeout()),
        };

        let uploads: Vec<Arc<FileUpload>> = files.into_iter().map(Arc::new).collect();
        let total = job.tasks.len();
        let chunk_size = job.config.chunk_size;
        let chunk_count = job.chunk_count();
        let mut tasks: Vec<Option<FileTask>> = job.tasks.drain(..).map(Some).collect();

        let mut aborted = false;

        for chunk_index in 0..chunk_count {
            if self.cancel.is_cancelled() {
                aborted = true;
                break;
            }

            self.aggregator.set_chunk(chunk_index);
            self.emit(IngestEvent::ChunkStarted { job_id, index: chunk_index });
            info!(job = %job_id, chunk = chunk_index + 1, of = chunk_count, "chunk started");

            let start = chunk_index * chunk_size;
            let end = (start + chunk_size).min(total);

            // One worker per chunk member; pool size is the chunk cardinality
            let mut workers: JoinSet<(usize, FileTask, TaskOutcome, Duration)> = JoinSet::new();
            for idx in start..end {
                let mut task = match tasks[idx].take() {
                    Some(task) => task,
                    None => continue,
                };
                let upload = Arc::clone(&uploads[idx]);
                let extractor = Arc::clone(&self.extractor);
                let policy = policy.clone();
                let cancel = self.cancel.clone();
                let aggregator = Arc::clone(&self.aggregator);

                workers.spawn(async move {
                    aggregator.record_attempting(idx);
                    let started = Instant::now();
                    let outcome =
                        retry::drive_task(&mut task, &upload.bytes, &extractor, &policy, &cancel)
                            .await;
                    (idx, task, outcome, started.elapsed())
                });
            }

            while let Some(joined) = workers.join_next().await {
                let (idx, task, outcome, duration) = match joined {
                    Ok(result) => result,
                    Err(e) => {
                        error!(job = %job_id, error = %e, "worker task aborted");
                        continue;
                    }
                };
                let task = self.finish_task(job_id, idx, task, outcome, duration);
                tasks[idx] = Some(task);
            }

            self.emit(IngestEvent::ChunkFinished { job_id, index: chunk_index });
            info!(job = %job_id, chunk = chunk_index + 1, "chunk finished");

            if self.cancel.is_cancelled() {
                aborted = true;
                break;
            }
            if !job.config.skip_on_failure && self.aggregator.failed_count() > 0 {
                warn!(
                    job = %job_id,
                    chunk = chunk_index + 1,
                    "file exhausted retries with skip_on_failure disabled, aborting job"
                );
                aborted = true;
                break;
            }
        }

        if aborted {
            for (idx, slot) in tasks.iter_mut().enumerate() {
                if let Some(task) = slot {
                    if task.state == TaskState::Pending {
                        let _ = task.advance(TaskState::Skipped);
                        self.aggregator.record_skipped(idx);
                    }
                }
            }
            self.aggregator.set_status(JobStatus::Aborted);
        } else if self.aggregator.failed_count() > 0 {
            self.aggregator.set_status(JobStatus::CompletedWithErrors);
        } else {
            self.aggregator.set_status(JobStatus::Completed);
        }

        let status = self.aggregator.status();
        self.emit(IngestEvent::JobFinished { job_id, status });

        let snapshot = self.aggregator.snapshot();
        info!(
            job = %job_id,
            status = status.as_str(),
            succeeded = snapshot.succeeded,
            failed = snapshot.failed,
            skipped = snapshot.skipped,
            "job finished"
        );
    }

    /// Record a terminal task outcome, persisting the extraction on success
    fn finish_task(
        &self,
        job_id: JobId,
        idx: usize,
        mut task: FileTask,
        outcome: TaskOutcome,
        duration: Duration,
    ) -> FileTask {
        match outcome {
            TaskOutcome::Succeeded(extraction) => {
                let record = ExtractedRecord {
                    id: RecordId::new(),
                    source_task: task.id,
                    text: extraction.text,
                    page_confidences: extraction.page_confidences,
                    extracted_at: unix_now(),
                    category: extraction.category_hint.unwrap_or(task.category),
                    year: task.year,
                };

                let put_result = {
                    let mut store = self.store.lock().unwrap();
                    store.put(record)
                };

                match put_result {
                    Ok(record_id) => {
                        task.extracted_record_id = Some(record_id);
                        self.aggregator.record_success(idx, task.retry_count);
                        self.emit(IngestEvent::FileFinished {
                            job_id,
                            task_id: task.id,
                            success: true,
                            duration,
                            error_kind: None,
                        });
                    }
                    Err(e) => {
                        let message = format!("store error: {}", e);
                        error!(job = %job_id, filename = %task.filename, error = %message, "persist failed");
                        task.last_error = Some(message.clone());
                        self.aggregator.record_failure(idx, task.retry_count, message);
                        self.emit(IngestEvent::FileFinished {
                            job_id,
                            task_id: task.id,
                            success: false,
                            duration,
                            error_kind: None,
                        });
                    }
                }
            }
            TaskOutcome::Failed { kind, message } => {
                self.aggregator.record_failure(idx, task.retry_count, message);
                self.emit(IngestEvent::FileFinished {
                    job_id,
                    task_id: task.id,
                    success: false,
                    duration,
                    error_kind: Some(kind),
                });
            }
            TaskOutcome::Cancelled => {
                if task.state == TaskState::Skipped {
                    self.aggregator.record_skipped(idx);
                } else {
                    self.aggregator
                        .record_failure(idx, task.retry_count, "job aborted".to_string());
                }
            }
        }

        task
    }

    fn emit(&self, event: IngestEvent) {
        if let Some(sink) = &self.events {
            let _ = sink.send(event);
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
