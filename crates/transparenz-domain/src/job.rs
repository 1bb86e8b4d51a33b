//! Import jobs and their configuration

use crate::{FileTask, JobId};

/// Bounds for `JobConfig::chunk_size`
pub const CHUNK_SIZE_RANGE: (usize, usize) = (1, 5);
/// Bounds for `JobConfig::per_file_timeout_secs`
pub const TIMEOUT_RANGE_SECS: (u64, u64) = (30, 300);
/// Bounds for `JobConfig::max_retries`
pub const MAX_RETRIES_RANGE: (u32, u32) = (1, 5);

/// Per-job ingestion configuration
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct JobConfig {
    /// Files processed concurrently per chunk (1-5)
    pub chunk_size: usize,

    /// Hard deadline for a single extraction attempt, in seconds (30-300)
    pub per_file_timeout_secs: u64,

    /// Maximum retries per file for transient failures (1-5)
    pub max_retries: u32,

    /// Continue past files that exhaust their retries
    ///
    /// When false, the first exhausted file aborts the whole job and no
    /// further chunks are started.
    pub skip_on_failure: bool,
}

impl JobConfig {
    /// Validate the configuration against the documented bounds
    pub fn validate(&self) -> Result<(), String> {
        let (lo, hi) = CHUNK_SIZE_RANGE;
        if self.chunk_size < lo || self.chunk_size > hi {
            return Err(format!("chunk_size {} outside [{}, {}]", self.chunk_size, lo, hi));
        }
        let (lo, hi) = TIMEOUT_RANGE_SECS;
        if self.per_file_timeout_secs < lo || self.per_file_timeout_secs > hi {
            return Err(format!(
                "per_file_timeout_secs {} outside [{}, {}]",
                self.per_file_timeout_secs, lo, hi
            ));
        }
        let (lo, hi) = MAX_RETRIES_RANGE;
        if self.max_retries < lo || self.max_retries > hi {
            return Err(format!("max_retries {} outside [{}, {}]", self.max_retries, lo, hi));
        }
        Ok(())
    }

    /// Per-attempt timeout as a `Duration`
    pub fn per_file_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.per_file_timeout_secs)
    }
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            chunk_size: 3,
            per_file_timeout_secs: 120,
            max_retries: 3,
            skip_on_failure: true,
        }
    }
}

/// Terminal status of an import job
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Chunks are still being processed
    Running,
    /// All files succeeded
    Completed,
    /// The job finished but some files failed
    CompletedWithErrors,
    /// The job was aborted (user request or exhausted file with
    /// skip_on_failure disabled); remaining chunks never started
    Aborted,
}

impl JobStatus {
    /// Whether the job has reached a terminal status
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Running)
    }

    /// Get the status name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::CompletedWithErrors => "completed_with_errors",
            JobStatus::Aborted => "aborted",
        }
    }
}

/// A bulk import job: an ordered batch of file tasks plus configuration
#[derive(Debug, Clone)]
pub struct ImportJob {
    /// Unique identifier
    pub id: JobId,

    /// Ordered file tasks; chunking preserves this order
    pub tasks: Vec<FileTask>,

    /// Job configuration
    pub config: JobConfig,

    /// Creation timestamp (seconds since Unix epoch)
    pub created_at: u64,

    /// Current status
    pub status: JobStatus,
}

impl ImportJob {
    /// Create a new running job
    pub fn new(tasks: Vec<FileTask>, config: JobConfig, created_at: u64) -> Self {
        Self {
            id: JobId::new(),
            tasks,
            config,
            created_at,
            status: JobStatus::Running,
        }
    }

    /// Number of chunks the job will be split into
    pub fn chunk_count(&self) -> usize {
        self.tasks.len().div_ceil(self.config.chunk_size)
    }
}
