//! File task state machine
//!
//! Each uploaded file becomes one `FileTask`. Tasks only ever move forward
//! through their state machine; a terminal state is never left.

use crate::{Category, DocumentFormat, RecordId, TaskId};

/// State of a single file task
///
/// ```text
/// Pending -> Attempting -> Succeeded
///                |    ^
///                v    |
///          RetrySched-+
///                |
///                v
///             Failed        Pending -> Skipped (job aborted before start)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Queued, no attempt started yet
    Pending,
    /// An extraction attempt is in flight
    Attempting,
    /// A transient failure occurred and a retry is scheduled
    RetryScheduled,
    /// Extraction succeeded and a record was persisted
    Succeeded,
    /// Extraction failed permanently or exhausted its retries
    Failed,
    /// The task never ran because the job was aborted first
    Skipped,
}

impl TaskState {
    /// Whether this state is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Succeeded | TaskState::Failed | TaskState::Skipped)
    }

    /// Whether `next` is a legal forward transition from this state
    pub fn can_transition(&self, next: TaskState) -> bool {
        use TaskState::*;
        match (self, next) {
            (Pending, Attempting) | (Pending, Skipped) => true,
            (Attempting, Succeeded) | (Attempting, RetryScheduled) | (Attempting, Failed) => true,
            (RetryScheduled, Attempting) | (RetryScheduled, Failed) | (RetryScheduled, Skipped) => true,
            _ => false,
        }
    }

    /// Get the state name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Pending => "pending",
            TaskState::Attempting => "attempting",
            TaskState::RetryScheduled => "retry_scheduled",
            TaskState::Succeeded => "succeeded",
            TaskState::Failed => "failed",
            TaskState::Skipped => "skipped",
        }
    }
}

/// One file within an import job
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FileTask {
    /// Unique identifier
    pub id: TaskId,

    /// Original filename of the upload
    pub filename: String,

    /// Size of the upload in bytes
    pub byte_size: u64,

    /// Detected format, if the extension is supported
    pub format: Option<DocumentFormat>,

    /// Current state
    pub state: TaskState,

    /// Number of retries consumed so far
    pub retry_count: u32,

    /// Last error message, verbatim
    pub last_error: Option<String>,

    /// Record produced on success
    pub extracted_record_id: Option<RecordId>,

    /// Category derived from the filename
    pub category: Category,

    /// Year derived from the filename, if present
    pub year: Option<u16>,
}

impl FileTask {
    /// Create a pending task for an uploaded file
    pub fn new(filename: impl Into<String>, byte_size: u64) -> Self {
        let filename = filename.into();
        let format = DocumentFormat::detect(&filename);
        let category = Category::from_filename(&filename);
        let year = crate::category::year_from_filename(&filename);

        Self {
            id: TaskId::new(),
            filename,
            byte_size,
            format,
            state: TaskState::Pending,
            retry_count: 0,
            last_error: None,
            extracted_record_id: None,
            category,
            year,
        }
    }

    /// Advance the state machine
    ///
    /// Rejects backward or otherwise illegal transitions, which keeps the
    /// forward-only invariant enforced in one place.
    pub fn advance(&mut self, next: TaskState) -> Result<(), String> {
        if !self.state.can_transition(next) {
            return Err(format!(
                "illegal task transition {} -> {}",
                self.state.as_str(),
                next.as_str()
            ));
        }
        self.state = next;
        Ok(())
    }
}
