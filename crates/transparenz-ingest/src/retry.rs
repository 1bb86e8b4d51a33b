//! Retry controller for single-file extraction
//!
//! Drives one file task through Pending -> Attempting -> {Succeeded |
//! RetryScheduled | Failed}. Transient errors back off exponentially;
//! permanent errors fail immediately; the per-attempt timeout cancels the
//! in-flight extraction and counts as transient.

use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use transparenz_domain::traits::OcrService;
use transparenz_domain::{ExtractErrorKind, FileTask, TaskState};
use transparenz_extract::{Extraction, Extractor};
use transparenz_ocr::OcrError;

/// Retry and timeout policy for one job
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum retries for transient failures
    pub max_retries: u32,
    /// First backoff delay
    pub base_backoff: Duration,
    /// Backoff cap
    pub max_backoff: Duration,
    /// Hard deadline per extraction attempt
    pub attempt_timeout: Duration,
}

impl RetryPolicy {
    /// Backoff before retry number `retry_count + 1`
    ///
    /// `min(base * 2^retry_count, cap)`, saturating rather than wrapping
    /// for large retry counts.
    pub fn backoff_for(&self, retry_count: u32) -> Duration {
        let factor = 1u32.checked_shl(retry_count).unwrap_or(u32::MAX);
        let delay = self.base_backoff.saturating_mul(factor);
        delay.min(self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
            attempt_timeout: Duration::from_secs(120),
        }
    }
}

/// Terminal outcome of driving one task
#[derive(Debug)]
pub enum TaskOutcome {
    /// Extraction succeeded
    Succeeded(Extraction),
    /// The task failed permanently or exhausted its retries
    Failed {
        /// Classification of the final error
        kind: ExtractErrorKind,
        /// Final error message, verbatim
        message: String,
    },
    /// The job was aborted while this task was in flight or waiting to retry
    Cancelled,
}

/// Drive one file task to a terminal state
///
/// The task's state machine and retry counter are updated in place; the
/// caller records the outcome with the job aggregator. Cancellation wins
/// over both in-flight attempts and scheduled retries.
pub async fn drive_task<O>(
    task: &mut FileTask,
    bytes: &[u8],
    extractor: &Extractor<O>,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
) -> TaskOutcome
where
    O: OcrService<Error = OcrError> + Send + Sync,
{
    loop {
        if task.advance(TaskState::Attempting).is_err() {
            // Terminal already; nothing left to drive
            return TaskOutcome::Failed {
                kind: ExtractErrorKind::Corrupt,
                message: "task not in a runnable state".to_string(),
            };
        }

        let attempt = tokio::select! {
            _ = cancel.cancelled() => None,
            result = tokio::time::timeout(
                policy.attempt_timeout,
                extractor.extract(&task.filename, bytes),
            ) => Some(result),
        };

        let Some(attempt) = attempt else {
            let _ = task.advance(TaskState::Failed);
            task.last_error = Some("job aborted".to_string());
            return TaskOutcome::Cancelled;
        };

        let (kind, message) = match attempt {
            Ok(Ok(extraction)) => {
                task.advance(TaskState::Succeeded)
                    .expect("Attempting -> Succeeded is always legal");
                return TaskOutcome::Succeeded(extraction);
            }
            Ok(Err(e)) => (e.kind(), e.to_string()),
            Err(_) => (
                ExtractErrorKind::Timeout,
                format!("attempt timed out after {:?}", policy.attempt_timeout),
            ),
        };

        task.last_error = Some(message.clone());

        if kind.is_transient() && task.retry_count < policy.max_retries {
            let delay = policy.backoff_for(task.retry_count);
            task.retry_count += 1;
            task.advance(TaskState::RetryScheduled)
                .expect("Attempting -> RetryScheduled is always legal");

            debug!(
                filename = %task.filename,
                retry = task.retry_count,
                ?delay,
                error = %message,
                "transient failure, retry scheduled"
            );

            tokio::select! {
                _ = cancel.cancelled() => {
                    // Scheduled retries are cancelled rather than fired
                    let _ = task.advance(TaskState::Skipped);
                    return TaskOutcome::Cancelled;
                }
                _ = tokio::time::sleep(delay) => {}
            }
        } else {
            task.advance(TaskState::Failed)
                .expect("Attempting -> Failed is always legal");

            warn!(
                filename = %task.filename,
                retries = task.retry_count,
                kind = kind.as_str(),
                error = %message,
                "task failed"
            );

            return TaskOutcome::Failed { kind, message };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use transparenz_extract::ExtractorConfig;
    use transparenz_ocr::MockOcr;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 3,
            base_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(8),
            attempt_timeout: Duration::from_millis(50),
        }
    }

    fn extractor(ocr: MockOcr) -> Extractor<MockOcr> {
        Extractor::new(ocr, ExtractorConfig::default())
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            base_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
            ..Default::default()
        };

        assert_eq!(policy.backoff_for(0), Duration::from_millis(500));
        assert_eq!(policy.backoff_for(1), Duration::from_millis(1000));
        assert_eq!(policy.backoff_for(2), Duration::from_millis(2000));
        assert_eq!(policy.backoff_for(10), Duration::from_secs(30));
        assert_eq!(policy.backoff_for(63), Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let ocr = MockOcr::new("Protokoll", 0.9);
        let ex = extractor(ocr);
        let mut task = FileTask::new("scan.png", 3);

        let outcome = drive_task(&mut task, b"img", &ex, &fast_policy(), &CancellationToken::new()).await;

        assert!(matches!(outcome, TaskOutcome::Succeeded(_)));
        assert_eq!(task.state, TaskState::Succeeded);
        assert_eq!(task.retry_count, 0);
    }

    #[tokio::test]
    async fn test_transient_errors_retried_until_success() {
        let ocr = MockOcr::new("Protokoll", 0.9);
        ocr.push_error(OcrError::Unavailable("down".into()));
        ocr.push_error(OcrError::Unavailable("still down".into()));
        let ex = extractor(ocr.clone());
        let mut task = FileTask::new("scan.png", 3);

        let outcome = drive_task(&mut task, b"img", &ex, &fast_policy(), &CancellationToken::new()).await;

        assert!(matches!(outcome, TaskOutcome::Succeeded(_)));
        assert_eq!(task.retry_count, 2);
        assert_eq!(ocr.call_count(), 3);
    }

    #[tokio::test]
    async fn test_retries_exhausted_reports_last_error() {
        let ocr = MockOcr::new("unused", 0.9);
        for i in 0..10 {
            ocr.push_error(OcrError::Unavailable(format!("outage {}", i)));
        }
        let ex = extractor(ocr.clone());
        let mut task = FileTask::new("scan.png", 3);
        let policy = fast_policy();

        let outcome = drive_task(&mut task, b"img", &ex, &policy, &CancellationToken::new()).await;

        match outcome {
            TaskOutcome::Failed { kind, message } => {
                assert_eq!(kind, ExtractErrorKind::OcrUnavailable);
                // The last error is reported verbatim: initial attempt plus
                // max_retries retries means the final outage index is 3
                assert!(message.contains("outage 3"), "got: {}", message);
            }
            other => panic!("expected Failed, got {:?}", other),
        }

        assert_eq!(task.retry_count, policy.max_retries);
        assert_eq!(ocr.call_count(), 1 + policy.max_retries as usize);
        assert_eq!(task.state, TaskState::Failed);
    }

    #[tokio::test]
    async fn test_permanent_error_never_retried() {
        let ocr = MockOcr::new("unused", 0.9);
        let ex = extractor(ocr.clone());
        // Unsupported extension is a permanent error
        let mut task = FileTask::new("archive.zip", 3);

        let outcome = drive_task(&mut task, b"PK", &ex, &fast_policy(), &CancellationToken::new()).await;

        match outcome {
            TaskOutcome::Failed { kind, .. } => {
                assert_eq!(kind, ExtractErrorKind::UnsupportedFormat)
            }
            other => panic!("expected Failed, got {:?}", other),
        }
        assert_eq!(task.retry_count, 0);
        assert_eq!(ocr.call_count(), 0);
    }

    #[tokio::test]
    async fn test_timeout_is_transient_and_bounded() {
        let ocr = MockOcr::new("langsam", 0.9).with_delay(Duration::from_millis(200));
        let ex = extractor(ocr.clone());
        let mut task = FileTask::new("scan.png", 3);
        let policy = fast_policy();

        let started = std::time::Instant::now();
        let outcome = drive_task(&mut task, b"img", &ex, &policy, &CancellationToken::new()).await;
        let elapsed = started.elapsed();

        match outcome {
            TaskOutcome::Failed { kind, .. } => assert_eq!(kind, ExtractErrorKind::Timeout),
            other => panic!("expected Failed, got {:?}", other),
        }
        assert_eq!(task.retry_count, policy.max_retries);

        // Bounded by (max_retries + 1) attempts plus backoff; generous margin
        let bound = (policy.attempt_timeout + policy.max_backoff) * (policy.max_retries + 1);
        assert!(elapsed < bound + Duration::from_millis(500), "elapsed {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_cancellation_during_attempt() {
        let ocr = MockOcr::new("langsam", 0.9).with_delay(Duration::from_secs(10));
        let ex = extractor(ocr);
        let mut task = FileTask::new("scan.png", 3);
        let cancel = CancellationToken::new();

        let cancel_clone = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            cancel_clone.cancel();
        });

        let policy = RetryPolicy {
            attempt_timeout: Duration::from_secs(30),
            ..fast_policy()
        };
        let outcome = drive_task(&mut task, b"img", &ex, &policy, &cancel).await;

        assert!(matches!(outcome, TaskOutcome::Cancelled));
        assert!(task.state.is_terminal());
    }

    #[tokio::test]
    async fn test_cancellation_cancels_scheduled_retry() {
        let ocr = MockOcr::new("unused", 0.9);
        for _ in 0..10 {
            ocr.push_error(OcrError::Unavailable("down".into()));
        }
        let ex = extractor(ocr.clone());
        let mut task = FileTask::new("scan.png", 3);
        let cancel = CancellationToken::new();

        let policy = RetryPolicy {
            max_retries: 3,
            base_backoff: Duration::from_secs(60),
            max_backoff: Duration::from_secs(60),
            attempt_timeout: Duration::from_millis(100),
        };

        let cancel_clone = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            cancel_clone.cancel();
        });

        let outcome = drive_task(&mut task, b"img", &ex, &policy, &cancel).await;

        // The first attempt fails, a retry is scheduled with a long backoff,
        // and the abort cancels it rather than letting it fire
        assert!(matches!(outcome, TaskOutcome::Cancelled));
        assert_eq!(task.state, TaskState::Skipped);
        assert_eq!(ocr.call_count(), 1);
    }
}
