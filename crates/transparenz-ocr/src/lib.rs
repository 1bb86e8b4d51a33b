//! Transparenz OCR Layer
//!
//! Pluggable implementations of the `OcrService` trait from
//! `transparenz-domain`. OCR is the ingestion pipeline's only blocking
//! external dependency; everything here is called under the retry
//! controller's per-attempt deadline and is cancelled by dropping the
//! in-flight future.
//!
//! # Providers
//!
//! - `MockOcr`: deterministic mock for testing
//! - `HttpOcr`: client for an external OCR HTTP service
//!
//! # Examples
//!
//! ```
//! use transparenz_ocr::MockOcr;
//! use transparenz_domain::traits::OcrService;
//!
//! # tokio_test::block_on(async {
//! let ocr = MockOcr::new("Protokoll der Sitzung", 0.93);
//! let page = ocr.recognize(b"image-bytes", "deu+eng").await.unwrap();
//! assert_eq!(page.text, "Protokoll der Sitzung");
//! # });
//! ```

#![warn(missing_docs)]

pub mod http;

pub use http::HttpOcr;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use transparenz_domain::traits::{OcrPage, OcrService};

/// Default OCR language hint (German with English fallback)
pub const DEFAULT_LANGUAGE: &str = "deu+eng";

/// Errors that can occur during OCR operations
#[derive(Error, Debug, Clone)]
pub enum OcrError {
    /// The service could not be reached
    #[error("OCR service unavailable: {0}")]
    Unavailable(String),

    /// The service answered with something unparseable
    #[error("Invalid OCR response: {0}")]
    InvalidResponse(String),

    /// The service rejected the image
    #[error("Image rejected: {0}")]
    ImageRejected(String),

    /// Generic error
    #[error("OCR error: {0}")]
    Other(String),
}

/// Mock OCR service for deterministic testing
///
/// Returns pre-configured pages without any network calls. Queued
/// responses are consumed first; once the queue is empty every call yields
/// the default page. An optional artificial delay makes timeout paths
/// testable.
///
/// # Examples
///
/// ```
/// use transparenz_ocr::{MockOcr, OcrError};
/// use transparenz_domain::traits::OcrService;
///
/// # tokio_test::block_on(async {
/// let ocr = MockOcr::new("default text", 0.9);
/// ocr.push_error(OcrError::Unavailable("down".into()));
///
/// // First call fails, second falls back to the default page
/// assert!(ocr.recognize(b"img", "deu+eng").await.is_err());
/// assert!(ocr.recognize(b"img", "deu+eng").await.is_ok());
/// assert_eq!(ocr.call_count(), 2);
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct MockOcr {
    default_page: OcrPage,
    responses: Arc<Mutex<VecDeque<Result<OcrPage, OcrError>>>>,
    call_count: Arc<Mutex<usize>>,
    delay: Option<Duration>,
}

impl MockOcr {
    /// Create a mock returning a fixed page for every call
    pub fn new(text: impl Into<String>, confidence: f64) -> Self {
        Self {
            default_page: OcrPage {
                text: text.into(),
                confidence,
            },
            responses: Arc::new(Mutex::new(VecDeque::new())),
            call_count: Arc::new(Mutex::new(0)),
            delay: None,
        }
    }

    /// Add an artificial per-call delay (for exercising deadlines)
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue a successful page for the next call
    pub fn push_page(&self, text: impl Into<String>, confidence: f64) {
        self.responses.lock().unwrap().push_back(Ok(OcrPage {
            text: text.into(),
            confidence,
        }));
    }

    /// Queue an error for the next call
    pub fn push_error(&self, error: OcrError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Number of recognize calls made so far
    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    /// Reset the call counter
    pub fn reset_call_count(&self) {
        *self.call_count.lock().unwrap() = 0;
    }
}

impl OcrService for MockOcr {
    type Error = OcrError;

    async fn recognize(&self, _image: &[u8], _language: &str) -> Result<OcrPage, OcrError> {
        *self.call_count.lock().unwrap() += 1;

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let queued = self.responses.lock().unwrap().pop_front();
        match queued {
            Some(result) => result,
            None => Ok(self.default_page.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_default_page() {
        let ocr = MockOcr::new("Hallo Welt", 0.88);
        let page = ocr.recognize(b"bytes", DEFAULT_LANGUAGE).await.unwrap();

        assert_eq!(page.text, "Hallo Welt");
        assert_eq!(page.confidence, 0.88);
    }

    #[tokio::test]
    async fn test_mock_queued_responses_consumed_in_order() {
        let ocr = MockOcr::new("default", 0.5);
        ocr.push_page("erste Seite", 0.9);
        ocr.push_page("zweite Seite", 0.8);

        assert_eq!(ocr.recognize(b"a", "deu").await.unwrap().text, "erste Seite");
        assert_eq!(ocr.recognize(b"b", "deu").await.unwrap().text, "zweite Seite");
        assert_eq!(ocr.recognize(b"c", "deu").await.unwrap().text, "default");
    }

    #[tokio::test]
    async fn test_mock_error_injection() {
        let ocr = MockOcr::new("default", 0.5);
        ocr.push_error(OcrError::Unavailable("connection refused".into()));

        let result = ocr.recognize(b"img", "deu").await;
        assert!(matches!(result, Err(OcrError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_mock_call_count_shared_across_clones() {
        let ocr = MockOcr::new("t", 1.0);
        let clone = ocr.clone();

        ocr.recognize(b"img", "deu").await.unwrap();
        clone.recognize(b"img", "deu").await.unwrap();

        assert_eq!(ocr.call_count(), 2);
        assert_eq!(clone.call_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_delay_respects_deadline() {
        let ocr = MockOcr::new("langsam", 0.9).with_delay(Duration::from_millis(200));

        let result =
            tokio::time::timeout(Duration::from_millis(20), ocr.recognize(b"img", "deu")).await;

        assert!(result.is_err(), "deadline should elapse before the mock answers");
    }
}
