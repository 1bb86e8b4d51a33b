//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and
//! infrastructure. Implementations live in other crates: the document store
//! in `transparenz-store`, OCR clients in `transparenz-ocr`.

use crate::{ExtractedRecord, RecordId};
use std::future::Future;

/// Trait for persisting and querying extracted records
///
/// Records are immutable once put; there is deliberately no update or
/// delete operation.
pub trait DocumentStore {
    /// Error type for store operations
    type Error;

    /// Persist a record, returning its id
    fn put(&mut self, record: ExtractedRecord) -> Result<RecordId, Self::Error>;

    /// Get a record by id
    fn get(&self, id: RecordId) -> Result<Option<ExtractedRecord>, Self::Error>;

    /// Query records matching a filter
    fn query(&self, filter: &RecordFilter) -> Result<Vec<ExtractedRecord>, Self::Error>;
}

/// Filter criteria for record queries
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    /// Filter by category
    pub category: Option<crate::Category>,

    /// Filter by year
    pub year: Option<u16>,

    /// Case-insensitive substring match against the record text
    pub text_match: Option<String>,

    /// Maximum results to return
    pub limit: Option<usize>,
}

/// One page of OCR output
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OcrPage {
    /// Recognized text
    pub text: String,

    /// Recognition confidence in [0, 1]
    pub confidence: f64,
}

/// Trait for the external OCR service
///
/// The single blocking external dependency of the ingestion pipeline. The
/// caller always wraps `recognize` in its per-attempt deadline; dropping
/// the future cancels the request.
pub trait OcrService {
    /// Error type for OCR operations
    type Error;

    /// Recognize text in one image
    fn recognize(
        &self,
        image: &[u8],
        language: &str,
    ) -> impl Future<Output = Result<OcrPage, Self::Error>> + Send;
}
