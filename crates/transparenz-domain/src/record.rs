//! Extracted records
//!
//! A record is the immutable unit of evidence in the document store. Once
//! persisted it is never mutated; re-ingesting a file creates a new record.

use crate::{Category, RecordId, TaskId};

/// Extracted text and metadata for one successfully processed file
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ExtractedRecord {
    /// Unique identifier
    pub id: RecordId,

    /// The file task this record was extracted from
    pub source_task: TaskId,

    /// Full extracted text
    pub text: String,

    /// Per-page OCR confidence in [0, 1]; empty for native extraction
    pub page_confidences: Vec<f64>,

    /// Extraction timestamp (seconds since Unix epoch)
    pub extracted_at: u64,

    /// Document category
    pub category: Category,

    /// Document year, if known
    pub year: Option<u16>,
}

impl ExtractedRecord {
    /// Mean OCR confidence across pages
    ///
    /// Natively extracted text has no OCR pages and counts as fully
    /// confident.
    pub fn mean_confidence(&self) -> f64 {
        if self.page_confidences.is_empty() {
            return 1.0;
        }
        self.page_confidences.iter().sum::<f64>() / self.page_confidences.len() as f64
    }

    /// Whether the record came through the OCR path
    pub fn is_ocr(&self) -> bool {
        !self.page_confidences.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(confidences: Vec<f64>) -> ExtractedRecord {
        ExtractedRecord {
            id: RecordId::new(),
            source_task: TaskId::new(),
            text: "Straßensanierung 25000 Euro".to_string(),
            page_confidences: confidences,
            extracted_at: 1000,
            category: Category::Finanzen,
            year: Some(2023),
        }
    }

    #[test]
    fn test_native_record_is_fully_confident() {
        let r = record(vec![]);
        assert!(!r.is_ocr());
        assert_eq!(r.mean_confidence(), 1.0);
    }

    #[test]
    fn test_mean_confidence() {
        let r = record(vec![0.8, 0.9, 1.0]);
        assert!(r.is_ocr());
        assert!((r.mean_confidence() - 0.9).abs() < 1e-9);
    }
}
