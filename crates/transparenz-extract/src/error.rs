//! Error types for the extractor

use thiserror::Error;
use transparenz_domain::ExtractErrorKind;
use transparenz_ocr::OcrError;

/// Errors that can occur during extraction
///
/// Every variant maps onto a single `ExtractErrorKind`, which is what the
/// retry controller branches on.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// The file extension is not supported
    #[error("Unsupported format: {0}")]
    Unsupported(String),

    /// The file exceeds the configured size limit
    #[error("File too large: {size} bytes (max: {max})")]
    Oversize {
        /// Actual file size in bytes
        size: u64,
        /// Configured maximum in bytes
        max: u64,
    },

    /// The file content could not be parsed as its detected format
    #[error("Corrupt {format} file: {detail}")]
    Corrupt {
        /// Format the file was detected as
        format: &'static str,
        /// Parser detail
        detail: String,
    },

    /// The OCR service could not be reached
    #[error("OCR service unavailable: {0}")]
    OcrUnavailable(String),

    /// The OCR service rejected the image as unprocessable
    #[error("OCR rejected image: {0}")]
    OcrRejected(String),

    /// A transient I/O failure while reading the input
    #[error("I/O error: {0}")]
    Io(String),
}

impl ExtractError {
    /// Classify this error for the retry controller
    pub fn kind(&self) -> ExtractErrorKind {
        match self {
            ExtractError::Unsupported(_) => ExtractErrorKind::UnsupportedFormat,
            ExtractError::Oversize { .. } => ExtractErrorKind::Oversize,
            ExtractError::Corrupt { .. } => ExtractErrorKind::Corrupt,
            ExtractError::OcrUnavailable(_) => ExtractErrorKind::OcrUnavailable,
            ExtractError::OcrRejected(_) => ExtractErrorKind::Corrupt,
            ExtractError::Io(_) => ExtractErrorKind::TransientIo,
        }
    }
}

impl From<OcrError> for ExtractError {
    fn from(e: OcrError) -> Self {
        match e {
            OcrError::ImageRejected(detail) => ExtractError::OcrRejected(detail),
            other => ExtractError::OcrUnavailable(other.to_string()),
        }
    }
}
