//! Extraction error taxonomy
//!
//! Error classification drives the retry controller: transient kinds are
//! retried with backoff, permanent kinds fail the task immediately. The
//! classification is a value, not exception control flow.

/// Classified cause of a failed extraction attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractErrorKind {
    /// The per-attempt deadline elapsed before extraction finished
    Timeout,
    /// The OCR service could not be reached
    OcrUnavailable,
    /// A transient I/O failure (read error, interrupted stream)
    TransientIo,
    /// The file content is corrupt or unparseable
    Corrupt,
    /// The file extension is not in the supported set
    UnsupportedFormat,
    /// The file exceeds the configured maximum size
    Oversize,
}

impl ExtractErrorKind {
    /// Whether an attempt with this error may be retried
    ///
    /// Permanent kinds (corrupt, unsupported, oversize) fail the task
    /// regardless of remaining retry budget.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ExtractErrorKind::Timeout
                | ExtractErrorKind::OcrUnavailable
                | ExtractErrorKind::TransientIo
        )
    }

    /// Get the kind name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractErrorKind::Timeout => "timeout",
            ExtractErrorKind::OcrUnavailable => "ocr_unavailable",
            ExtractErrorKind::TransientIo => "transient_io",
            ExtractErrorKind::Corrupt => "corrupt",
            ExtractErrorKind::UnsupportedFormat => "unsupported_format",
            ExtractErrorKind::Oversize => "oversize",
        }
    }
}
