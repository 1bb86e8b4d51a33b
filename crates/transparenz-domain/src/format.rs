//! Document format detection

use std::path::Path;

/// Detected format of an uploaded file
///
/// Structured-text formats parse directly; PDF and office formats attempt
/// native extraction first with OCR as fallback; images always go to OCR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    /// PDF document (native text layer or scanned)
    Pdf,
    /// Raster image (jpg, png, tiff, bmp)
    Image,
    /// Word processing document (docx)
    Word,
    /// Spreadsheet (xlsx, xls)
    Spreadsheet,
    /// Comma-separated values
    Csv,
    /// JSON data
    Json,
    /// Plain text
    PlainText,
}

impl DocumentFormat {
    /// Detect the format from a filename extension
    ///
    /// Returns `None` for unsupported extensions; the caller treats that as
    /// a permanent extraction error.
    pub fn detect(filename: &str) -> Option<Self> {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())?
            .to_ascii_lowercase();

        match ext.as_str() {
            "pdf" => Some(DocumentFormat::Pdf),
            "jpg" | "jpeg" | "png" | "tiff" | "bmp" => Some(DocumentFormat::Image),
            "docx" => Some(DocumentFormat::Word),
            "xlsx" | "xls" => Some(DocumentFormat::Spreadsheet),
            "csv" => Some(DocumentFormat::Csv),
            "json" => Some(DocumentFormat::Json),
            "txt" | "xml" => Some(DocumentFormat::PlainText),
            _ => None,
        }
    }

    /// Get the format name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Image => "image",
            DocumentFormat::Word => "word",
            DocumentFormat::Spreadsheet => "spreadsheet",
            DocumentFormat::Csv => "csv",
            DocumentFormat::Json => "json",
            DocumentFormat::PlainText => "text",
        }
    }

    /// Whether this format is sent straight to the OCR service
    pub fn always_ocr(&self) -> bool {
        matches!(self, DocumentFormat::Image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_common_formats() {
        assert_eq!(DocumentFormat::detect("protokoll_2023.pdf"), Some(DocumentFormat::Pdf));
        assert_eq!(DocumentFormat::detect("scan.JPG"), Some(DocumentFormat::Image));
        assert_eq!(DocumentFormat::detect("budget.xlsx"), Some(DocumentFormat::Spreadsheet));
        assert_eq!(DocumentFormat::detect("ausgaben.csv"), Some(DocumentFormat::Csv));
        assert_eq!(DocumentFormat::detect("daten.json"), Some(DocumentFormat::Json));
        assert_eq!(DocumentFormat::detect("notiz.txt"), Some(DocumentFormat::PlainText));
        assert_eq!(DocumentFormat::detect("bericht.docx"), Some(DocumentFormat::Word));
    }

    #[test]
    fn test_detect_unsupported() {
        assert_eq!(DocumentFormat::detect("archive.zip"), None);
        assert_eq!(DocumentFormat::detect("noextension"), None);
        assert_eq!(DocumentFormat::detect(""), None);
    }

    #[test]
    fn test_always_ocr() {
        assert!(DocumentFormat::Image.always_ocr());
        assert!(!DocumentFormat::Pdf.always_ocr());
        assert!(!DocumentFormat::Csv.always_ocr());
    }
}
