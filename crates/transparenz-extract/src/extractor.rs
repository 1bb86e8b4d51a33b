//! Extractor adapter: format dispatch with OCR fallback

use crate::config::ExtractorConfig;
use crate::error::ExtractError;
use crate::formats;
use std::sync::Arc;
use tracing::{debug, info, warn};
use transparenz_domain::traits::OcrService;
use transparenz_domain::{Category, DocumentFormat};
use transparenz_ocr::OcrError;

/// Result of a successful extraction
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Full extracted text
    pub text: String,

    /// Per-page OCR confidence in [0, 1]; empty when no page needed OCR
    pub page_confidences: Vec<f64>,

    /// Category suggested by the text content, if any keyword matched
    pub category_hint: Option<Category>,
}

/// The extractor adapter converts one file into text plus metadata
///
/// Structured-text formats parse directly; PDF and office formats attempt
/// native extraction first and fall back to OCR page by page when the
/// native text layer is near-empty; images always go to OCR. The OCR call
/// is the only blocking external dependency and is always issued under the
/// caller's attempt deadline.
pub struct Extractor<O> {
    ocr: Arc<O>,
    config: ExtractorConfig,
}

impl<O> Extractor<O>
where
    O: OcrService<Error = OcrError> + Send + Sync,
{
    /// Create a new extractor over an OCR service
    pub fn new(ocr: O, config: ExtractorConfig) -> Self {
        Self {
            ocr: Arc::new(ocr),
            config,
        }
    }

    /// Extract text from one file
    ///
    /// Returns a classified error; the retry controller decides from the
    /// error kind whether another attempt makes sense.
    pub async fn extract(&self, filename: &str, bytes: &[u8]) -> Result<Extraction, ExtractError> {
        if bytes.len() as u64 > self.config.max_file_size_bytes {
            return Err(ExtractError::Oversize {
                size: bytes.len() as u64,
                max: self.config.max_file_size_bytes,
            });
        }

        let format = DocumentFormat::detect(filename)
            .ok_or_else(|| ExtractError::Unsupported(filename.to_string()))?;

        debug!(filename, format = format.as_str(), size = bytes.len(), "extracting file");

        let (text, page_confidences) = match format {
            DocumentFormat::Csv => (formats::parse_csv(bytes)?, Vec::new()),
            DocumentFormat::Json => (formats::parse_json(bytes)?, Vec::new()),
            DocumentFormat::PlainText => (formats::parse_text(bytes), Vec::new()),
            DocumentFormat::Word => {
                self.native_with_ocr_fallback(formats::parse_docx(bytes)?, bytes).await?
            }
            DocumentFormat::Spreadsheet => {
                self.native_with_ocr_fallback(formats::parse_xlsx(bytes)?, bytes).await?
            }
            DocumentFormat::Pdf => self.extract_pdf(bytes).await?,
            DocumentFormat::Image => {
                let page = self.recognize(bytes).await?;
                (page.0, vec![page.1])
            }
        };

        if text.trim().is_empty() {
            return Err(ExtractError::Corrupt {
                format: format.as_str(),
                detail: "no extractable text".to_string(),
            });
        }

        let category_hint = category_hint(&text);

        info!(
            filename,
            chars = text.len(),
            ocr_pages = page_confidences.len(),
            "extraction complete"
        );

        Ok(Extraction {
            text,
            page_confidences,
            category_hint,
        })
    }

    /// Keep native office text when it is substantial, otherwise OCR the
    /// whole document as a single page
    async fn native_with_ocr_fallback(
        &self,
        native: String,
        bytes: &[u8],
    ) -> Result<(String, Vec<f64>), ExtractError> {
        if native.trim().len() >= self.config.min_chars_per_page {
            return Ok((native, Vec::new()));
        }

        debug!(native_chars = native.trim().len(), "native text near-empty, falling back to OCR");
        let (text, confidence) = self.recognize(bytes).await?;
        Ok((text, vec![confidence]))
    }

    /// Extract a PDF page by page
    ///
    /// Pages with a usable native text layer are taken as-is; the rest go
    /// through OCR individually, so one scanned appendix does not force a
    /// whole report through OCR.
    async fn extract_pdf(&self, bytes: &[u8]) -> Result<(String, Vec<f64>), ExtractError> {
        let doc = lopdf::Document::load_mem(bytes).map_err(|e| ExtractError::Corrupt {
            format: "pdf",
            detail: e.to_string(),
        })?;

        let pages = doc.get_pages();
        if pages.is_empty() {
            return Err(ExtractError::Corrupt {
                format: "pdf",
                detail: "document has no pages".to_string(),
            });
        }

        let mut text = String::new();
        let mut confidences = Vec::new();

        for (page_no, page_id) in pages {
            let native = doc.extract_text(&[page_no]).unwrap_or_default();

            if native.trim().len() >= self.config.min_chars_per_page {
                text.push_str(native.trim());
                text.push('\n');
                continue;
            }

            let content = doc.get_page_content(page_id).map_err(|e| ExtractError::Corrupt {
                format: "pdf",
                detail: format!("page {}: {}", page_no, e),
            })?;

            match self.recognize(&content).await {
                Ok((page_text, confidence)) => {
                    text.push_str(page_text.trim());
                    text.push('\n');
                    confidences.push(confidence);
                }
                Err(e @ ExtractError::OcrRejected(_)) => {
                    // An unreadable page is not fatal for the document
                    warn!(page = page_no, error = %e, "skipping unreadable page");
                }
                Err(e) => return Err(e),
            }
        }

        Ok((text, confidences))
    }

    async fn recognize(&self, bytes: &[u8]) -> Result<(String, f64), ExtractError> {
        let page = self.ocr.recognize(bytes, &self.config.ocr_language).await?;
        Ok((page.text, page.confidence))
    }
}

/// Suggest a category from text content keywords
fn category_hint(text: &str) -> Option<Category> {
    // Only the first part of the text carries the letterhead and title,
    // which is where category keywords are reliable
    let head: String = text.chars().take(500).collect();
    match Category::from_filename(&head) {
        Category::Dokumente => None,
        other => Some(other),
    }
}
