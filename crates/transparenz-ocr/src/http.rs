//! HTTP OCR service client
//!
//! Talks to an external OCR service over a small JSON API. The concrete
//! engine behind the endpoint (tesseract, a cloud API, ...) is not this
//! crate's concern.

use crate::OcrError;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use transparenz_domain::traits::{OcrPage, OcrService};

/// Default OCR service endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8884";

/// Default client-side timeout for OCR requests (60 seconds)
///
/// The retry controller applies the tighter per-attempt deadline on top of
/// this; the client timeout is a backstop for callers without one.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// HTTP client for an external OCR service
pub struct HttpOcr {
    endpoint: String,
    client: reqwest::Client,
}

/// Request body for the recognize API
#[derive(Serialize)]
struct RecognizeRequest {
    image: String,
    language: String,
}

/// Response from the recognize API
#[derive(Deserialize)]
struct RecognizeResponse {
    text: String,
    confidence: f64,
}

impl HttpOcr {
    /// Create a client for the given endpoint
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use transparenz_ocr::HttpOcr;
    ///
    /// let ocr = HttpOcr::new("http://localhost:8884");
    /// ```
    pub fn new(endpoint: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("reqwest client construction cannot fail with static configuration");

        Self {
            endpoint: endpoint.into(),
            client,
        }
    }

    /// Create a client against the default local endpoint
    pub fn default_endpoint() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }

    async fn recognize_inner(&self, image: &[u8], language: &str) -> Result<OcrPage, OcrError> {
        let url = format!("{}/recognize", self.endpoint);

        let request_body = RecognizeRequest {
            image: base64::engine::general_purpose::STANDARD.encode(image),
            language: language.to_string(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| OcrError::Unavailable(format!("Request failed: {}", e)))?;

        if response.status() == reqwest::StatusCode::UNPROCESSABLE_ENTITY {
            let detail = response.text().await.unwrap_or_else(|_| "unknown".to_string());
            return Err(OcrError::ImageRejected(detail));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_else(|_| "unknown".to_string());
            return Err(OcrError::Unavailable(format!("HTTP {}: {}", status, body)));
        }

        let parsed: RecognizeResponse = response
            .json()
            .await
            .map_err(|e| OcrError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        if !(0.0..=1.0).contains(&parsed.confidence) {
            return Err(OcrError::InvalidResponse(format!(
                "Confidence {} outside [0, 1]",
                parsed.confidence
            )));
        }

        Ok(OcrPage {
            text: parsed.text,
            confidence: parsed.confidence,
        })
    }
}

impl OcrService for HttpOcr {
    type Error = OcrError;

    async fn recognize(&self, image: &[u8], language: &str) -> Result<OcrPage, OcrError> {
        self.recognize_inner(image, language).await
    }
}
