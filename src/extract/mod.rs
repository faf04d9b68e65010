//! Text Acquisition Chain
//!
//! Layered extraction for PDF documents: direct structural text extraction
//! first, then exactly one OCR fallback strategy (offline tesseract, or
//! model-based vision transcription) chosen by the caller. Page-level OCR
//! failures are skipped; only a whole-strategy failure combined with the
//! failed direct pass makes the acquisition unsuccessful.

pub(crate) mod ocr;
pub(crate) mod raster;

use crate::ai::{prompts, LanguageModel};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// OCR fallback strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OcrMethod {
    /// Offline page-by-page rasterize-then-recognize via the tesseract CLI
    Tesseract,
    /// Model vision transcription of rasterized pages
    Vision,
}

impl OcrMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tesseract => "tesseract",
            Self::Vision => "vision",
        }
    }

    pub fn parse(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "tesseract" => Ok(Self::Tesseract),
            "vision" => Ok(Self::Vision),
            other => Err(format!(
                "unknown OCR method '{}', expected 'tesseract' or 'vision'",
                other
            )),
        }
    }
}

/// Outcome of one acquisition, with basic text statistics
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcquiredText {
    pub success: bool,
    pub text: String,
    /// "direct", "tesseract" or "vision"
    pub extraction_method: String,
    /// Known only when the document was rasterized
    pub page_count: Option<usize>,
    pub char_count: usize,
    pub word_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AcquiredText {
    fn ok(text: String, method: &str, page_count: Option<usize>) -> Self {
        let char_count = text.chars().count();
        let word_count = text.split_whitespace().count();
        Self {
            success: true,
            text,
            extraction_method: method.to_string(),
            page_count,
            char_count,
            word_count,
            error: None,
        }
    }

    fn failed(method: &str, error: String) -> Self {
        Self {
            success: false,
            text: String::new(),
            extraction_method: method.to_string(),
            page_count: None,
            char_count: 0,
            word_count: 0,
            error: Some(error),
        }
    }
}

/// The acquisition chain. Holds the model handle needed by the vision
/// strategy; the tesseract strategy never touches the network.
pub struct TextAcquisition {
    model: Arc<dyn LanguageModel>,
}

impl TextAcquisition {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// Acquire text from PDF bytes, falling back to the chosen OCR strategy
    /// when direct extraction yields nothing.
    pub async fn acquire(&self, pdf: &[u8], method: OcrMethod) -> AcquiredText {
        let direct_failure = match extract_direct(pdf) {
            Ok(text) if !text.trim().is_empty() => {
                return AcquiredText::ok(text, "direct", None);
            }
            Ok(_) => "direct extraction produced no text".to_string(),
            Err(e) => format!("direct extraction failed: {}", e),
        };

        tracing::info!(
            "[Extract] {}; falling back to {} OCR",
            direct_failure,
            method.as_str()
        );

        match self.run_ocr(pdf, method).await {
            Ok((text, page_count)) => AcquiredText::ok(text, method.as_str(), Some(page_count)),
            Err(ocr_failure) => {
                AcquiredText::failed(method.as_str(), format!("{}; {}", direct_failure, ocr_failure))
            }
        }
    }

    async fn run_ocr(&self, pdf: &[u8], method: OcrMethod) -> Result<(String, usize), String> {
        match method {
            OcrMethod::Tesseract => {
                let pdf = pdf.to_vec();
                tokio::task::spawn_blocking(move || {
                    let rasterized = raster::rasterize(&pdf)?;
                    ocr::recognize_pages(&rasterized.pages)
                })
                .await
                .map_err(|e| format!("OCR task failed: {}", e))?
            }
            OcrMethod::Vision => {
                let rasterized = {
                    let pdf = pdf.to_vec();
                    tokio::task::spawn_blocking(move || raster::rasterize(&pdf))
                        .await
                        .map_err(|e| format!("rasterization task failed: {}", e))??
                };
                // The workspace stays alive until transcription finishes.
                self.transcribe_pages(&rasterized.pages).await
            }
        }
    }

    async fn transcribe_pages(&self, pages: &[PathBuf]) -> Result<(String, usize), String> {
        let mut texts = Vec::new();
        let mut last_error: Option<String> = None;

        for page in pages {
            let png = match tokio::fs::read(page).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!("[Extract] Could not read page {}: {}", page.display(), e);
                    last_error = Some(e.to_string());
                    continue;
                }
            };

            match self
                .model
                .complete_with_image(prompts::PAGE_OCR_PROMPT, &png)
                .await
            {
                Ok(text) if !text.trim().is_empty() => texts.push(text.trim().to_string()),
                Ok(_) => {
                    tracing::warn!("[Extract] Vision found no text on {}", page.display());
                }
                Err(e) => {
                    tracing::warn!(
                        "[Extract] Vision transcription skipped page {}: {}",
                        page.display(),
                        e
                    );
                    last_error = Some(e);
                }
            }
        }

        if texts.is_empty() {
            let detail = last_error.unwrap_or_else(|| "no text recognized on any page".to_string());
            return Err(format!(
                "vision OCR produced no text across {} pages: {}",
                pages.len(),
                detail
            ));
        }

        Ok((texts.join("\n\n"), pages.len()))
    }
}

fn extract_direct(pdf: &[u8]) -> Result<String, String> {
    pdf_extract::extract_text_from_mem(pdf).map_err(|e| e.to_string())
}
