//! Batch Orchestrator
//!
//! Drives the classifier (and, for raw PDFs, the text acquisition chain)
//! over many documents. Strictly sequential: each document is classified to
//! completion before the next begins, with an injected rate limiter pacing
//! the model calls. A failure on one item is isolated into that item's
//! result; the batch always yields exactly one result per input, in order.

use super::{ClassificationResult, Classifier};
use crate::ai::RateLimiter;
use crate::extract::{OcrMethod, TextAcquisition};
use std::sync::Arc;

/// What the orchestrator is given for one document
pub enum DocumentInput {
    /// Text already acquired by the caller
    Text(String),
    /// Raw PDF bytes; the acquisition chain runs before classification
    Pdf { bytes: Vec<u8>, ocr: OcrMethod },
    /// Raw PDF bytes sent straight to a document-capable model
    DirectDocument(Vec<u8>),
}

pub struct BatchDocument {
    pub filename: String,
    pub input: DocumentInput,
}

pub struct BatchClassifier {
    classifier: Classifier,
    acquisition: TextAcquisition,
    rate_limiter: Arc<RateLimiter>,
}

impl BatchClassifier {
    pub fn new(
        classifier: Classifier,
        acquisition: TextAcquisition,
        rate_limiter: Arc<RateLimiter>,
    ) -> Self {
        Self {
            classifier,
            acquisition,
            rate_limiter,
        }
    }

    /// Classify a batch. Order-preserving and one-to-one with the input,
    /// regardless of individual failures.
    pub async fn classify_batch(&self, documents: Vec<BatchDocument>) -> Vec<ClassificationResult> {
        let total = documents.len();
        let mut results = Vec::with_capacity(total);

        for (index, document) in documents.into_iter().enumerate() {
            tracing::info!(
                "[Batch] Classifying {}/{}: {}",
                index + 1,
                total,
                document.filename
            );

            self.rate_limiter.acquire().await;

            let result = self.classify_one(document).await;
            if !result.success {
                tracing::warn!(
                    "[Batch] {} failed: {}",
                    result.filename,
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }
            results.push(result);
        }

        results
    }

    async fn classify_one(&self, document: BatchDocument) -> ClassificationResult {
        match document.input {
            DocumentInput::Text(text) => {
                self.classifier.classify_text(&text, &document.filename).await
            }
            DocumentInput::DirectDocument(bytes) => {
                self.classifier
                    .classify_document(&bytes, &document.filename)
                    .await
            }
            DocumentInput::Pdf { bytes, ocr } => {
                let acquired = self.acquisition.acquire(&bytes, ocr).await;
                if !acquired.success {
                    return ClassificationResult::failure(
                        &document.filename,
                        acquired
                            .error
                            .unwrap_or_else(|| "text acquisition failed".to_string()),
                    );
                }
                self.classifier
                    .classify_text(&acquired.text, &document.filename)
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::testing::MockModel;
    use crate::taxonomy;
    use std::time::Duration;

    fn batch_with(replies: Vec<Result<String, String>>) -> BatchClassifier {
        let model: Arc<MockModel> = Arc::new(MockModel::new(replies));
        BatchClassifier::new(
            Classifier::new(model.clone()),
            TextAcquisition::new(model),
            Arc::new(RateLimiter::new(1, Duration::from_millis(0))),
        )
    }

    fn text_doc(filename: &str) -> BatchDocument {
        BatchDocument {
            filename: filename.to_string(),
            input: DocumentInput::Text("some form content".to_string()),
        }
    }

    #[tokio::test]
    async fn test_batch_is_order_preserving_and_one_to_one() {
        let batch = batch_with(vec![
            Ok("CATEGORY: COF\nREQUESTER: A\nCONFIDENCE: 0.9".to_string()),
            Ok("CATEGORY: EAF\nREQUESTER: B\nCONFIDENCE: 0.8".to_string()),
            Ok("CATEGORY: SAF\nREQUESTER: C\nCONFIDENCE: 0.7".to_string()),
        ]);

        let results = batch
            .classify_batch(vec![text_doc("a.pdf"), text_doc("b.pdf"), text_doc("c.pdf")])
            .await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].filename, "a.pdf");
        assert_eq!(results[0].category, "COF");
        assert_eq!(results[1].filename, "b.pdf");
        assert_eq!(results[1].category, "EAF");
        assert_eq!(results[2].filename, "c.pdf");
        assert_eq!(results[2].category, "SAF");
    }

    #[tokio::test]
    async fn test_one_failure_does_not_abort_the_batch() {
        let batch = batch_with(vec![
            Ok("CATEGORY: COF\nREQUESTER: A\nCONFIDENCE: 0.9".to_string()),
            Err("connection reset".to_string()),
            Ok("CATEGORY: XYZ\nREQUESTER: C\nCONFIDENCE: 0.95".to_string()),
        ]);

        let results = batch
            .classify_batch(vec![text_doc("a.pdf"), text_doc("b.pdf"), text_doc("c.pdf")])
            .await;

        assert_eq!(results.len(), 3);
        assert!(results[0].success);

        assert!(!results[1].success);
        assert_eq!(results[1].category, taxonomy::FALLBACK_CODE);
        assert!(results[1].error.as_deref().unwrap().contains("connection reset"));

        // Unknown code from the model: substituted and capped, but successful.
        assert!(results[2].success);
        assert_eq!(results[2].category, taxonomy::FALLBACK_CODE);
        assert!(results[2].confidence <= 0.3);
    }

    #[tokio::test]
    async fn test_unextractable_pdf_becomes_failure_result() {
        let batch = batch_with(vec![Ok(
            "CATEGORY: COF\nREQUESTER: A\nCONFIDENCE: 0.9".to_string()
        )]);

        let results = batch
            .classify_batch(vec![BatchDocument {
                filename: "broken.pdf".to_string(),
                input: DocumentInput::Pdf {
                    bytes: b"not a pdf".to_vec(),
                    ocr: OcrMethod::Tesseract,
                },
            }])
            .await;

        assert_eq!(results.len(), 1);
        assert!(!results[0].success);
        assert!(results[0]
            .error
            .as_deref()
            .unwrap()
            .contains("direct extraction"));
    }

    #[tokio::test]
    async fn test_empty_batch_yields_empty_results() {
        let batch = batch_with(vec![Ok("unused".to_string())]);
        let results = batch.classify_batch(Vec::new()).await;
        assert!(results.is_empty());
    }
}
