//! Classifier
//!
//! Builds the taxonomy prompt, invokes the model and turns its free-text
//! reply into a typed, validated [`ClassificationResult`]. Failures are never
//! propagated as errors: every path ends in a result object, with the
//! fallback category and floor confidence on the failure path.

pub mod batch;
pub mod parser;

use crate::ai::{prompts, LanguageModel};
use crate::taxonomy;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const CLASSIFY_MAX_TOKENS: u32 = 200;

/// Outcome of classifying one document. `category` is always a taxonomy
/// code and `confidence` always lies in [0.1, 1.0]; both are part of the
/// stable outward contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    /// Display name of the source document; not unique across a batch
    pub filename: String,
    pub success: bool,
    pub category: String,
    /// Extracted requester name, or the literal "N/A"
    pub requester: String,
    pub confidence: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ClassificationResult {
    /// Terminal failure shape for one document: fallback category, floor
    /// confidence, error attached.
    pub fn failure(filename: &str, error: impl Into<String>) -> Self {
        Self {
            filename: filename.to_string(),
            success: false,
            category: taxonomy::FALLBACK_CODE.to_string(),
            requester: "N/A".to_string(),
            confidence: parser::CONFIDENCE_FLOOR,
            error: Some(error.into()),
        }
    }
}

/// Document classifier backed by an injected model handle
pub struct Classifier {
    model: Arc<dyn LanguageModel>,
}

impl Classifier {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// Classify previously extracted text
    pub async fn classify_text(&self, text: &str, filename: &str) -> ClassificationResult {
        let prompt = prompts::build_classification_prompt(filename, Some(text));

        match self
            .model
            .complete(prompts::CLASSIFY_SYSTEM_PROMPT, &prompt, CLASSIFY_MAX_TOKENS)
            .await
        {
            Ok(reply) => parser::parse_reply(&reply, filename),
            Err(e) => {
                tracing::warn!("[Classifier] {}: {}", filename, e);
                ClassificationResult::failure(filename, e)
            }
        }
    }

    /// Direct-document mode: send the raw PDF to a document-capable model,
    /// bypassing the text acquisition chain entirely.
    pub async fn classify_document(&self, pdf: &[u8], filename: &str) -> ClassificationResult {
        let prompt = prompts::build_classification_prompt(filename, None);

        match self
            .model
            .complete_with_document(
                prompts::CLASSIFY_SYSTEM_PROMPT,
                &prompt,
                pdf,
                CLASSIFY_MAX_TOKENS,
            )
            .await
        {
            Ok(reply) => parser::parse_reply(&reply, filename),
            Err(e) => {
                tracing::warn!("[Classifier] {}: {}", filename, e);
                ClassificationResult::failure(filename, e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::testing::MockModel;

    fn classifier(model: MockModel) -> Classifier {
        Classifier::new(Arc::new(model))
    }

    #[tokio::test]
    async fn test_classify_text_success() {
        let classifier = classifier(MockModel::single(
            "CATEGORY: HRF\nREQUESTER: Dana Lim\nCONFIDENCE: 0.88",
        ));

        let result = classifier.classify_text("my monitor is broken", "scan.pdf").await;
        assert!(result.success);
        assert_eq!(result.category, "HRF");
        assert_eq!(result.requester, "Dana Lim");
        assert_eq!(result.filename, "scan.pdf");
    }

    #[tokio::test]
    async fn test_transport_error_becomes_failure_result() {
        let classifier = classifier(MockModel::failing("API error: overloaded"));

        let result = classifier.classify_text("anything", "scan.pdf").await;
        assert!(!result.success);
        assert_eq!(result.category, taxonomy::FALLBACK_CODE);
        assert!((result.confidence - 0.1).abs() < f32::EPSILON);
        assert!(result.error.unwrap().contains("overloaded"));
    }

    #[tokio::test]
    async fn test_classify_document_parses_reply() {
        let classifier = classifier(MockModel::single(
            "CATEGORY: DO\nREQUESTER: N/A\nCONFIDENCE: 0.75",
        ));

        let result = classifier.classify_document(b"%PDF-1.4 ...", "delivery.pdf").await;
        assert!(result.success);
        assert_eq!(result.category, "DO");
        assert_eq!(result.requester, "N/A");
    }

    #[tokio::test]
    async fn test_invalid_reply_still_returns_a_result() {
        let classifier = classifier(MockModel::single("I cannot classify this document."));

        let result = classifier.classify_text("???", "odd.pdf").await;
        assert!(result.success);
        assert_eq!(result.category, taxonomy::FALLBACK_CODE);
        assert!((result.confidence - 0.1).abs() < f32::EPSILON);
    }
}
