//! Prompt construction for classification and page transcription

use crate::taxonomy;

/// Extracted text sent to the model is cut to this many characters
pub const TEXT_PREVIEW_LIMIT: usize = 2000;

/// System prompt for document classification
pub const CLASSIFY_SYSTEM_PROMPT: &str = r#"You are a document triage assistant for an ICT office. You are given the content of a scanned business document (a request form, delivery order or other office paperwork) and must classify it into exactly one category from the provided list.

RULES:
1. Pick the single best-matching category code from the list. If nothing fits, use OOPR.
2. Extract the name of the person who requested or submitted the form. If no name is identifiable, use N/A.
3. Report your confidence as a decimal between 0.0 and 1.0.
4. Respond with exactly three lines and nothing else:

CATEGORY: <code>
REQUESTER: <full name or N/A>
CONFIDENCE: <0.0-1.0>"#;

/// Prompt used to transcribe a single rasterized page image
pub const PAGE_OCR_PROMPT: &str = "Transcribe every piece of text visible in this scanned document page. \
Preserve the reading order. Output only the transcribed text, with no commentary.";

/// One line per category: "- CODE: Label — Description"
pub fn taxonomy_listing() -> String {
    taxonomy::CATEGORIES
        .iter()
        .map(|c| format!("- {}: {} - {}", c.code, c.label, c.description))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the user prompt for classifying extracted text. Long text is
/// truncated to the first [`TEXT_PREVIEW_LIMIT`] characters with an explicit
/// continuation marker.
pub fn build_classification_prompt(filename: &str, text: Option<&str>) -> String {
    let mut prompt = format!(
        r#"Classify this document into one of the following categories:

{}

FILENAME: {}"#,
        taxonomy_listing(),
        filename
    );

    if let Some(text) = text {
        let truncated: String = text.chars().take(TEXT_PREVIEW_LIMIT).collect();
        let marker = if text.chars().count() > TEXT_PREVIEW_LIMIT {
            "\n... [content truncated]"
        } else {
            ""
        };

        prompt.push_str(&format!(
            r#"

DOCUMENT CONTENT:
---
{}{}
---"#,
            truncated, marker
        ));
    } else {
        prompt.push_str("\n\nThe document is attached in full.");
    }

    prompt.push_str("\n\nRespond with the three labeled lines only.");

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_covers_all_categories() {
        let listing = taxonomy_listing();
        for category in taxonomy::CATEGORIES.iter() {
            assert!(listing.contains(category.code));
            assert!(listing.contains(category.label));
        }
    }

    #[test]
    fn test_short_text_is_not_truncated() {
        let prompt = build_classification_prompt("form.pdf", Some("short content"));
        assert!(prompt.contains("short content"));
        assert!(!prompt.contains("[content truncated]"));
    }

    #[test]
    fn test_long_text_is_truncated_with_marker() {
        let long = "x".repeat(TEXT_PREVIEW_LIMIT + 50);
        let prompt = build_classification_prompt("form.pdf", Some(&long));
        assert!(prompt.contains("[content truncated]"));
        assert!(!prompt.contains(&long));
    }

    #[test]
    fn test_document_mode_has_no_content_section() {
        let prompt = build_classification_prompt("form.pdf", None);
        assert!(prompt.contains("attached in full"));
        assert!(!prompt.contains("DOCUMENT CONTENT"));
    }
}
