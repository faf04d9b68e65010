//! Model reply parsing and validation
//!
//! The model's reply is untrusted free text: line order, label casing and
//! even the presence of each labeled line are not guaranteed. Every line is
//! scanned independently; the first match per field wins; anything missing
//! falls back to a safe default. A category code outside the taxonomy is
//! replaced with the fallback code and its confidence capped, then all
//! confidences are clamped to [0.1, 1.0].

use super::ClassificationResult;
use crate::taxonomy;
use once_cell::sync::Lazy;
use regex::Regex;

pub const CONFIDENCE_FLOOR: f32 = 0.1;
pub const CONFIDENCE_CEILING: f32 = 1.0;

/// Hard ceiling applied when the model reported a code we had to replace
const UNKNOWN_CODE_CONFIDENCE_CAP: f32 = 0.3;

static CATEGORY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)CATEGORY:\s*([A-Z_]+)").unwrap());
static REQUESTER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)REQUESTER:\s*(.+)").unwrap());
static CONFIDENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)CONFIDENCE:\s*([\d.]+)").unwrap());

/// Parse a free-text reply into a validated classification
pub fn parse_reply(reply: &str, filename: &str) -> ClassificationResult {
    let mut category: Option<String> = None;
    let mut requester: Option<String> = None;
    let mut confidence: Option<f32> = None;
    let mut confidence_seen = false;

    for line in reply.lines() {
        if category.is_none() {
            if let Some(caps) = CATEGORY_RE.captures(line) {
                category = Some(caps[1].to_uppercase());
            }
        }
        if requester.is_none() {
            if let Some(caps) = REQUESTER_RE.captures(line) {
                requester = Some(caps[1].trim().to_string());
            }
        }
        if !confidence_seen {
            if let Some(caps) = CONFIDENCE_RE.captures(line) {
                confidence_seen = true;
                confidence = caps[1].parse::<f32>().ok();
            }
        }
    }

    let mut category = category.unwrap_or_else(|| taxonomy::FALLBACK_CODE.to_string());
    let requester = normalize_requester(requester);
    let mut confidence = confidence.unwrap_or(CONFIDENCE_FLOOR);

    if !taxonomy::is_valid_code(&category) {
        tracing::warn!(
            "[Parser] {}: unknown category '{}', substituting {}",
            filename,
            category,
            taxonomy::FALLBACK_CODE
        );
        category = taxonomy::FALLBACK_CODE.to_string();
        confidence = confidence.min(UNKNOWN_CODE_CONFIDENCE_CAP);
    }

    confidence = confidence.clamp(CONFIDENCE_FLOOR, CONFIDENCE_CEILING);

    ClassificationResult {
        filename: filename.to_string(),
        success: true,
        category,
        requester,
        confidence,
        error: None,
    }
}

fn normalize_requester(raw: Option<String>) -> String {
    match raw {
        Some(name) if !name.is_empty() && !name.eq_ignore_ascii_case("n/a") => name,
        _ => "N/A".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_formed_reply() {
        let result = parse_reply(
            "CATEGORY: COF\nREQUESTER: Jane Doe\nCONFIDENCE: 0.92",
            "form.pdf",
        );
        assert!(result.success);
        assert_eq!(result.category, "COF");
        assert_eq!(result.requester, "Jane Doe");
        assert!((result.confidence - 0.92).abs() < f32::EPSILON);
    }

    #[test]
    fn test_line_order_does_not_matter() {
        let result = parse_reply(
            "CONFIDENCE: 0.7\nSome chatter from the model.\nREQUESTER: Ali\nCATEGORY: SAF",
            "form.pdf",
        );
        assert_eq!(result.category, "SAF");
        assert_eq!(result.requester, "Ali");
        assert!((result.confidence - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn test_labels_are_case_insensitive() {
        let result = parse_reply(
            "category: eaf\nrequester: Bob\nconfidence: 0.8",
            "form.pdf",
        );
        assert_eq!(result.category, "EAF");
        assert_eq!(result.requester, "Bob");
    }

    #[test]
    fn test_missing_lines_use_defaults() {
        let result = parse_reply("The model rambled and gave no labels.", "form.pdf");
        assert!(result.success);
        assert_eq!(result.category, taxonomy::FALLBACK_CODE);
        assert_eq!(result.requester, "N/A");
        assert!((result.confidence - CONFIDENCE_FLOOR).abs() < f32::EPSILON);
    }

    #[test]
    fn test_unknown_code_is_replaced_and_capped() {
        let result = parse_reply(
            "CATEGORY: XYZ\nREQUESTER: Carol\nCONFIDENCE: 0.95",
            "form.pdf",
        );
        assert_eq!(result.category, taxonomy::FALLBACK_CODE);
        assert!(result.confidence <= 0.3);
        // The requester survives the substitution.
        assert_eq!(result.requester, "Carol");
    }

    #[test]
    fn test_unknown_code_with_low_confidence_keeps_it() {
        let result = parse_reply("CATEGORY: NOPE\nCONFIDENCE: 0.2", "form.pdf");
        assert_eq!(result.category, taxonomy::FALLBACK_CODE);
        assert!((result.confidence - 0.2).abs() < f32::EPSILON);
    }

    #[test]
    fn test_na_requester_normalizes() {
        let result = parse_reply("CATEGORY: COF\nREQUESTER: n/a\nCONFIDENCE: 0.5", "f.pdf");
        assert_eq!(result.requester, "N/A");
    }

    #[test]
    fn test_confidence_is_clamped() {
        let high = parse_reply("CATEGORY: COF\nCONFIDENCE: 7.5", "f.pdf");
        assert!((high.confidence - CONFIDENCE_CEILING).abs() < f32::EPSILON);

        let low = parse_reply("CATEGORY: COF\nCONFIDENCE: 0.01", "f.pdf");
        assert!((low.confidence - CONFIDENCE_FLOOR).abs() < f32::EPSILON);
    }

    #[test]
    fn test_garbage_confidence_defaults() {
        // "..." matches the numeric pattern but parses to nothing.
        let result = parse_reply("CATEGORY: COF\nCONFIDENCE: ...", "f.pdf");
        assert!((result.confidence - CONFIDENCE_FLOOR).abs() < f32::EPSILON);
    }

    #[test]
    fn test_first_match_wins() {
        let result = parse_reply(
            "CATEGORY: COF\nCATEGORY: EAF\nCONFIDENCE: 0.6\nCONFIDENCE: 0.9",
            "f.pdf",
        );
        assert_eq!(result.category, "COF");
        assert!((result.confidence - 0.6).abs() < f32::EPSILON);
    }
}
