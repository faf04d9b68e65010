//! Offline OCR strategy
//!
//! Runs the `tesseract` CLI over rasterized page images. Pages that fail or
//! recognize nothing are skipped; the strategy as a whole fails only when no
//! page produced text (which includes tesseract not being installed).

use std::path::{Path, PathBuf};

/// Recognize all pages, joining surviving pages with a blank line.
/// Returns the concatenated text and the total page count.
pub fn recognize_pages(pages: &[PathBuf]) -> Result<(String, usize), String> {
    let mut texts = Vec::new();
    let mut last_error: Option<String> = None;

    for page in pages {
        match run_tesseract(page) {
            Ok(text) if !text.trim().is_empty() => texts.push(text.trim().to_string()),
            Ok(_) => {
                tracing::warn!("[Ocr] No text recognized on {}", page.display());
            }
            Err(e) => {
                tracing::warn!("[Ocr] Page skipped: {}", e);
                last_error = Some(e);
            }
        }
    }

    if texts.is_empty() {
        let detail = last_error.unwrap_or_else(|| "no text recognized on any page".to_string());
        return Err(format!(
            "tesseract produced no text across {} pages: {}",
            pages.len(),
            detail
        ));
    }

    Ok((texts.join("\n\n"), pages.len()))
}

fn run_tesseract(page: &Path) -> Result<String, String> {
    duct::cmd!("tesseract", page, "stdout", "--psm", "6")
        .stderr_null()
        .read()
        .map_err(|e| format!("tesseract unavailable or failed on {}: {}", page.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_pages_is_a_strategy_failure() {
        let result = recognize_pages(&[]);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_page_files_are_skipped_then_fail() {
        // Every page fails (file does not exist, or tesseract itself is
        // missing), so the strategy reports an overall failure.
        let pages = vec![PathBuf::from("/nonexistent/page-1.png")];
        let err = recognize_pages(&pages).unwrap_err();
        assert!(err.contains("tesseract"));
    }
}
