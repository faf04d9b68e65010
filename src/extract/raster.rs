//! Page rasterization
//!
//! Renders every page of a PDF to PNG with poppler's `pdftoppm` inside a
//! per-invocation temporary workspace. Dropping [`RasterizedPages`] removes
//! the workspace, so working files never outlive the acquisition call. The
//! workspace name carries a random token, which keeps concurrent
//! acquisitions from colliding.

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Raster output of one PDF, ordered by page number
pub struct RasterizedPages {
    pub pages: Vec<PathBuf>,
    // Keeps the backing directory alive while page paths are in use.
    _workspace: TempDir,
}

pub fn rasterize(pdf: &[u8]) -> Result<RasterizedPages, String> {
    let workspace = tempfile::Builder::new()
        .prefix("doctriage-raster-")
        .tempdir()
        .map_err(|e| format!("failed to create rasterization workspace: {}", e))?;

    let pdf_path = workspace.path().join("input.pdf");
    fs::write(&pdf_path, pdf).map_err(|e| format!("failed to stage PDF for rasterization: {}", e))?;

    let output_root = workspace.path().join("page");
    duct::cmd!("pdftoppm", "-png", "-r", "200", &pdf_path, &output_root)
        .stdout_capture()
        .stderr_capture()
        .run()
        .map_err(|e| format!("pdftoppm unavailable or failed: {}", e))?;

    // pdftoppm pads page numbers to a fixed width, so a name sort is a page
    // sort.
    let mut pages: Vec<PathBuf> = fs::read_dir(workspace.path())
        .map_err(|e| format!("failed to read rasterization workspace: {}", e))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("png"))
        .collect();
    pages.sort();

    if pages.is_empty() {
        return Err("rasterization produced no pages".to_string());
    }

    Ok(RasterizedPages {
        pages,
        _workspace: workspace,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rasterize_rejects_invalid_pdf() {
        // Either pdftoppm is missing or it exits non-zero on garbage input;
        // both surface as a strategy error.
        let result = rasterize(b"not a pdf");
        assert!(result.is_err());
    }
}
